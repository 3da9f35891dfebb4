//! Router construction and serving

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use mirror_core::{SyncStatus, Syncer};

use crate::error::{Result, ServerError};
use crate::middleware::{BasicAuthCredentials, basic_auth};

/// Listener address plus webhook gating.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
struct AppState {
    syncer: Arc<Syncer>,
}

/// Build the application router. The webhook route only exists when it is
/// enabled in the configuration.
pub fn build_router(syncer: Arc<Syncer>, webhook: &WebhookConfig) -> Router {
    let state = AppState { syncer };

    let mut router = Router::new()
        .route("/status", get(status))
        .route("/liveness", get(liveness));

    if webhook.enabled {
        let credentials = Arc::new(BasicAuthCredentials {
            username: webhook.username.clone(),
            password: webhook.password.clone(),
        });
        router = router.route(
            "/webhook",
            post(trigger_sync).route_layer(from_fn(move |request, next| {
                let credentials = Arc::clone(&credentials);
                basic_auth(credentials, request, next)
            })),
        );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve until the shutdown future completes. In-flight requests are
/// drained before returning.
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server started");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn status(State(state): State<AppState>) -> Result<Json<SyncStatus>> {
    // status() takes the reconciliation lock and blocks while a sync is
    // in flight, so it runs off the async workers
    let syncer = state.syncer;
    let status = tokio::task::spawn_blocking(move || syncer.status())
        .await
        .map_err(|err| ServerError::Internal(err.to_string()))?;
    Ok(Json(status))
}

async fn liveness() -> &'static str {
    "OK"
}

async fn trigger_sync(State(state): State<AppState>) -> Response {
    tracing::info!("webhook triggered, forcing sync");
    let syncer = Arc::clone(&state.syncer);
    let result = tokio::task::spawn_blocking(move || {
        let outcome = syncer.reconcile(true);
        (outcome, syncer.status())
    })
    .await;

    match result {
        Ok((Ok(()), status)) => (StatusCode::OK, Json(status)).into_response(),
        Ok((Err(err), status)) => {
            tracing::error!(error = %err, "forced sync failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string(), "status": status })),
            )
                .into_response()
        }
        Err(err) => ServerError::Internal(err.to_string()).into_response(),
    }
}
