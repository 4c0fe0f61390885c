pub mod request_id;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{
    health::{self, ReadyState},
    TtsController,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use request_id::request_id_middleware;

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    tts_controller: Arc<TtsController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ready_state = Arc::new(ReadyState {
        pool,
        provider: config.tts_provider.as_str(),
    });

    // Article TTS routes; CORS is open so the briefing frontend can poll
    // document status directly.
    let api_routes = Router::new()
        .route(
            "/api/articles/:category/:doc_id/tts",
            get(TtsController::get_status),
        )
        .route(
            "/api/articles/:category/:doc_id/tts/retry",
            post(TtsController::retry),
        )
        .with_state(tts_controller)
        .layer(CorsLayer::permissive());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(ready_state);

    let app = Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
