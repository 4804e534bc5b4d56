//! HTTP and WebSocket gateway for TravelGuide.
//!
//! Endpoints:
//!
//! - `POST /generate-travel-guide`: structured guide as JSON
//! - `GET /ws/travel-chat`: streamed Markdown answers over WebSocket
//! - `GET /health`: liveness probe
//!
//! Built on Axum; one [`TravelGuideService`] is shared by every request.

pub mod chat;
pub mod guide;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::{Method, header},
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use travelguide_config::AppConfig;
use travelguide_planner::TravelGuideService;

/// Shared application state.
pub struct ApiState {
    pub service: Arc<TravelGuideService>,
}

pub type SharedState = Arc<ApiState>;

impl ApiState {
    pub fn new(service: TravelGuideService) -> SharedState {
        Arc::new(Self {
            service: Arc::new(service),
        })
    }
}

/// Build the router with all routes and layers.
///
/// Layers applied:
/// - Request body size limit (`gateway.max_body_bytes`)
/// - CORS allowing GET/POST with JSON bodies
/// - HTTP trace logging
pub fn build_router(state: SharedState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/generate-travel-guide", post(guide::generate_handler))
        .route("/ws/travel-chat", get(chat::ws_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway server and run until Ctrl-C.
///
/// Both LLM gateways are built here, once; missing backend settings fail
/// before the listener is bound.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let service = TravelGuideService::from_config(&config)?;
    let state = ApiState::new(service);
    let app = build_router(state, config.gateway.max_body_bytes);

    info!(
        addr = %addr,
        guide_model = %config.guide.model,
        chat_model = %config.chat.model,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
