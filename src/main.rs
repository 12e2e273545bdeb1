//! Helpdesk Flow - scripted support chat backend
//!
//! A Rust backend running scripted dialogue state machines for a chat UI,
//! handing free-form questions to a chat-completion service.

mod agent;
mod api;
mod config;
mod llm;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use runtime::SessionManager;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_file = config::load_dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk_flow=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    match &env_file {
        Some(path) => tracing::info!(file = %path.display(), "Loaded environment file"),
        None => tracing::warn!("No .env file found in the current or parent directory"),
    }

    // Configuration
    let config = AppConfig::from_env()?;

    // Initialize the chat-completion service. A failure is reported to each
    // chat that tries to start rather than stopping the server.
    let service = match llm::connect(&config.llm) {
        Ok(service) => {
            tracing::info!(model = %service.model_id(), "Chat-completion service initialized");
            Ok(service)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Chat-completion service unavailable");
            Err(e.to_string())
        }
    };

    // Create application state
    let sessions = SessionManager::new(service, config.default_flow)
        .with_idle_timeout(config.session_idle_timeout);
    let state = AppState::new(sessions);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(flow = %config.default_flow, "Helpdesk server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
