// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::application::data_repository::DataRepository;
use crate::application::frame_service::FrameService;
use crate::application::playback_service::PlaybackService;
use crate::application::session::DashboardSession;
use crate::application::view_service::ViewService;
use crate::infrastructure::config::{load_dashboard_config, resolve_endpoints};
use crate::infrastructure::girder_repository::GirderRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let endpoints = resolve_endpoints(&config.girder);
    tracing::info!(
        "Girder API at {}, time-step data at {}",
        endpoints.api_root,
        endpoints.data_url
    );
    if endpoints.with_credentials && config.girder.token.is_none() {
        tracing::warn!("Hosted deployment without a Girder token; private views are hidden");
    }

    // Create repository (infrastructure layer)
    let repository = Arc::new(GirderRepository::new(
        endpoints.api_root,
        endpoints.data_url,
        config.girder.token.clone(),
    ));

    // Bootstrap: who is logged in and where the simulation data lives
    let user = match repository.current_user().await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Could not fetch the current user: {}", e);
            None
        }
    };
    let root_folder = match repository.find_root_folder(&config.girder.collection).await {
        Ok(folder) => Some(folder),
        Err(e) => {
            tracing::warn!("Could not resolve the {} root folder: {}", config.girder.collection, e);
            None
        }
    };

    // Create services (application layer)
    let frame_service = FrameService::new(repository.clone());
    let view_service = ViewService::new(repository);
    let playback_service = PlaybackService::new(config.playback.max_steps);

    // Create application state
    let state = Arc::new(AppState {
        session: Arc::new(Mutex::new(DashboardSession::new(user, root_folder))),
        frame_service,
        view_service,
        playback_service,
    });

    // Build router (presentation layer)
    // Responses are Brotli-encoded by hand, so no CompressionLayer
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting esimmon-dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
