use crate::{Relay, RELAY_QUEUE_DEPTH, RoomRegistry, ServerConfig, SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Start the relay task and return the connection table wired to it.
pub fn spawn_relay(config: &ServerConfig) -> SignalingService {
    let (relay_tx, relay_rx) = mpsc::channel(RELAY_QUEUE_DEPTH);
    let signaling = SignalingService::new(relay_tx, config.ice_servers.clone());

    let relay = Relay::new(
        RoomRegistry::new(config.room_capacity),
        relay_rx,
        Arc::new(signaling.clone()),
    );
    tokio::spawn(relay.run());

    signaling
}

pub fn router(signaling: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(signaling)
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    serve_on(listener, config).await
}

/// Serve on an already bound listener (tests bind port 0).
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let signaling = spawn_relay(&config);
    let app = router(signaling);

    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Signaling relay listening on ws://{}/ws", addr);

    axum::serve(listener, app)
        .await
        .context("Signaling relay stopped")?;
    Ok(())
}
