use axum::{Json, Router, routing::get};
use huddle_core::IceServerConfig;
use huddle_relay::{AppState, RoomManager, SignalingService, ws_handler};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let addr: SocketAddr = env::var("HUDDLE_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_owned())
        .parse()?;
    let ice_servers = ice_servers_from_env();

    let signaling = SignalingService::new();
    let room_manager = RoomManager::new(Arc::new(signaling.clone()));

    let state = Arc::new(AppState {
        signaling,
        room_manager,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route(
            "/config",
            get(move || {
                let ice_servers = ice_servers.clone();
                async move { Json(ice_servers) }
            }),
        )
        .layer(cors)
        .with_state(state);

    info!("Signaling relay listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// STUN/TURN entries handed to clients via `/config`. The relay itself
/// never dials these; they only parameterize the clients' transports.
fn ice_servers_from_env() -> Vec<IceServerConfig> {
    let stun_urls = env::var("HUDDLE_STUN_URLS")
        .unwrap_or_else(|_| "stun:stun.l.google.com:19302".to_owned());

    let mut servers = vec![IceServerConfig {
        urls: stun_urls.split(',').map(|s| s.trim().to_owned()).collect(),
        username: None,
        credential: None,
    }];

    if let Ok(turn_url) = env::var("HUDDLE_TURN_URL") {
        servers.push(IceServerConfig {
            urls: vec![turn_url],
            username: env::var("HUDDLE_TURN_USERNAME").ok(),
            credential: env::var("HUDDLE_TURN_CREDENTIAL").ok(),
        });
    }

    servers
}
