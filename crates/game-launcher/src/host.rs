//! Local HTTP host for the selected game

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::games::GameKind;
use crate::{GameHandle, GameLauncher, LaunchError, LauncherConfig};

/// Game descriptor served at `/api/game`
#[derive(Debug, Serialize)]
pub struct GameDescriptor {
    pub kind: GameKind,
    pub level: u8,
    pub title: &'static str,
    pub instructions: String,
}

impl From<GameKind> for GameDescriptor {
    fn from(kind: GameKind) -> Self {
        Self {
            kind,
            level: kind.level().as_u8(),
            title: kind.title(),
            instructions: kind.instructions(),
        }
    }
}

/// Create the router for one game
pub fn game_router(kind: GameKind) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/game", get(descriptor_handler))
        .with_state(kind)
}

async fn page_handler(State(kind): State<GameKind>) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body style=\"text-align:center;font-family:sans-serif\">\
         <h2>{title}</h2><p>{level}</p><p>{instructions}</p></body></html>",
        title = kind.title(),
        level = kind.level(),
        instructions = kind.instructions(),
    ))
}

async fn descriptor_handler(State(kind): State<GameKind>) -> Json<GameDescriptor> {
    Json(GameDescriptor::from(kind))
}

/// Serves the game on a local socket, one server per launch
pub struct LocalGameHost {
    bind_address: String,
}

impl LocalGameHost {
    pub fn new(config: &LauncherConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
        }
    }
}

#[async_trait]
impl GameLauncher for LocalGameHost {
    async fn launch(&self, kind: GameKind) -> Result<GameHandle, LaunchError> {
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .map_err(|source| LaunchError::Bind {
                addr: self.bind_address.clone(),
                source,
            })?;
        let addr = listener
            .local_addr()
            .map_err(|e| LaunchError::Serve(e.to_string()))?;
        let url = url_for(addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = game_router(kind).layer(TraceLayer::new_for_http());

        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
                error!("Game server stopped with error: {}", e);
            }
        });

        info!("{} ready at {}", kind, url);
        Ok(GameHandle::new(url, kind, shutdown_tx, task))
    }
}

/// Browser URL for a bound address; wildcard binds are reached via localhost
fn url_for(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}/", addr.port())
    } else {
        format!("http://{}/", addr)
    }
}
