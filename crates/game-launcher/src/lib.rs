//! Game hand-off
//!
//! Maps a drowsiness level to its refresh game and brings the game
//! surface up as an async task that resolves to a URL, bounded by an
//! explicit timeout.

pub mod games;
pub mod host;

pub use games::GameKind;
pub use host::{game_router, GameDescriptor, LocalGameHost};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Launch errors
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to bind game server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Game server error: {0}")]
    Serve(String),

    #[error("Game did not become ready within {0:?}")]
    Timeout(Duration),
}

/// Launcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Socket address for the game server (port 0 picks a free port)
    pub bind_address: String,
    /// How long to wait for the game to come up (seconds)
    pub timeout_seconds: f64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:0".to_string(),
            timeout_seconds: 5.0,
        }
    }
}

impl LauncherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

/// A running game surface
pub struct GameHandle {
    url: String,
    kind: GameKind,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl GameHandle {
    /// Wrap a running server task; dropping the sender stops the server
    pub fn new(
        url: String,
        kind: GameKind,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            url,
            kind,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    /// Handle for a surface managed elsewhere (nothing to stop)
    pub fn detached(url: String, kind: GameKind) -> Self {
        Self {
            url,
            kind,
            shutdown: None,
            task: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    /// Stop the game server and wait for it to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("{} stopped", self.kind);
    }
}

/// Brings up a game surface and reports where it can be reached
#[async_trait]
pub trait GameLauncher: Send + Sync {
    async fn launch(&self, kind: GameKind) -> Result<GameHandle, LaunchError>;
}

/// Launch once, giving up after `timeout`. No retry is attempted.
pub async fn launch_with_timeout<L>(
    launcher: &L,
    kind: GameKind,
    timeout: Duration,
) -> Result<GameHandle, LaunchError>
where
    L: GameLauncher + ?Sized,
{
    match tokio::time::timeout(timeout, launcher.launch(kind)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} did not start within {:?}", kind, timeout);
            Err(LaunchError::Timeout(timeout))
        }
    }
}
