//! Sleepy Check application
//!
//! Measures blinks over a fixed window, shows the drowsiness level and
//! hands the user off to the matching refresh game.

pub mod settings;
pub mod stage;

pub use settings::{AppConfig, SettingsError};
pub use stage::{Stage, StageError};

use std::sync::Arc;

use anyhow::{anyhow, Context};
use camera_capture::{FrameSource, ImageSequenceSource};
use chrono::Utc;
use drowsiness::{
    DrowsinessConfig, DrowsinessReport, FaceMeshLandmarker, LandmarkInference, ObservationWindow,
};
use game_launcher::{launch_with_timeout, GameKind, GameLauncher, LocalGameHost};
use tracing::{error, info, info_span, warn};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use crate::settings::LoggingConfig;

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = config.max_level()?;

    let installed = if config.json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    installed.context("Failed to set tracing subscriber")
}

/// Run one observation window on a blocking thread and build its report
pub async fn observe<S, I>(
    config: &DrowsinessConfig,
    source: S,
    inference: Arc<I>,
) -> anyhow::Result<DrowsinessReport>
where
    S: FrameSource + Send + 'static,
    I: LandmarkInference + Send + Sync + ?Sized + 'static,
{
    let session_id = Uuid::new_v4();
    let started_at = Utc::now();
    let config = config.clone();

    let result = tokio::task::spawn_blocking(move || {
        let _span = info_span!("session", %session_id).entered();
        let mut window = ObservationWindow::new(&config);
        window.run_with_progress(
            source,
            inference.as_ref(),
            config.window(),
            config.poll_interval(),
            |blinks| info!(blinks, "Measuring..."),
        )
    })
    .await
    .context("Observation task panicked")??;

    let report = DrowsinessReport::new(session_id, started_at, &result);
    info!(
        "Face visible in {:.0}% of {} frames",
        report.face_ratio() * 100.0,
        report.frames_processed
    );
    if let Some(warning) = reliability_warning(&report) {
        warn!("Session {}: {}", session_id, warning);
    }
    Ok(report)
}

/// Why a report's level should not be taken at face value, if it shouldn't
pub fn reliability_warning(report: &DrowsinessReport) -> Option<String> {
    if report.is_reliable() {
        return None;
    }
    if !report.completed {
        return Some(format!(
            "ended early ({:?}); level is based on a partial count of {}",
            report.abort_reason, report.blink_count
        ));
    }
    Some(format!(
        "no face was detected in {} frames; {} only means no blinks were seen",
        report.frames_processed, report.level
    ))
}

/// Bring up the game for a report's level, bounded by the launcher timeout
pub async fn hand_off<L>(
    launcher: &L,
    stage: &mut Stage,
    timeout: std::time::Duration,
) -> anyhow::Result<game_launcher::GameHandle>
where
    L: GameLauncher + ?Sized,
{
    let report = stage
        .report()
        .ok_or_else(|| anyhow!("No measurement to hand off from the {} stage", stage.name()))?;
    let kind = GameKind::for_level(report.level);

    let handle = launch_with_timeout(launcher, kind, timeout)
        .await
        .with_context(|| format!("Could not start {}; try again", kind))?;
    stage.start_game(handle.url().to_string())?;
    Ok(handle)
}

/// Full flow: measure, show the result, launch the game, wait for Ctrl-C
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let mut stage = Stage::default();

    let landmarker = Arc::new(FaceMeshLandmarker::new(&config.model)?);
    let frames_dir = config
        .camera
        .frames_dir
        .as_ref()
        .ok_or_else(|| anyhow!("camera.frames_dir is not configured"))?;
    let source = ImageSequenceSource::open(frames_dir, config.camera.looping)?;

    info!(
        "Measuring blinks for {:.0} seconds...",
        config.detection.window_seconds
    );
    let report = observe(&config.detection, source, landmarker).await?;
    stage.finish_observation(report.clone())?;

    let result = report.classification();
    info!(
        "Result: {} blinks -> {} ({})",
        result.blink_count,
        result.level,
        result.level.verdict()
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    let launcher = LocalGameHost::new(&config.launcher);
    let handle = match hand_off(&launcher, &mut stage, config.launcher.timeout()).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("{:#}", e);
            return Err(e);
        }
    };

    println!("{} is ready: {}", handle.kind(), handle.url());
    info!("Press Ctrl-C to stop the game");
    tokio::signal::ctrl_c().await?;

    handle.shutdown().await;
    stage.restart();
    Ok(())
}
