use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

mod backend;
mod config;
mod dbus_interface;
mod engine;

use backend::{CommandDetector, ReplaySource};
use config::Config;
use dbus_interface::RollcallService;
use rollcall_store::SqliteStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("rollcalld starting");

    let config = Config::from_env();
    anyhow::ensure!(
        !config.detector_cmd.is_empty(),
        "ROLLCALL_DETECTOR_CMD is not set; the daemon needs an external detector command"
    );

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening store at {}", config.db_path.display()))?;
    tracing::info!(
        db = %config.db_path.display(),
        records = store.record_count()?,
        "store opened"
    );

    let frames_dir = config.frames_dir.clone();
    let source_factory: engine::SourceFactory = Box::new(move || {
        ReplaySource::open(&frames_dir)
            .map(|s| Box::new(s) as Box<dyn backend::FrameSource + Send>)
    });

    let handle = engine::spawn_engine(
        Box::new(CommandDetector::new(config.detector_cmd.clone())),
        source_factory,
        Box::new(store),
        config.geometry.clone(),
        config.match_threshold,
    )?;

    let _connection = zbus::connection::Builder::session()?
        .name("org.rollcall.Attendance1")?
        .serve_at("/org/rollcall/Attendance1", RollcallService::new(handle.clone()))?
        .build()
        .await
        .context("registering D-Bus service")?;

    tracing::info!("rollcalld ready");

    tokio::signal::ctrl_c().await?;
    handle.stop();
    tracing::info!("rollcalld shutting down");

    Ok(())
}
