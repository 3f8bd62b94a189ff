use zbus::interface;

use crate::engine::{EngineError, EngineHandle};

/// D-Bus interface for the Rollcall attendance daemon.
///
/// Bus name: org.rollcall.Attendance1
/// Object path: /org/rollcall/Attendance1
pub struct RollcallService {
    engine: EngineHandle,
}

impl RollcallService {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }
}

fn to_fdo(err: EngineError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(err.to_string())
}

#[interface(name = "org.rollcall.Attendance1")]
impl RollcallService {
    /// Register a new student from the next captured frame.
    async fn register(&self, name: &str) -> zbus::fdo::Result<String> {
        tracing::info!(name, "register requested");
        let enrollment = self.engine.enroll(name.to_owned()).await.map_err(to_fdo)?;
        Ok(serde_json::json!({ "identity": enrollment.identity }).to_string())
    }

    /// Run attendance over up to `max_frames` frames (0 = whole source).
    /// Returns the roll as JSON.
    async fn attend(&self, max_frames: u32) -> zbus::fdo::Result<String> {
        tracing::info!(max_frames, "attendance run requested");
        let report = self.engine.attend(max_frames as usize).await.map_err(to_fdo)?;
        serde_json::to_string(&report).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Roll of the most recently completed attendance run, as JSON.
    async fn snapshot(&self) -> zbus::fdo::Result<String> {
        let roll = self.engine.snapshot().await.map_err(to_fdo)?;
        serde_json::to_string(&roll).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// List enrolled students, as a JSON array of identities.
    async fn students(&self) -> zbus::fdo::Result<String> {
        let roster = self.engine.roster().await.map_err(to_fdo)?;
        serde_json::to_string(&roster).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.status().await.map_err(to_fdo)?;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "enrolled_identities": status.enrolled_identities,
            "last_roll_size": status.last_roll_size,
        })
        .to_string())
    }

    /// Ask a running attendance loop to stop before its next frame.
    async fn stop(&self) -> zbus::fdo::Result<bool> {
        tracing::info!("stop requested");
        self.engine.stop();
        Ok(true)
    }
}
