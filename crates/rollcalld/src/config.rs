use std::path::PathBuf;

use rollcall_core::GeometryConfig;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Directory of frame blobs replayed as the capture source.
    pub frames_dir: PathBuf,
    /// External detector command (frame on stdin, JSON detections on stdout).
    pub detector_cmd: String,
    /// Maximum Euclidean distance for a positive match.
    pub match_threshold: f32,
    /// Geometry thresholds for enrollment captures.
    pub geometry: GeometryConfig,
    /// Frame cap per attendance run; 0 means run until the source is
    /// exhausted or a stop is signalled.
    pub max_frames_per_attend: usize,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("rollcall");

        let db_path = std::env::var("ROLLCALL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("students.db"));

        let frames_dir = std::env::var("ROLLCALL_FRAMES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("frames"));

        Self {
            db_path,
            frames_dir,
            detector_cmd: std::env::var("ROLLCALL_DETECTOR_CMD").unwrap_or_default(),
            match_threshold: env_f32(
                "ROLLCALL_MATCH_THRESHOLD",
                rollcall_core::DEFAULT_MATCH_THRESHOLD,
            ),
            geometry: GeometryConfig {
                max_center_offset: env_f32("ROLLCALL_MAX_CENTER_OFFSET", 100.0),
                max_eye_tilt: env_f32("ROLLCALL_MAX_EYE_TILT", 15.0),
            },
            max_frames_per_attend: env_usize("ROLLCALL_MAX_FRAMES_PER_ATTEND", 0),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
