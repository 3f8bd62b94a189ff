//! Concrete stand-ins for the external collaborators: a frame source that
//! replays image blobs from a directory, and a detector that shells out to
//! an opaque external command. Neither knows anything about faces; all
//! decision logic stays in rollcall-core.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use rollcall_core::{Detection, Detector, DetectorError, Frame};

#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("frame source i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivers frames in order. `None` means the source is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError>;
}

/// Replays every regular file in a directory as a frame, in lexicographic
/// filename order, so attendance runs are reproducible.
pub struct ReplaySource {
    files: std::vec::IntoIter<PathBuf>,
}

impl ReplaySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, FrameSourceError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        tracing::info!(dir = %dir.as_ref().display(), frames = files.len(), "replay source opened");
        Ok(Self {
            files: files.into_iter(),
        })
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        match self.files.next() {
            Some(path) => {
                let data = std::fs::read(&path)?;
                Ok(Some(Frame::new(data)))
            }
            None => Ok(None),
        }
    }
}

/// Runs an external command per frame: the frame blob goes to its stdin and
/// a JSON array of detections is read from its stdout. The command wraps
/// whatever model the deployment uses; to the daemon it is a black box.
pub struct CommandDetector {
    command: String,
}

impl CommandDetector {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Detector for CommandDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DetectorError::Unavailable(format!("spawn failed: {e}")))?;

        // Close stdin after writing so the child sees EOF.
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| DetectorError::Unavailable("child stdin missing".into()))?;
            stdin
                .write_all(&frame.data)
                .map_err(|e| DetectorError::Unavailable(format!("write to detector failed: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| DetectorError::Unavailable(format!("detector wait failed: {e}")))?;
        if !output.status.success() {
            return Err(DetectorError::Unavailable(format!(
                "detector exited with {}",
                output.status
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| DetectorError::Unavailable(format!("malformed detector output: {e}")))
    }
}
