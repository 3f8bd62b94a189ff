//! Enrollment pipeline: one detector pass → geometry checks → persist →
//! gallery insert.

use thiserror::Error;

use crate::boundary::{DetectorError, RecordStore, StoreError};
use crate::gallery::Gallery;
use crate::types::{Detection, Frame};
use crate::validator::{self, GeometryConfig, GeometryOutcome, RejectReason};

#[derive(Debug, Error)]
pub enum EnrollError {
    #[error("identity name is empty")]
    InvalidName,
    #[error("no face detected")]
    NoFaceDetected,
    #[error("multiple faces detected ({0})")]
    MultipleFacesDetected(usize),
    #[error("face not centered (offset {offset:.1} px)")]
    NotCentered { offset: f32 },
    #[error("face tilted (eye tilt {tilt:.1} px)")]
    Tilted { tilt: f32 },
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<RejectReason> for EnrollError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::NotCentered { offset } => EnrollError::NotCentered { offset },
            RejectReason::Tilted { tilt } => EnrollError::Tilted { tilt },
        }
    }
}

/// Where the pipeline stands. Failed attempts always land back in
/// `AwaitingSingleFace`; the pipeline is retryable forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollState {
    Idle,
    AwaitingSingleFace,
    Validating,
    Captured,
    Persisted,
}

/// A successful capture.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub identity: String,
}

/// Drives one enrollment attempt per call. The caller owns the retry loop;
/// the pipeline only reports how each attempt ended.
pub struct EnrollmentPipeline {
    geometry: GeometryConfig,
    state: EnrollState,
}

impl EnrollmentPipeline {
    pub fn new(geometry: GeometryConfig) -> Self {
        Self {
            geometry,
            state: EnrollState::Idle,
        }
    }

    pub fn state(&self) -> EnrollState {
        self.state
    }

    /// Run one capture attempt over an already-detected frame.
    ///
    /// Persistence happens strictly before the gallery insert: if the store
    /// rejects the record, the gallery is left untouched so in-memory and
    /// persisted state never diverge.
    pub fn attempt_capture<S: RecordStore + ?Sized>(
        &mut self,
        detections: &[Detection],
        frame: &Frame,
        identity_name: &str,
        store: &mut S,
        gallery: &mut Gallery,
    ) -> Result<Enrollment, EnrollError> {
        self.state = EnrollState::AwaitingSingleFace;

        let name = identity_name.trim();
        if name.is_empty() {
            return Err(EnrollError::InvalidName);
        }

        let detection = match detections {
            [] => return Err(EnrollError::NoFaceDetected),
            [single] => single,
            many => return Err(EnrollError::MultipleFacesDetected(many.len())),
        };

        self.state = EnrollState::Validating;
        if let GeometryOutcome::Reject(reason) = validator::validate(detection, &self.geometry) {
            tracing::debug!(identity = %name, ?reason, "capture rejected");
            self.state = EnrollState::AwaitingSingleFace;
            return Err(reason.into());
        }

        // A face box without a descriptor cannot be enrolled; treat it the
        // same as the detector having found nothing usable.
        let Some(embedding) = detection.embedding.clone() else {
            self.state = EnrollState::AwaitingSingleFace;
            return Err(EnrollError::NoFaceDetected);
        };

        self.state = EnrollState::Captured;
        if let Err(err) = store.put_record(name, &frame.data) {
            self.state = EnrollState::AwaitingSingleFace;
            return Err(err.into());
        }

        gallery.insert(name, embedding);
        self.state = EnrollState::Persisted;
        tracing::info!(identity = %name, gallery_size = gallery.len(), "identity enrolled");

        Ok(Enrollment {
            identity: name.to_owned(),
        })
    }
}
