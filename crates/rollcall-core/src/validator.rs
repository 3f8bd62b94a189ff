//! Geometric acceptance checks for enrollment captures.
//!
//! A capture is only worth persisting if the face is roughly centered in the
//! frame and the head is level; off-center or tilted enrollment photos yield
//! embeddings that drag the match threshold around at attendance time.

use serde::{Deserialize, Serialize};

use crate::types::Detection;

/// Pixel-scale tolerances for the geometry checks.
///
/// Both limits are expressed in pixels of the detector's frame, so
/// deployments running at a different capture resolution override them
/// rather than relying on the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Maximum distance from face center to frame center.
    pub max_center_offset: f32,
    /// Maximum vertical offset between the outer eye corners.
    pub max_eye_tilt: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            max_center_offset: 100.0,
            max_eye_tilt: 15.0,
        }
    }
}

/// Why a detection was rejected, with the measured value for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    NotCentered { offset: f32 },
    Tilted { tilt: f32 },
}

/// Outcome of the geometry checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryOutcome {
    Accept,
    Reject(RejectReason),
}

impl GeometryOutcome {
    pub fn is_accept(&self) -> bool {
        matches!(self, GeometryOutcome::Accept)
    }
}

/// Decide whether a detection is suitable for enrollment.
///
/// Centering is checked before tilt, so a face that fails both reports
/// `NotCentered`. Pure and deterministic; the caller is responsible for
/// pre-filtering to single-face frames.
pub fn validate(detection: &Detection, config: &GeometryConfig) -> GeometryOutcome {
    let offset = detection.center_offset();
    if offset > config.max_center_offset {
        return GeometryOutcome::Reject(RejectReason::NotCentered { offset });
    }

    let tilt = detection.landmarks.eye_tilt();
    if tilt > config.max_eye_tilt {
        return GeometryOutcome::Reject(RejectReason::Tilted { tilt });
    }

    GeometryOutcome::Accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Landmarks};

    fn detection(x: f32, y: f32, tilt: f32) -> Detection {
        let mut right_eye = [(0.0f32, 0.0f32); 6];
        right_eye[3].1 = tilt;
        Detection {
            bounds: BoundingBox { x, y, width: 100.0, height: 100.0 },
            landmarks: Landmarks { left_eye: [(0.0, 0.0); 6], right_eye },
            embedding: None,
            frame_width: 1280.0,
            frame_height: 720.0,
        }
    }

    #[test]
    fn test_perfectly_centered_level_face_accepted() {
        // Box centered exactly on the 1280x720 frame center, zero tilt.
        let det = detection(590.0, 310.0, 0.0);
        assert_eq!(validate(&det, &GeometryConfig::default()), GeometryOutcome::Accept);
    }

    #[test]
    fn test_slightly_low_face_accepted() {
        // Center (640, 380): offset 20 px from frame center, tilt 5 px.
        let det = detection(590.0, 330.0, 5.0);
        assert_eq!(validate(&det, &GeometryConfig::default()), GeometryOutcome::Accept);
    }

    #[test]
    fn test_off_center_face_rejected() {
        // Center (150, 150): well past the 100 px offset limit.
        let det = detection(100.0, 100.0, 0.0);
        match validate(&det, &GeometryConfig::default()) {
            GeometryOutcome::Reject(RejectReason::NotCentered { offset }) => {
                assert!(offset > 100.0);
            }
            other => panic!("expected NotCentered, got {other:?}"),
        }
    }

    #[test]
    fn test_off_center_reported_before_tilt() {
        // Fails both checks; centering wins.
        let det = detection(100.0, 100.0, 40.0);
        assert!(matches!(
            validate(&det, &GeometryConfig::default()),
            GeometryOutcome::Reject(RejectReason::NotCentered { .. })
        ));
    }

    #[test]
    fn test_tilted_face_rejected() {
        let det = detection(590.0, 310.0, 16.0);
        match validate(&det, &GeometryConfig::default()) {
            GeometryOutcome::Reject(RejectReason::Tilted { tilt }) => {
                assert!((tilt - 16.0).abs() < 1e-6);
            }
            other => panic!("expected Tilted, got {other:?}"),
        }
    }

    #[test]
    fn test_thresholds_are_overridable() {
        let loose = GeometryConfig { max_center_offset: 1000.0, max_eye_tilt: 50.0 };
        let det = detection(100.0, 100.0, 40.0);
        assert_eq!(validate(&det, &loose), GeometryOutcome::Accept);
    }
}
