use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in pixel units of the frame it was
/// detected in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Center of the box.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Facial landmarks grouped by region. Only the two six-point eye groups of
/// the 68-point layout are carried; they are all the geometry checks need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmarks {
    pub left_eye: [(f32, f32); 6],
    pub right_eye: [(f32, f32); 6],
}

impl Landmarks {
    /// Vertical offset between the outer eye corners: the left group's first
    /// point against the right group's fourth (indices 36 and 45 of the
    /// 68-point layout).
    pub fn eye_tilt(&self) -> f32 {
        (self.left_eye[0].1 - self.right_eye[3].1).abs()
    }
}

/// Face embedding vector. Dimensionality is fixed by the external model
/// (128 for the recognition net we deploy against); embeddings are compared
/// only by Euclidean distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Euclidean distance to another embedding.
    ///
    /// Embeddings of different dimensionality cannot have come from the same
    /// model; they compare as infinitely far apart rather than silently
    /// truncating to the shorter vector.
    pub fn distance(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// One detected face: box, landmarks, descriptor, and the dimensions of the
/// frame it came from. Produced by the external detector, consumed whole by
/// the validator or the matcher for exactly one decision.
///
/// The embedding is optional: a detector may localize a face without
/// producing a descriptor, and the matching path treats such detections as
/// unmatched rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bounds: BoundingBox,
    pub landmarks: Landmarks,
    pub embedding: Option<Embedding>,
    pub frame_width: f32,
    pub frame_height: f32,
}

impl Detection {
    /// Distance from the face center to the frame center.
    pub fn center_offset(&self) -> f32 {
        let (cx, cy) = self.bounds.center();
        let dx = cx - self.frame_width / 2.0;
        let dy = cy - self.frame_height / 2.0;
        dx.hypot(dy)
    }
}

/// A captured frame as delivered by the capture source. The pixel payload is
/// opaque to the core: it is handed to storage at enrollment and re-run
/// through the detector at bootstrap, never inspected.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_center() {
        let b = BoundingBox { x: 590.0, y: 330.0, width: 100.0, height: 100.0 };
        assert_eq!(b.center(), (640.0, 380.0));
    }

    #[test]
    fn test_euclidean_distance_identical() {
        let a = Embedding::new(vec![0.2, -0.4, 0.1]);
        assert_eq!(a.distance(&a.clone()), 0.0);
    }

    #[test]
    fn test_euclidean_distance_unit_apart() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![3.0, 4.0]);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_mismatched_dimensions_never_match() {
        let a = Embedding::new(vec![0.0, 0.0, 0.0]);
        let b = Embedding::new(vec![0.0, 0.0]);
        assert_eq!(a.distance(&b), f32::INFINITY);
        assert_eq!(b.distance(&a), f32::INFINITY);
    }

    #[test]
    fn test_eye_tilt_uses_outer_corners() {
        let mut left = [(0.0f32, 10.0f32); 6];
        let mut right = [(0.0f32, 10.0f32); 6];
        left[0].1 = 22.0;
        right[3].1 = 30.0;
        // Inner points are noise and must not affect the measurement.
        left[2].1 = 500.0;
        right[5].1 = -500.0;
        let lm = Landmarks { left_eye: left, right_eye: right };
        assert!((lm.eye_tilt() - 8.0).abs() < 1e-6);
    }
}
