//! Contracts with the external collaborators the core does not own: the
//! detection model and the record store. Both are opaque to the core; these
//! traits fix only the shapes the pipeline depends on.

use thiserror::Error;

use crate::types::{Detection, Frame};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// The external face-detection model: one frame in, zero or more detections
/// out. Bounding boxes, landmarks, and embeddings all come from here.
pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError>;
}

/// One persisted enrollment record.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub identity: String,
    pub image: Vec<u8>,
}

/// Persistent store of enrollment records. The core requires exactly two
/// fields per record: the identity string and a re-detectable image blob;
/// the persisted layout is the implementation's business.
pub trait RecordStore {
    fn put_record(&mut self, identity: &str, image: &[u8]) -> Result<(), StoreError>;
    fn all_records(&self) -> Result<Vec<StoredRecord>, StoreError>;
}
