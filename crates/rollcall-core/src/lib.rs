//! rollcall-core — Face validation, matching, and attendance state.
//!
//! The decision logic of the attendance system: geometric acceptance checks
//! for enrollment captures, nearest-neighbor matching of live embeddings
//! against the enrolled gallery, and the per-session roll. Detection,
//! capture, and persistence are external collaborators behind the traits in
//! [`boundary`].

pub mod boundary;
pub mod enroll;
pub mod gallery;
pub mod matcher;
pub mod session;
pub mod types;
pub mod validator;

pub use boundary::{Detector, DetectorError, RecordStore, StoreError, StoredRecord};
pub use enroll::{EnrollError, EnrollState, Enrollment, EnrollmentPipeline};
pub use gallery::{Gallery, GalleryEntry};
pub use matcher::{EuclideanMatcher, MatchResult, Matcher, DEFAULT_MATCH_THRESHOLD};
pub use session::{AttendanceEntry, AttendanceSession, FrameOutcome};
pub use types::{BoundingBox, Detection, Embedding, Frame, Landmarks};
pub use validator::{validate, GeometryConfig, GeometryOutcome, RejectReason};
