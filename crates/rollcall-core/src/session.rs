//! Per-run attendance state: turns a stream of per-frame match results into
//! a deduplicated, arrival-ordered roll.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::gallery::Gallery;
use crate::matcher::Matcher;
use crate::types::Detection;

/// One arrival on the roll.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    pub identity: String,
    pub marked_at: DateTime<Utc>,
}

/// Outcome for one detection in a processed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Matched {
        identity: String,
        distance: f32,
        newly_marked: bool,
    },
    Unmatched {
        distance: f32,
    },
}

/// One attendance run. Owns the roll exclusively: entries are appended by
/// `process_frame` only, never removed or reordered, and each identity
/// appears at most once.
pub struct AttendanceSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    record: Vec<AttendanceEntry>,
}

impl AttendanceSession {
    pub fn start() -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            record: Vec::new(),
        };
        tracing::info!(session = %session.id, "attendance session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Match every detection in one frame and mark at most one new arrival.
    ///
    /// Detections are processed in delivery order. The first match against a
    /// not-yet-marked identity is appended to the roll; any further unmarked
    /// matches in the same frame are still matched and reported but wait for
    /// a later frame, which keeps a single frame from marking half the room
    /// at once. Detections without an embedding are reported `Unmatched`.
    pub fn process_frame<M: Matcher>(
        &mut self,
        detections: &[Detection],
        matcher: &M,
        gallery: &Gallery,
        threshold: f32,
    ) -> Vec<FrameOutcome> {
        let mut outcomes = Vec::with_capacity(detections.len());
        let mut marked_this_frame = false;

        for detection in detections {
            let Some(embedding) = detection.embedding.as_ref() else {
                outcomes.push(FrameOutcome::Unmatched { distance: f32::INFINITY });
                continue;
            };

            let result = matcher.find_best(embedding, gallery, threshold);
            match result.identity {
                Some(identity) => {
                    let already_marked = self.is_marked(&identity);
                    let newly_marked = !already_marked && !marked_this_frame;
                    if newly_marked {
                        tracing::info!(
                            session = %self.id,
                            identity = %identity,
                            distance = result.distance,
                            "attendance marked"
                        );
                        self.record.push(AttendanceEntry {
                            identity: identity.clone(),
                            marked_at: Utc::now(),
                        });
                        marked_this_frame = true;
                    }
                    outcomes.push(FrameOutcome::Matched {
                        identity,
                        distance: result.distance,
                        newly_marked,
                    });
                }
                None => outcomes.push(FrameOutcome::Unmatched { distance: result.distance }),
            }
        }

        outcomes
    }

    fn is_marked(&self, identity: &str) -> bool {
        self.record.iter().any(|e| e.identity == identity)
    }

    /// Read-only copy of the roll, in first-match order.
    pub fn snapshot(&self) -> Vec<AttendanceEntry> {
        self.record.clone()
    }

    pub fn marked_count(&self) -> usize {
        self.record.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::EuclideanMatcher;
    use crate::types::{BoundingBox, Embedding, Landmarks};

    fn detection(embedding: Option<Embedding>) -> Detection {
        Detection {
            bounds: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            landmarks: Landmarks { left_eye: [(0.0, 0.0); 6], right_eye: [(0.0, 0.0); 6] },
            embedding,
            frame_width: 640.0,
            frame_height: 480.0,
        }
    }

    fn gallery_of(pairs: &[(&str, &[f32])]) -> Gallery {
        let mut g = Gallery::new();
        for (id, values) in pairs {
            g.insert(id, Embedding::new(values.to_vec()));
        }
        g
    }

    #[test]
    fn test_match_marks_once_and_only_once() {
        let gallery = gallery_of(&[("alice", &[0.0, 0.0])]);
        let mut session = AttendanceSession::start();
        let det = detection(Some(Embedding::new(vec![0.1, 0.0])));

        let first = session.process_frame(&[det.clone()], &EuclideanMatcher, &gallery, 0.6);
        match &first[0] {
            FrameOutcome::Matched { identity, newly_marked, .. } => {
                assert_eq!(identity, "alice");
                assert!(*newly_marked);
            }
            other => panic!("expected match, got {other:?}"),
        }

        // Same face on the next frame: reported, not re-marked.
        let second = session.process_frame(&[det], &EuclideanMatcher, &gallery, 0.6);
        assert!(matches!(
            second[0],
            FrameOutcome::Matched { newly_marked: false, .. }
        ));
        assert_eq!(session.marked_count(), 1);
    }

    #[test]
    fn test_at_most_one_new_mark_per_frame() {
        let gallery = gallery_of(&[("alice", &[0.0, 0.0]), ("bob", &[10.0, 10.0])]);
        let mut session = AttendanceSession::start();
        let alice = detection(Some(Embedding::new(vec![0.0, 0.0])));
        let bob = detection(Some(Embedding::new(vec![10.0, 10.0])));

        let outcomes =
            session.process_frame(&[alice, bob.clone()], &EuclideanMatcher, &gallery, 0.6);
        assert!(matches!(
            outcomes[0],
            FrameOutcome::Matched { newly_marked: true, .. }
        ));
        // Bob is matched and reported but must wait for the next frame.
        assert!(matches!(
            outcomes[1],
            FrameOutcome::Matched { newly_marked: false, .. }
        ));
        assert_eq!(session.marked_count(), 1);

        let outcomes = session.process_frame(&[bob], &EuclideanMatcher, &gallery, 0.6);
        assert!(matches!(
            outcomes[0],
            FrameOutcome::Matched { newly_marked: true, .. }
        ));
        assert_eq!(session.marked_count(), 2);
    }

    #[test]
    fn test_roll_order_is_first_match_order() {
        let gallery = gallery_of(&[("a", &[0.0]), ("b", &[10.0]), ("c", &[20.0])]);
        let mut session = AttendanceSession::start();

        for values in [[20.0], [0.0], [10.0]] {
            let det = detection(Some(Embedding::new(values.to_vec())));
            session.process_frame(&[det], &EuclideanMatcher, &gallery, 0.6);
        }

        let roll: Vec<String> = session.snapshot().into_iter().map(|e| e.identity).collect();
        assert_eq!(roll, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_unknown_face_is_reported_not_recorded() {
        let gallery = gallery_of(&[("alice", &[0.0, 0.0])]);
        let mut session = AttendanceSession::start();
        let stranger = detection(Some(Embedding::new(vec![5.0, 5.0])));

        let outcomes = session.process_frame(&[stranger], &EuclideanMatcher, &gallery, 0.6);
        assert!(matches!(outcomes[0], FrameOutcome::Unmatched { .. }));
        assert_eq!(session.marked_count(), 0);
    }

    #[test]
    fn test_missing_embedding_is_unmatched() {
        let gallery = gallery_of(&[("alice", &[0.0, 0.0])]);
        let mut session = AttendanceSession::start();

        let outcomes = session.process_frame(&[detection(None)], &EuclideanMatcher, &gallery, 0.6);
        assert_eq!(outcomes, vec![FrameOutcome::Unmatched { distance: f32::INFINITY }]);
    }

    #[test]
    fn test_empty_gallery_never_marks() {
        let mut session = AttendanceSession::start();
        let det = detection(Some(Embedding::new(vec![0.0])));
        let outcomes = session.process_frame(&[det], &EuclideanMatcher, &Gallery::new(), 0.6);
        assert!(matches!(outcomes[0], FrameOutcome::Unmatched { .. }));
        assert!(session.snapshot().is_empty());
    }
}
