//! Nearest-neighbor matching of a live embedding against the gallery.

use crate::gallery::Gallery;
use crate::types::Embedding;

/// Default maximum Euclidean distance for declaring a match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// Label used for unmatched faces at presentation edges (logs, D-Bus, CLI).
pub const UNKNOWN_LABEL: &str = "unknown";

/// Result of matching one live embedding. `identity` is `None` when the
/// nearest candidate is farther than the threshold; `distance` is the
/// nearest distance either way (`+inf` against an empty gallery).
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub identity: Option<String>,
    pub distance: f32,
}

impl MatchResult {
    /// The matched identity, or the literal `"unknown"` label.
    pub fn label(&self) -> &str {
        self.identity.as_deref().unwrap_or(UNKNOWN_LABEL)
    }
}

/// Strategy for comparing a live embedding against the gallery.
pub trait Matcher {
    fn find_best(&self, probe: &Embedding, gallery: &Gallery, threshold: f32) -> MatchResult;
}

/// Euclidean nearest-neighbor matcher.
///
/// Deterministic linear scan in gallery insertion order; a strict `<` on the
/// running minimum makes ties resolve to the first-encountered candidate.
pub struct EuclideanMatcher;

impl Matcher for EuclideanMatcher {
    fn find_best(&self, probe: &Embedding, gallery: &Gallery, threshold: f32) -> MatchResult {
        let mut best_distance = f32::INFINITY;
        let mut best_identity: Option<&str> = None;

        for (identity, candidate) in gallery.candidates() {
            let distance = probe.distance(candidate);
            if distance < best_distance {
                best_distance = distance;
                best_identity = Some(identity);
            }
        }

        let identity = match best_identity {
            Some(id) if best_distance <= threshold => Some(id.to_owned()),
            _ => None,
        };

        MatchResult {
            identity,
            distance: best_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    #[test]
    fn test_reflexive_match_is_exact() {
        let mut gallery = Gallery::new();
        gallery.insert("Alice", emb(&[0.1, 0.2, 0.3]));
        let result = EuclideanMatcher.find_best(&emb(&[0.1, 0.2, 0.3]), &gallery, 0.6);
        assert_eq!(result.identity.as_deref(), Some("Alice"));
        assert_eq!(result.distance, 0.0);
    }

    #[test]
    fn test_distance_beyond_threshold_is_unknown() {
        let mut gallery = Gallery::new();
        gallery.insert("Alice", emb(&[0.0, 0.0]));
        let result = EuclideanMatcher.find_best(&emb(&[0.8, 0.0]), &gallery, 0.6);
        assert_eq!(result.identity, None);
        assert_eq!(result.label(), "unknown");
        assert!((result.distance - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_empty_gallery_is_unknown_at_infinity() {
        let result = EuclideanMatcher.find_best(&emb(&[1.0]), &Gallery::new(), 0.6);
        assert_eq!(result.identity, None);
        assert_eq!(result.distance, f32::INFINITY);
    }

    #[test]
    fn test_nearest_candidate_wins() {
        let mut gallery = Gallery::new();
        gallery.insert("far", emb(&[10.0, 0.0]));
        gallery.insert("near", emb(&[0.1, 0.0]));
        let result = EuclideanMatcher.find_best(&emb(&[0.0, 0.0]), &gallery, 0.6);
        assert_eq!(result.identity.as_deref(), Some("near"));
    }

    #[test]
    fn test_tie_breaks_to_first_inserted() {
        let mut gallery = Gallery::new();
        gallery.insert("first", emb(&[0.5, 0.0]));
        gallery.insert("second", emb(&[0.5, 0.0]));
        let result = EuclideanMatcher.find_best(&emb(&[0.0, 0.0]), &gallery, 0.6);
        assert_eq!(result.identity.as_deref(), Some("first"));
    }

    #[test]
    fn test_truncated_probe_cannot_false_match() {
        // A malformed detector payload with fewer dimensions than the gallery
        // must never beat the threshold by comparing only a prefix.
        let mut gallery = Gallery::new();
        gallery.insert("Alice", emb(&[0.0, 0.0, 9.0]));
        let result = EuclideanMatcher.find_best(&emb(&[0.0, 0.0]), &gallery, 0.6);
        assert_eq!(result.identity, None);
        assert_eq!(result.distance, f32::INFINITY);
    }

    #[test]
    fn test_extra_embeddings_count_as_candidates() {
        // A second enrollment image closer to the probe should carry the match.
        let mut gallery = Gallery::new();
        gallery.insert("Alice", emb(&[5.0, 0.0]));
        gallery.insert("Alice", emb(&[0.2, 0.0]));
        let result = EuclideanMatcher.find_best(&emb(&[0.0, 0.0]), &gallery, 0.6);
        assert_eq!(result.identity.as_deref(), Some("Alice"));
        assert!((result.distance - 0.2).abs() < 1e-6);
    }
}
