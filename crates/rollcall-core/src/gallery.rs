//! In-memory gallery of enrolled identities and their reference embeddings.

use crate::types::Embedding;

/// One enrolled identity with its reference embeddings. Repeated enrollments
/// of the same identity extend the list; an entry never exists without at
/// least one embedding.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub identity: String,
    pub embeddings: Vec<Embedding>,
}

/// Mapping from identity to reference embeddings.
///
/// Backed by a `Vec` rather than a hash map so that iteration order is
/// insertion order: the matcher's first-encountered tie-break is only
/// deterministic if candidate order is.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an embedding to `identity`'s reference list, creating the entry
    /// if this is the first enrollment. Identities are case-sensitive exact
    /// keys.
    pub fn insert(&mut self, identity: &str, embedding: Embedding) {
        match self.entries.iter_mut().find(|e| e.identity == identity) {
            Some(entry) => entry.embeddings.push(embedding),
            None => self.entries.push(GalleryEntry {
                identity: identity.to_owned(),
                embeddings: vec![embedding],
            }),
        }
    }

    /// Flatten every identity's embeddings into individual comparison
    /// candidates, in insertion order. An identity enrolled with N images
    /// contributes N candidates.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, &Embedding)> {
        self.entries
            .iter()
            .flat_map(|e| e.embeddings.iter().map(move |emb| (e.identity.as_str(), emb)))
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.identity.as_str())
    }

    /// Number of enrolled identities (not candidates).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(v: f32) -> Embedding {
        Embedding::new(vec![v, v])
    }

    #[test]
    fn test_insert_creates_then_extends() {
        let mut g = Gallery::new();
        g.insert("alice", emb(1.0));
        g.insert("alice", emb(2.0));
        assert_eq!(g.len(), 1);
        assert_eq!(g.candidates().count(), 2);
    }

    #[test]
    fn test_identities_are_case_sensitive() {
        let mut g = Gallery::new();
        g.insert("Alice", emb(1.0));
        g.insert("alice", emb(2.0));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_candidates_preserve_insertion_order() {
        let mut g = Gallery::new();
        g.insert("a", emb(1.0));
        g.insert("b", emb(2.0));
        g.insert("a", emb(3.0));
        let order: Vec<&str> = g.candidates().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["a", "a", "b"]);
        let ids: Vec<&str> = g.identities().collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_gallery() {
        let g = Gallery::new();
        assert!(g.is_empty());
        assert_eq!(g.candidates().count(), 0);
    }
}
