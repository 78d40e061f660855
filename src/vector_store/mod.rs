//! Vector store for chunk embeddings.
//!
//! A flat index searched exhaustively by L2 distance, serialized to an index
//! file plus a lookup table and fully rewritten on every append.

mod flat;
pub mod persist;
mod store;

pub use flat::FlatIndex;
pub use store::VectorStore;

use crate::storage::FileKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lookup-table record for one stored vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Generated entry id.
    pub id: Uuid,
    /// Chunk text.
    pub text: String,
    /// Uploaded file the chunk came from.
    pub source_id: Uuid,
    /// Table the source file lives in.
    pub source_kind: FileKind,
}

impl IndexEntry {
    pub fn new(id: Uuid, text: String, source_id: Uuid, source_kind: FileKind) -> Self {
        Self {
            id,
            text,
            source_id,
            source_kind,
        }
    }
}

/// A search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched entry.
    pub entry: IndexEntry,
    /// L2 distance to the query (lower is closer).
    pub distance: f32,
}

/// Euclidean distance between two vectors of equal length.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_distance() {
        assert!((l2_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(l2_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_entry_serializes_kind_lowercase() {
        let entry = IndexEntry::new(Uuid::nil(), "t".into(), Uuid::nil(), FileKind::Video);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["source_kind"], "video");
    }
}
