//! In-memory flat index with exact L2 search.

use super::{l2_distance, IndexEntry, SearchResult};
use crate::error::{DocqaError, Result};
use std::collections::HashSet;
use uuid::Uuid;

/// Flat (brute-force) vector index.
///
/// Vectors are stored contiguously; entry `n` owns
/// `vectors[n * dimension..(n + 1) * dimension]`.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
    vectors: Vec<f32>,
    ids: HashSet<Uuid>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Result<Self> {
        check_dimension(dimension)?;
        Ok(Self {
            dimension,
            entries: Vec::new(),
            vectors: Vec::new(),
            ids: HashSet::new(),
        })
    }

    /// Rebuild an index from its serialized parts.
    pub fn from_parts(dimension: usize, entries: Vec<IndexEntry>, vectors: Vec<f32>) -> Result<Self> {
        check_dimension(dimension)?;
        if vectors.len() != entries.len() * dimension {
            return Err(DocqaError::VectorStore(format!(
                "index holds {} floats but {} entries of dimension {} need {}",
                vectors.len(),
                entries.len(),
                dimension,
                entries.len() * dimension
            )));
        }

        let mut ids = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !ids.insert(entry.id) {
                return Err(DocqaError::VectorStore(format!("duplicate entry id {}", entry.id)));
            }
        }

        Ok(Self {
            dimension,
            entries,
            vectors,
            ids,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Raw vector storage, row-major.
    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    /// Append entries with their embeddings.
    ///
    /// Either every entry is added or none is.
    pub fn add(&mut self, entries: Vec<IndexEntry>, vectors: Vec<Vec<f32>>) -> Result<usize> {
        if entries.len() != vectors.len() {
            return Err(DocqaError::VectorStore(format!(
                "{} entries but {} vectors",
                entries.len(),
                vectors.len()
            )));
        }

        let mut batch_ids = HashSet::with_capacity(entries.len());
        for (entry, vector) in entries.iter().zip(&vectors) {
            if vector.len() != self.dimension {
                return Err(DocqaError::VectorStore(format!(
                    "embedding has dimension {}, index expects {}",
                    vector.len(),
                    self.dimension
                )));
            }
            if self.ids.contains(&entry.id) || !batch_ids.insert(entry.id) {
                return Err(DocqaError::VectorStore(format!("duplicate entry id {}", entry.id)));
            }
        }

        let added = entries.len();
        self.vectors.reserve(added * self.dimension);
        for vector in vectors {
            self.vectors.extend_from_slice(&vector);
        }
        self.ids.extend(batch_ids);
        self.entries.extend(entries);

        Ok(added)
    }

    /// Return the `k` nearest entries by L2 distance, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimension {
            return Err(DocqaError::VectorStore(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .map(|v| l2_distance(query, v))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| SearchResult {
                entry: self.entries[position].clone(),
                distance,
            })
            .collect())
    }
}

fn check_dimension(dimension: usize) -> Result<()> {
    if dimension == 0 {
        return Err(DocqaError::VectorStore("vector dimension must be > 0".to_string()));
    }
    Ok(())
}
