//! Persistent vector store: load-existing-or-create, append, persist, reload.

use super::{persist, FlatIndex, IndexEntry, SearchResult};
use crate::error::{DocqaError, Result};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

/// Vector store backed by the two-file serialization in one directory.
///
/// Writers are serialized through the write lock, so two ingestions in the
/// same process can never overwrite each other's entries. Readers share the
/// in-memory index, which mirrors the files after every write.
pub struct VectorStore {
    dir: PathBuf,
    index: RwLock<Option<FlatIndex>>,
}

impl VectorStore {
    /// Open the store in `dir`, loading it if both files are present.
    #[instrument]
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let index = if persist::exists(dir) {
            let index = persist::load(dir)?;
            info!("Vector store loaded from {:?} ({} entries)", dir, index.len());
            Some(index)
        } else {
            info!("Vector store not found in {:?}; start by uploading a document", dir);
            None
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            index: RwLock::new(index),
        })
    }

    /// Whether an index is loaded.
    pub async fn is_loaded(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Number of stored entries (0 when nothing is loaded).
    pub async fn len(&self) -> usize {
        self.index.read().await.as_ref().map_or(0, FlatIndex::len)
    }

    /// Append entries, rewrite both files, and reload them.
    #[instrument(skip(self, entries, vectors), fields(count = entries.len()))]
    pub async fn append(&self, entries: Vec<IndexEntry>, vectors: Vec<Vec<f32>>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let dimension = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| DocqaError::VectorStore("entries without vectors".to_string()))?;
        if dimension == 0 {
            return Err(DocqaError::VectorStore("embeddings are empty".to_string()));
        }

        let mut guard = self.index.write().await;

        if guard.is_none() {
            *guard = self.read_from_disk()?;
        }
        if guard.is_none() {
            info!("Creating vector store with dimension {}", dimension);
            *guard = Some(FlatIndex::new(dimension)?);
        }
        let index = guard
            .as_mut()
            .ok_or_else(|| DocqaError::VectorStore("vector store is not initialized".to_string()))?;

        let added = index.add(entries, vectors)?;

        if let Err(e) = persist::save(index, &self.dir) {
            error!("Failed to persist vector store: {}", e);
            // Drop the unsaved entries so memory keeps matching disk.
            *guard = match self.read_from_disk() {
                Ok(on_disk) => on_disk,
                Err(reload_err) => {
                    warn!("Could not reload vector store after failed save: {}", reload_err);
                    None
                }
            };
            return Err(e);
        }

        *guard = self.read_from_disk()?;
        info!(
            "Added {} entries to vector store ({} total)",
            added,
            guard.as_ref().map_or(0, FlatIndex::len)
        );

        Ok(added)
    }

    /// Nearest-neighbor lookup.
    ///
    /// Fails with [`DocqaError::IndexEmpty`] until something has been indexed.
    pub async fn search(
        &self,
        query: &[f32],
        k: usize,
        max_distance: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let guard = self.index.read().await;
        let index = guard
            .as_ref()
            .filter(|i| !i.is_empty())
            .ok_or(DocqaError::IndexEmpty)?;

        let mut results = index.search(query, k)?;
        if let Some(limit) = max_distance {
            results.retain(|r| r.distance <= limit);
        }
        Ok(results)
    }

    fn read_from_disk(&self) -> Result<Option<FlatIndex>> {
        if persist::exists(&self.dir) {
            persist::load(&self.dir).map(Some)
        } else {
            Ok(None)
        }
    }
}
