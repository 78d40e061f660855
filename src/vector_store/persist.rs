//! Two-file serialization of the flat index.
//!
//! `index.vec` holds the vectors behind a small binary header, `index.json`
//! holds the lookup table. Both are rewritten in full on every save,
//! `index.vec` first. Entries are append-only, so a save interrupted between
//! the two renames leaves an `index.vec` whose first rows still match the
//! older lookup table; `load` keeps those rows and drops the rest.

use super::{FlatIndex, IndexEntry};
use crate::error::{DocqaError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

/// Binary vector file name.
pub const INDEX_FILE: &str = "index.vec";
/// Lookup table file name.
pub const LOOKUP_FILE: &str = "index.json";

const MAGIC: &[u8; 4] = b"DQVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Serialize, Deserialize)]
struct LookupTable {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

/// Whether a complete store (both files) exists in `dir`.
pub fn exists(dir: &Path) -> bool {
    dir.join(INDEX_FILE).is_file() && dir.join(LOOKUP_FILE).is_file()
}

/// Write both files for `index` into `dir`.
#[instrument(skip(index), fields(entries = index.len()))]
pub fn save(index: &FlatIndex, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + index.vectors().len() * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(index.dimension() as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u64).to_le_bytes());
    bytes.extend(index.vectors().iter().flat_map(|f| f.to_le_bytes()));

    let table = LookupTable {
        dimension: index.dimension(),
        entries: index.entries().to_vec(),
    };
    let json = serde_json::to_vec(&table)?;

    write_replace(dir, INDEX_FILE, &bytes)?;
    write_replace(dir, LOOKUP_FILE, &json)?;

    debug!("Saved vector store to {:?}", dir);
    Ok(())
}

/// Read both files from `dir`.
#[instrument]
pub fn load(dir: &Path) -> Result<FlatIndex> {
    let bytes = std::fs::read(dir.join(INDEX_FILE))?;
    let table: LookupTable = serde_json::from_slice(&std::fs::read(dir.join(LOOKUP_FILE))?)?;

    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(DocqaError::VectorStore(format!("{} is not a vector index", INDEX_FILE)));
    }

    let version = u32::from_le_bytes(read_array(&bytes, 4));
    if version != FORMAT_VERSION {
        return Err(DocqaError::VectorStore(format!(
            "unsupported index format version {}",
            version
        )));
    }

    let dimension = u32::from_le_bytes(read_array(&bytes, 8)) as usize;
    let count = u64::from_le_bytes(read_array(&bytes, 12)) as usize;

    if dimension != table.dimension || count < table.entries.len() {
        return Err(DocqaError::VectorStore(format!(
            "index ({} x {}) and lookup table ({} x {}) disagree",
            count,
            dimension,
            table.entries.len(),
            table.dimension
        )));
    }

    let body = &bytes[HEADER_LEN..];
    if body.len() != count * dimension * 4 {
        return Err(DocqaError::VectorStore(format!(
            "{} is truncated: expected {} vector bytes, found {}",
            INDEX_FILE,
            count * dimension * 4,
            body.len()
        )));
    }

    if count > table.entries.len() {
        warn!(
            "{} has {} vectors but {} lists {} entries; keeping the first {}",
            INDEX_FILE,
            count,
            LOOKUP_FILE,
            table.entries.len(),
            table.entries.len()
        );
    }

    let vectors = body[..table.entries.len() * dimension * 4]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    FlatIndex::from_parts(dimension, table.entries, vectors)
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

/// Write to a sibling temp file, then rename over the target.
fn write_replace(dir: &Path, name: &str, contents: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name)).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileKind;
    use uuid::Uuid;

    fn sample_index() -> FlatIndex {
        let mut index = FlatIndex::new(3).unwrap();
        let entries = vec![
            IndexEntry::new(Uuid::new_v4(), "first".into(), Uuid::new_v4(), FileKind::Document),
            IndexEntry::new(Uuid::new_v4(), "second".into(), Uuid::new_v4(), FileKind::Video),
        ];
        index
            .add(entries, vec![vec![0.1, 0.2, 0.3], vec![-1.0, 0.0, 4.5]])
            .unwrap();
        index
    }

    #[test]
    fn test_save_then_load_preserves_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index();

        assert!(!exists(dir.path()));
        save(&index, dir.path()).unwrap();
        assert!(exists(dir.path()));

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.entries(), index.entries());
        assert_eq!(loaded.vectors(), index.vectors());
    }

    #[test]
    fn test_save_overwrites_previous_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = sample_index();
        save(&index, dir.path()).unwrap();

        index
            .add(
                vec![IndexEntry::new(Uuid::new_v4(), "third".into(), Uuid::new_v4(), FileKind::Document)],
                vec![vec![0.0, 0.0, 1.0]],
            )
            .unwrap();
        save(&index, dir.path()).unwrap();

        assert_eq!(load(dir.path()).unwrap().len(), 3);
    }

    #[test]
    fn test_one_file_missing_is_not_a_store() {
        let dir = tempfile::tempdir().unwrap();
        save(&sample_index(), dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(LOOKUP_FILE)).unwrap();
        assert!(!exists(dir.path()));
    }

    #[test]
    fn test_truncated_index_rejected() {
        let dir = tempfile::tempdir().unwrap();
        save(&sample_index(), dir.path()).unwrap();

        let path = dir.path().join(INDEX_FILE);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(load(dir.path()), Err(DocqaError::VectorStore(_))));
    }

    #[test]
    fn test_lookup_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        save(&sample_index(), dir.path()).unwrap();

        let path = dir.path().join(LOOKUP_FILE);
        let mut table: LookupTable = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        table.dimension = 4;
        std::fs::write(&path, serde_json::to_vec(&table).unwrap()).unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("disagree"), "unexpected error: {err}");
    }

    #[test]
    fn test_zero_dimension_on_disk_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        std::fs::write(dir.path().join(INDEX_FILE), bytes).unwrap();
        std::fs::write(dir.path().join(LOOKUP_FILE), br#"{"dimension":0,"entries":[]}"#).unwrap();

        assert!(matches!(load(dir.path()), Err(DocqaError::VectorStore(_))));
    }

    #[test]
    fn test_interrupted_save_keeps_rows_in_lookup_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = sample_index();
        save(&index, dir.path()).unwrap();
        let old_table = std::fs::read(dir.path().join(LOOKUP_FILE)).unwrap();

        index
            .add(
                vec![IndexEntry::new(Uuid::new_v4(), "third".into(), Uuid::new_v4(), FileKind::Document)],
                vec![vec![0.0, 0.0, 1.0]],
            )
            .unwrap();
        save(&index, dir.path()).unwrap();
        // index.vec renamed, index.json still the previous one
        std::fs::write(dir.path().join(LOOKUP_FILE), old_table).unwrap();

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entries(), &index.entries()[..2]);
        assert_eq!(loaded.vectors(), &index.vectors()[..6]);
    }

    #[test]
    fn test_lookup_table_ahead_of_index_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index();
        save(&index, dir.path()).unwrap();

        let path = dir.path().join(LOOKUP_FILE);
        let mut table: LookupTable = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        table
            .entries
            .push(IndexEntry::new(Uuid::new_v4(), "ghost".into(), Uuid::new_v4(), FileKind::Video));
        std::fs::write(&path, serde_json::to_vec(&table).unwrap()).unwrap();

        assert!(load(dir.path()).is_err());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        save(&sample_index(), dir.path()).unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"nope, not an index").unwrap();

        assert!(load(dir.path()).is_err());
    }
}
