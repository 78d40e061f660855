//! SQLite-backed blob store.

use super::{FileKind, FileMeta, NewFile, Page, StoredFile};
use crate::error::{DocqaError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        file_name TEXT NOT NULL,
        content_type TEXT NOT NULL,
        file_size_bytes INTEGER NOT NULL,
        content BLOB NOT NULL,
        md_text TEXT,
        uploaded_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at);

    CREATE TABLE IF NOT EXISTS videos (
        id TEXT PRIMARY KEY,
        file_name TEXT NOT NULL,
        content_type TEXT NOT NULL,
        file_size_bytes INTEGER NOT NULL,
        content BLOB NOT NULL,
        transcript TEXT,
        uploaded_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_videos_uploaded_at ON videos(uploaded_at);
"#;

/// Stores raw uploads with metadata and derived text, one table per kind.
pub struct BlobStore {
    conn: Mutex<Connection>,
}

impl BlobStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite blob store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DocqaError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    /// Insert a file and return its generated id.
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.content.len()))]
    pub fn insert(&self, kind: FileKind, file: &NewFile) -> Result<FileMeta> {
        let conn = self.lock()?;

        let meta = FileMeta {
            id: Uuid::new_v4(),
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            file_size_bytes: file.content.len() as u64,
            uploaded_at: Utc::now(),
            has_text: file.text.as_deref().is_some_and(|t| !t.trim().is_empty()),
        };

        let sql = format!(
            "INSERT INTO {} (id, file_name, content_type, file_size_bytes, content, {}, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            kind.table(),
            kind.text_column()
        );

        conn.execute(
            &sql,
            params![
                meta.id.to_string(),
                meta.file_name,
                meta.content_type,
                meta.file_size_bytes as i64,
                file.content,
                file.text,
                meta.uploaded_at.to_rfc3339(),
            ],
        )?;

        debug!("Inserted {} {}", kind, meta.id);
        Ok(meta)
    }

    /// Fetch a file with its bytes.
    #[instrument(skip(self))]
    pub fn get(&self, kind: FileKind, id: Uuid) -> Result<Option<StoredFile>> {
        let conn = self.lock()?;

        let sql = format!(
            "SELECT id, file_name, content_type, file_size_bytes, uploaded_at, content, {}
             FROM {} WHERE id = ?1",
            kind.text_column(),
            kind.table()
        );

        let file = conn
            .query_row(&sql, params![id.to_string()], |row| {
                let text: Option<String> = row.get(6)?;
                let mut meta = meta_from_row(row)?;
                meta.has_text = text.as_deref().is_some_and(|t| !t.trim().is_empty());
                Ok(StoredFile {
                    meta,
                    content: row.get(5)?,
                    text,
                })
            })
            .optional()?;

        Ok(file)
    }

    /// List file metadata, newest first. `page` is 1-based.
    #[instrument(skip(self))]
    pub fn list(&self, kind: FileKind, page: u32, page_size: u32) -> Result<Page<FileMeta>> {
        if page == 0 || page_size == 0 {
            return Err(DocqaError::InvalidInput(
                "page and page_size must be at least 1".to_string(),
            ));
        }

        let conn = self.lock()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT id, file_name, content_type, file_size_bytes, uploaded_at,
                    ({col} IS NOT NULL AND LENGTH(TRIM({col})) > 0) AS has_text
             FROM {table}
             ORDER BY uploaded_at DESC, id
             LIMIT ?1 OFFSET ?2",
            col = kind.text_column(),
            table = kind.table()
        );

        let mut stmt = conn.prepare(&sql)?;
        let offset = (page as i64 - 1) * page_size as i64;
        let rows = stmt.query_map(params![page_size as i64, offset], |row| {
            let mut meta = meta_from_row(row)?;
            meta.has_text = row.get(5)?;
            Ok(meta)
        })?;

        let items = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total: total as u64,
            page,
            page_size,
        })
    }
}

fn meta_from_row(row: &Row<'_>) -> rusqlite::Result<FileMeta> {
    let id_str: String = row.get(0)?;
    let size: i64 = row.get(3)?;
    let uploaded_at_str: String = row.get(4)?;

    Ok(FileMeta {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        file_name: row.get(1)?,
        content_type: row.get(2)?,
        file_size_bytes: size.max(0) as u64,
        uploaded_at: DateTime::parse_from_rfc3339(&uploaded_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        has_text: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, text: Option<&str>) -> NewFile {
        NewFile {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            content: format!("%PDF-1.4 {}", name).into_bytes(),
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = BlobStore::in_memory().unwrap();
        let meta = store
            .insert(FileKind::Document, &pdf("manual.pdf", Some("# Manual")))
            .unwrap();

        let file = store.get(FileKind::Document, meta.id).unwrap().unwrap();
        assert_eq!(file.meta.file_name, "manual.pdf");
        assert_eq!(file.meta.file_size_bytes, file.content.len() as u64);
        assert_eq!(file.text.as_deref(), Some("# Manual"));
        assert!(file.meta.has_text);
    }

    #[test]
    fn test_kinds_are_separate_tables() {
        let store = BlobStore::in_memory().unwrap();
        let meta = store.insert(FileKind::Document, &pdf("a.pdf", None)).unwrap();

        assert!(store.get(FileKind::Video, meta.id).unwrap().is_none());
        assert_eq!(store.list(FileKind::Document, 1, 10).unwrap().total, 1);
        assert_eq!(store.list(FileKind::Video, 1, 10).unwrap().total, 0);
    }

    #[test]
    fn test_missing_id_is_none() {
        let store = BlobStore::in_memory().unwrap();
        assert!(store.get(FileKind::Document, Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_paginates() {
        let store = BlobStore::in_memory().unwrap();
        for i in 0..5 {
            let text = if i % 2 == 0 { Some("text") } else { Some("  ") };
            store
                .insert(FileKind::Document, &pdf(&format!("{i}.pdf"), text))
                .unwrap();
        }

        let first = store.list(FileKind::Document, 1, 2).unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.items.len(), 2);

        let last = store.list(FileKind::Document, 3, 2).unwrap();
        assert_eq!(last.items.len(), 1);

        let beyond = store.list(FileKind::Document, 4, 2).unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);

        let all = store.list(FileKind::Document, 1, 10).unwrap();
        assert_eq!(all.items.iter().filter(|m| m.has_text).count(), 3);
    }

    #[test]
    fn test_page_zero_rejected() {
        let store = BlobStore::in_memory().unwrap();
        assert!(matches!(
            store.list(FileKind::Video, 0, 10),
            Err(DocqaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_on_disk_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.db");

        let id = {
            let store = BlobStore::new(&path).unwrap();
            store.insert(FileKind::Video, &NewFile {
                file_name: "talk.mp4".into(),
                content_type: "video/mp4".into(),
                content: vec![0u8; 16],
                text: Some("hello".into()),
            })
            .unwrap()
            .id
        };

        let reopened = BlobStore::new(&path).unwrap();
        let file = reopened.get(FileKind::Video, id).unwrap().unwrap();
        assert_eq!(file.text.as_deref(), Some("hello"));
    }
}
