// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite page store — local, file-backed (or in-memory) `pages` table.
//
// Schema:
//   documents(
//     id           INTEGER PRIMARY KEY          -- owned by document management
//   )
//   pages(
//     id           INTEGER PRIMARY KEY AUTOINCREMENT,
//     document_id  INTEGER NOT NULL REFERENCES documents(id),
//     page_number  INTEGER NOT NULL,            -- 1-based
//     ocr_text     TEXT    NOT NULL DEFAULT '',
//     UNIQUE (document_id, page_number)
//   )

use std::path::Path;

use pagescan_core::error::PageScanError;
use pagescan_core::types::{PageKey, PageRecord};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::{debug, info, instrument};

use crate::page_store::PageStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY
    );
    CREATE TABLE IF NOT EXISTS pages (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL REFERENCES documents(id),
        page_number INTEGER NOT NULL,
        ocr_text    TEXT    NOT NULL DEFAULT '',
        UNIQUE (document_id, page_number)
    );";

const UPSERT_PAGE: &str = "
    INSERT INTO pages (document_id, page_number, ocr_text)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(document_id, page_number) DO UPDATE SET ocr_text = excluded.ocr_text";

// ---------------------------------------------------------------------------
// Local error helpers
// ---------------------------------------------------------------------------

/// Classify a `rusqlite::Error` into the store error taxonomy.
fn db_err(e: rusqlite::Error) -> PageScanError {
    match &e {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => PageScanError::Constraint(e.to_string()),
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly => PageScanError::Connection(e.to_string()),
            _ => PageScanError::Database(e.to_string()),
        },
        _ => PageScanError::Database(e.to_string()),
    }
}

fn open_err(e: rusqlite::Error) -> PageScanError {
    PageScanError::Connection(e.to_string())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Page store backed by a SQLite database.
///
/// Foreign keys are enforced, so pages can only be stored for documents that
/// exist in the `documents` table.
pub struct SqlitePageStore {
    conn: Connection,
}

impl SqlitePageStore {
    /// Open (or create) the database at `path` and make sure the schema exists.
    ///
    /// WAL mode is enabled so readers are not blocked while a page is written.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PageScanError> {
        let conn = Connection::open(path).map_err(open_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(open_err)?;
        let mut store = Self::from_connection(conn)?;
        store.ensure_schema()?;
        debug!("sqlite page store opened");
        Ok(store)
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, PageScanError> {
        let conn = Connection::open_in_memory().map_err(open_err)?;
        let mut store = Self::from_connection(conn)?;
        store.ensure_schema()?;
        debug!("in-memory page store opened");
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self, PageScanError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(open_err)?;
        Ok(Self { conn })
    }

    /// Make `document_id` known so its pages satisfy the foreign key.
    ///
    /// Documents are normally created by document management; this exists
    /// for local databases and fixtures.
    pub fn register_document(&self, document_id: i64) -> Result<(), PageScanError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO documents (id) VALUES (?1)",
                params![document_id],
            )
            .map_err(db_err)?;
        Ok(())
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<(), PageScanError> {
        self.conn.close().map_err(|(_, e)| db_err(e))
    }
}

impl PageStore for SqlitePageStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn ensure_schema(&mut self) -> Result<(), PageScanError> {
        self.conn.execute_batch(SCHEMA).map_err(db_err)
    }

    fn ping(&mut self) -> Result<(), PageScanError> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(db_err)?;
        Ok(())
    }

    #[instrument(skip(self, text), fields(document_id = key.document_id, page_number = key.page_number, text_len = text.len()))]
    fn upsert_page(&mut self, key: PageKey, text: &str) -> Result<(), PageScanError> {
        self.conn
            .execute(UPSERT_PAGE, params![key.document_id, key.page_number, text])
            .map_err(db_err)?;
        info!("page text stored");
        Ok(())
    }

    fn get_page(&mut self, key: PageKey) -> Result<Option<PageRecord>, PageScanError> {
        self.conn
            .query_row(
                "SELECT document_id, page_number, ocr_text
                 FROM pages
                 WHERE document_id = ?1 AND page_number = ?2",
                params![key.document_id, key.page_number],
                |row| {
                    Ok(PageRecord {
                        document_id: row.get(0)?,
                        page_number: row.get(1)?,
                        ocr_text: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    fn pages_for_document(&mut self, document_id: i64) -> Result<Vec<PageRecord>, PageScanError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT document_id, page_number, ocr_text
                 FROM pages
                 WHERE document_id = ?1
                 ORDER BY page_number ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![document_id], |row| {
                Ok(PageRecord {
                    document_id: row.get(0)?,
                    page_number: row.get(1)?,
                    ocr_text: row.get(2)?,
                })
            })
            .map_err(db_err)?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row.map_err(db_err)?);
        }
        Ok(pages)
    }

    fn page_count(&mut self, document_id: i64) -> Result<u64, PageScanError> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM pages WHERE document_id = ?1",
                params![document_id],
                |row| row.get(0),
            )
            .map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> SqlitePageStore {
        let store = SqlitePageStore::open_in_memory().expect("open in-memory page store");
        store.register_document(10553).unwrap();
        store
    }

    fn key(document_id: i64, page_number: u32) -> PageKey {
        PageKey::new(document_id, page_number).unwrap()
    }

    fn total_rows(store: &SqlitePageStore) -> u64 {
        store
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn upsert_replaces_text_for_same_key() {
        let mut store = make_store();

        store.upsert_page(key(10553, 1), "Hello").unwrap();
        assert_eq!(total_rows(&store), 1);
        assert_eq!(
            store.get_page(key(10553, 1)).unwrap().unwrap().ocr_text,
            "Hello"
        );

        store.upsert_page(key(10553, 1), "World").unwrap();
        assert_eq!(total_rows(&store), 1);
        assert_eq!(
            store.get_page(key(10553, 1)).unwrap(),
            Some(PageRecord {
                document_id: 10553,
                page_number: 1,
                ocr_text: "World".into(),
            })
        );

        store.upsert_page(key(10553, 2), "Page2").unwrap();
        assert_eq!(total_rows(&store), 2);
        assert_eq!(store.page_count(10553).unwrap(), 2);
    }

    #[test]
    fn upsert_keeps_row_identity() {
        let mut store = make_store();
        store.upsert_page(key(10553, 1), "first").unwrap();
        let id_before: i64 = store
            .conn
            .query_row("SELECT id FROM pages", [], |row| row.get(0))
            .unwrap();

        store.upsert_page(key(10553, 1), "second").unwrap();
        let id_after: i64 = store
            .conn
            .query_row("SELECT id FROM pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id_before, id_after);
    }

    #[test]
    fn empty_text_is_stored_not_null() {
        let mut store = make_store();
        store.upsert_page(key(10553, 4), "").unwrap();
        let record = store.get_page(key(10553, 4)).unwrap().unwrap();
        assert_eq!(record.ocr_text, "");
    }

    #[test]
    fn unknown_document_is_constraint_error() {
        let mut store = make_store();
        let err = store.upsert_page(key(999, 1), "orphan").unwrap_err();
        assert!(matches!(err, PageScanError::Constraint(_)), "{err}");
        assert_eq!(total_rows(&store), 0);
    }

    #[test]
    fn pages_are_listed_in_page_order() {
        let mut store = make_store();
        store.register_document(7).unwrap();
        store.upsert_page(key(10553, 3), "three").unwrap();
        store.upsert_page(key(10553, 1), "one").unwrap();
        store.upsert_page(key(7, 1), "other document").unwrap();
        store.upsert_page(key(10553, 2), "two").unwrap();

        let pages = store.pages_for_document(10553).unwrap();
        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(pages[0].ocr_text, "one");
        assert_eq!(store.page_count(7).unwrap(), 1);
    }

    #[test]
    fn missing_page_is_none() {
        let mut store = make_store();
        assert_eq!(store.get_page(key(10553, 9)).unwrap(), None);
        assert!(store.pages_for_document(10553).unwrap().is_empty());
    }

    #[test]
    fn schema_setup_is_idempotent() {
        let mut store = make_store();
        store.upsert_page(key(10553, 1), "kept").unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.page_count(10553).unwrap(), 1);
        store.ping().unwrap();
    }

    #[test]
    fn text_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.db");

        let mut store = SqlitePageStore::open(&path).unwrap();
        store.register_document(10553).unwrap();
        store.upsert_page(key(10553, 1), "durable text").unwrap();
        store.close().unwrap();

        let mut reopened = SqlitePageStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_page(key(10553, 1)).unwrap().unwrap().ocr_text,
            "durable text"
        );
    }

    #[test]
    fn unopenable_path_is_connection_error() {
        let err = SqlitePageStore::open("/nonexistent/dir/pages.db")
            .err()
            .expect("open should fail");
        assert!(matches!(err, PageScanError::Connection(_)), "{err}");
    }
}
