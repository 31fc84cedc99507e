// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deferred connection: a store that connects on its first call.

use pagescan_core::error::Result;
use pagescan_core::types::{PageKey, PageRecord};
use tracing::debug;

use crate::page_store::PageStore;

/// Wraps a connect function and only runs it when the store is first used.
///
/// Lets an ingestion run reject a missing or unreadable image without ever
/// opening a database connection. A failed connect is not cached: the next
/// call tries again.
pub struct LazyStore<F> {
    connect: F,
    backend: &'static str,
    inner: Option<Box<dyn PageStore>>,
}

impl<F> LazyStore<F>
where
    F: FnMut() -> Result<Box<dyn PageStore>>,
{
    pub fn new(backend: &'static str, connect: F) -> Self {
        Self {
            connect,
            backend,
            inner: None,
        }
    }

    /// Whether a connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.inner.is_some()
    }

    fn store(&mut self) -> Result<&mut Box<dyn PageStore>> {
        let store = match self.inner.take() {
            Some(store) => store,
            None => {
                debug!(backend = self.backend, "opening page store on first use");
                (self.connect)()?
            }
        };
        Ok(self.inner.insert(store))
    }
}

impl<F> PageStore for LazyStore<F>
where
    F: FnMut() -> Result<Box<dyn PageStore>>,
{
    fn backend_name(&self) -> &'static str {
        self.backend
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.store()?.ensure_schema()
    }

    fn ping(&mut self) -> Result<()> {
        self.store()?.ping()
    }

    fn upsert_page(&mut self, key: PageKey, text: &str) -> Result<()> {
        self.store()?.upsert_page(key, text)
    }

    fn get_page(&mut self, key: PageKey) -> Result<Option<PageRecord>> {
        self.store()?.get_page(key)
    }

    fn pages_for_document(&mut self, document_id: i64) -> Result<Vec<PageRecord>> {
        self.store()?.pages_for_document(document_id)
    }

    fn page_count(&mut self, document_id: i64) -> Result<u64> {
        self.store()?.page_count(document_id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pagescan_core::error::PageScanError;

    use super::*;
    use crate::sqlite::SqlitePageStore;

    #[test]
    fn connects_once_on_first_use() {
        let opened = Cell::new(0);
        let mut store = LazyStore::new("sqlite", || {
            opened.set(opened.get() + 1);
            let store = SqlitePageStore::open_in_memory()?;
            store.register_document(1)?;
            Ok(Box::new(store) as Box<dyn PageStore>)
        });
        assert!(!store.is_connected());
        assert_eq!(opened.get(), 0);

        let key = PageKey::new(1, 1).unwrap();
        store.upsert_page(key, "text").unwrap();
        assert_eq!(store.get_page(key).unwrap().unwrap().ocr_text, "text");
        assert!(store.is_connected());
        assert_eq!(opened.get(), 1);
    }

    #[test]
    fn connect_failures_surface_on_use() {
        let mut store = LazyStore::new("mysql", || {
            Err(PageScanError::Connection("connection refused".into()))
        });
        let err = store.ping().unwrap_err();
        assert!(matches!(err, PageScanError::Connection(_)));
        assert!(!store.is_connected());
    }
}
