// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The page store capability shared by all backends.

use pagescan_core::error::Result;
use pagescan_core::types::{PageKey, PageRecord};

/// Durable, keyed storage of page text.
///
/// Methods take `&mut self` because a store owns exactly one connection and
/// some drivers need exclusive access to issue a query.
pub trait PageStore {
    /// Short backend identifier (`"sqlite"`, `"mysql"`).
    fn backend_name(&self) -> &'static str;

    /// Create the `pages` table if it does not exist. Safe to call repeatedly.
    fn ensure_schema(&mut self) -> Result<()>;

    /// One cheap round-trip to prove the connection works.
    fn ping(&mut self) -> Result<()>;

    /// Insert `(key, text)` or, if the key exists, replace only its text.
    ///
    /// One atomic statement, committed before returning. On error the row is
    /// exactly as it was before the call. Fails with `Constraint` when the
    /// document does not exist and `Connection` when the store is unreachable.
    fn upsert_page(&mut self, key: PageKey, text: &str) -> Result<()>;

    fn get_page(&mut self, key: PageKey) -> Result<Option<PageRecord>>;

    /// All stored pages of a document, ordered by page number.
    fn pages_for_document(&mut self, document_id: i64) -> Result<Vec<PageRecord>>;

    fn page_count(&mut self, document_id: i64) -> Result<u64>;
}

impl<S: PageStore + ?Sized> PageStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn ensure_schema(&mut self) -> Result<()> {
        (**self).ensure_schema()
    }

    fn ping(&mut self) -> Result<()> {
        (**self).ping()
    }

    fn upsert_page(&mut self, key: PageKey, text: &str) -> Result<()> {
        (**self).upsert_page(key, text)
    }

    fn get_page(&mut self, key: PageKey) -> Result<Option<PageRecord>> {
        (**self).get_page(key)
    }

    fn pages_for_document(&mut self, document_id: i64) -> Result<Vec<PageRecord>> {
        (**self).pages_for_document(document_id)
    }

    fn page_count(&mut self, document_id: i64) -> Result<u64> {
        (**self).page_count(document_id)
    }
}
