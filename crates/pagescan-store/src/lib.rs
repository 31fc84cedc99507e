// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-store — Durable storage of recognised page text.
//
// Every backend persists `(document_id, page_number, ocr_text)` rows in a
// `pages` table with a unique key on `(document_id, page_number)`, and writes
// through a single atomic upsert so re-ingesting a page replaces its text.

pub mod lazy;
pub mod page_store;
pub mod sqlite;

#[cfg(feature = "mysql")]
pub mod mysql_store;

pub use lazy::LazyStore;
pub use page_store::PageStore;
pub use sqlite::SqlitePageStore;

#[cfg(feature = "mysql")]
pub use mysql_store::MysqlPageStore;
