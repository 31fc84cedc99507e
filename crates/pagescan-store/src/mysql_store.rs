// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MySQL / MariaDB page store — the shared production `pages` table.
//
// The table normally already exists (created alongside `documents` by the
// archive's migrations) and may carry extra columns; the upsert only ever
// touches `ocr_text` on conflict.

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder};
use pagescan_core::config::StoreConfig;
use pagescan_core::error::PageScanError;
use pagescan_core::types::{PageKey, PageRecord};
use tracing::{debug, info, instrument};

use crate::page_store::PageStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS pages (
        id          BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        document_id BIGINT          NOT NULL,
        page_number INT UNSIGNED    NOT NULL,
        ocr_text    LONGTEXT        NOT NULL,
        UNIQUE KEY uniq_document_page (document_id, page_number),
        CONSTRAINT fk_pages_document FOREIGN KEY (document_id) REFERENCES documents (id)
    ) CHARACTER SET utf8mb4";

const UPSERT_PAGE: &str = "
    INSERT INTO pages (document_id, page_number, ocr_text)
    VALUES (?, ?, ?)
    ON DUPLICATE KEY UPDATE ocr_text = VALUES(ocr_text)";

const DEFAULT_PORT: u16 = 3306;

// Server error codes.
const ER_DBACCESS_DENIED: u16 = 1044;
const ER_ACCESS_DENIED: u16 = 1045;
const ER_BAD_DB: u16 = 1049;
const ER_NO_REFERENCED_ROW: u16 = 1216;
const ER_ROW_IS_REFERENCED: u16 = 1217;
const ER_ROW_IS_REFERENCED_2: u16 = 1451;
const ER_NO_REFERENCED_ROW_2: u16 = 1452;

/// Classify a `mysql::Error` into the store error taxonomy.
fn db_err(e: mysql::Error) -> PageScanError {
    match &e {
        mysql::Error::MySqlError(server) => match server.code {
            ER_NO_REFERENCED_ROW
            | ER_ROW_IS_REFERENCED
            | ER_ROW_IS_REFERENCED_2
            | ER_NO_REFERENCED_ROW_2 => PageScanError::Constraint(e.to_string()),
            ER_DBACCESS_DENIED | ER_ACCESS_DENIED | ER_BAD_DB => {
                PageScanError::Connection(e.to_string())
            }
            _ => PageScanError::Database(e.to_string()),
        },
        mysql::Error::IoError(_) | mysql::Error::DriverError(_) => {
            PageScanError::Connection(e.to_string())
        }
        _ => PageScanError::Database(e.to_string()),
    }
}

/// Split an optional `:port` suffix off `DB_HOST`.
fn split_host(host: &str) -> (String, u16) {
    if let Some((name, port)) = host.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            return (name.to_string(), port);
        }
    }
    (host.to_string(), DEFAULT_PORT)
}

/// Page store backed by one MySQL connection.
pub struct MysqlPageStore {
    conn: Conn,
}

impl MysqlPageStore {
    /// Connect using `config`. Fails with `Connection` if the server is
    /// unreachable or rejects the credentials.
    #[instrument(skip_all, fields(host = %config.host, database = %config.database))]
    pub fn connect(config: &StoreConfig) -> Result<Self, PageScanError> {
        let (host, port) = split_host(&config.host);
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .tcp_port(port)
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));

        let mut conn = Conn::new(opts).map_err(|e| PageScanError::Connection(e.to_string()))?;
        conn.query_drop("SET NAMES utf8mb4").map_err(db_err)?;
        debug!("mysql page store connected");
        Ok(Self { conn })
    }
}

impl PageStore for MysqlPageStore {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    fn ensure_schema(&mut self) -> Result<(), PageScanError> {
        self.conn.query_drop(SCHEMA).map_err(db_err)
    }

    fn ping(&mut self) -> Result<(), PageScanError> {
        self.conn.query_drop("SELECT 1").map_err(db_err)
    }

    #[instrument(skip(self, text), fields(document_id = key.document_id, page_number = key.page_number, text_len = text.len()))]
    fn upsert_page(&mut self, key: PageKey, text: &str) -> Result<(), PageScanError> {
        self.conn
            .exec_drop(UPSERT_PAGE, (key.document_id, key.page_number, text))
            .map_err(db_err)?;
        info!("page text stored");
        Ok(())
    }

    fn get_page(&mut self, key: PageKey) -> Result<Option<PageRecord>, PageScanError> {
        let row: Option<(i64, u32, Option<String>)> = self
            .conn
            .exec_first(
                "SELECT document_id, page_number, ocr_text
                 FROM pages
                 WHERE document_id = ? AND page_number = ?",
                (key.document_id, key.page_number),
            )
            .map_err(db_err)?;
        Ok(row.map(|(document_id, page_number, ocr_text)| PageRecord {
            document_id,
            page_number,
            ocr_text: ocr_text.unwrap_or_default(),
        }))
    }

    fn pages_for_document(&mut self, document_id: i64) -> Result<Vec<PageRecord>, PageScanError> {
        self.conn
            .exec_map(
                "SELECT document_id, page_number, ocr_text
                 FROM pages
                 WHERE document_id = ?
                 ORDER BY page_number ASC",
                (document_id,),
                |(document_id, page_number, ocr_text): (i64, u32, Option<String>)| PageRecord {
                    document_id,
                    page_number,
                    ocr_text: ocr_text.unwrap_or_default(),
                },
            )
            .map_err(db_err)
    }

    fn page_count(&mut self, document_id: i64) -> Result<u64, PageScanError> {
        let count: Option<u64> = self
            .conn
            .exec_first(
                "SELECT COUNT(*) FROM pages WHERE document_id = ?",
                (document_id,),
            )
            .map_err(db_err)?;
        Ok(count.unwrap_or(0))
    }
}
