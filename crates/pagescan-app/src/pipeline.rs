// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ingestion pipeline — Locate → Normalize → Extract → Persist for one page.
//
// Every stage is fatal on error and nothing is retried. Persist is last, so a
// failure anywhere upstream leaves the store untouched.

use std::path::{Path, PathBuf};

use pagescan_core::error::{PageScanError, Result, StageFailure};
use pagescan_core::types::{PageKey, PipelineState, Stage};
use pagescan_document::{TextExtractor, load_image, normalize};
use pagescan_store::PageStore;
use serde::Serialize;
use tracing::{error, info, instrument};

/// Characters of recognised text echoed back in a report.
const SNIPPET_CHARS: usize = 200;

/// One page to ingest.
#[derive(Debug, Clone)]
pub struct PageJob {
    pub key: PageKey,
    pub image_path: PathBuf,
}

impl PageJob {
    pub fn new(key: PageKey, image_path: impl Into<PathBuf>) -> Self {
        Self {
            key,
            image_path: image_path.into(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub document_id: i64,
    pub page_number: u32,
    pub image_path: PathBuf,
    pub engine: String,
    pub store: String,
    pub source_width: u32,
    pub source_height: u32,
    pub normalized_width: u32,
    pub normalized_height: u32,
    pub text_chars: usize,
    pub snippet: String,
}

/// Runs pages through normalization, OCR, and persistence.
///
/// Owns its extractor and store; nothing is global, so tests can pass stubs.
pub struct Pipeline<E, S> {
    extractor: E,
    store: S,
    state: Option<PipelineState>,
}

impl<E: TextExtractor, S: PageStore> Pipeline<E, S> {
    pub fn new(extractor: E, store: S) -> Self {
        Self {
            extractor,
            store,
            state: None,
        }
    }

    /// State reached by the most recent run, `None` before the first.
    pub fn state(&self) -> Option<PipelineState> {
        self.state
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (E, S) {
        (self.extractor, self.store)
    }

    /// Ingest one page. Each call starts fresh from `Locate`.
    #[instrument(skip_all, fields(document_id = job.key.document_id, page_number = job.key.page_number, path = %job.image_path.display()))]
    pub fn run(&mut self, job: &PageJob) -> std::result::Result<PipelineReport, StageFailure> {
        self.state = Some(PipelineState::start());
        let key = job.key;

        let path = self.step(Stage::Locate, key, locate(&job.image_path))?;

        let (source, normalized) = self.step(
            Stage::Normalize,
            key,
            load_image(&path).and_then(|img| normalize(&img).map(|n| (img, n))),
        )?;

        let extracted = self.extractor.extract_text(&normalized);
        let text = self.step(Stage::Extract, key, extracted)?;
        info!(
            engine = self.extractor.engine_name(),
            text_chars = text.chars().count(),
            "text extracted"
        );

        let persisted = self.store.upsert_page(key, &text);
        self.step(Stage::Persist, key, persisted)?;

        Ok(PipelineReport {
            document_id: key.document_id,
            page_number: key.page_number,
            image_path: path,
            engine: self.extractor.engine_name().to_string(),
            store: self.store.backend_name().to_string(),
            source_width: source.width(),
            source_height: source.height(),
            normalized_width: normalized.width(),
            normalized_height: normalized.height(),
            text_chars: text.chars().count(),
            snippet: text.chars().take(SNIPPET_CHARS).collect(),
        })
    }

    /// Settle one stage: advance the state on success, or stop with a
    /// failure naming the stage and page.
    fn step<T>(
        &mut self,
        stage: Stage,
        key: PageKey,
        result: Result<T>,
    ) -> std::result::Result<T, StageFailure> {
        debug_assert_eq!(self.state, Some(PipelineState::Running(stage)));
        match result {
            Ok(value) => {
                info!(%stage, "stage complete");
                self.state = self.state.map(PipelineState::advance);
                Ok(value)
            }
            Err(err) => {
                self.state = self.state.map(PipelineState::fail);
                error!(%stage, %key, kind = err.kind(), error = %err, "stage failed");
                Err(StageFailure::new(stage, key, err))
            }
        }
    }
}

/// Resolve the source image path. Relative paths are taken from the current
/// directory.
fn locate(path: &Path) -> Result<PathBuf> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    if !resolved.is_file() {
        return Err(PageScanError::NotFound(resolved));
    }
    Ok(resolved)
}
