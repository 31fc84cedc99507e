// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Pagescan.

use serde::{Deserialize, Serialize};

use crate::error::{PageScanError, Result};

/// Natural key of a stored page: `(document_id, page_number)`.
///
/// Both components are positive. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageKey {
    pub document_id: i64,
    pub page_number: u32,
}

impl PageKey {
    /// Build a key, rejecting non-positive components.
    pub fn new(document_id: i64, page_number: u32) -> Result<Self> {
        if document_id <= 0 {
            return Err(PageScanError::InvalidKey(format!(
                "document_id must be positive, got {document_id}"
            )));
        }
        if page_number == 0 {
            return Err(PageScanError::InvalidKey(
                "page_number is 1-based, got 0".into(),
            ));
        }
        Ok(Self {
            document_id,
            page_number,
        })
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "document {} page {}", self.document_id, self.page_number)
    }
}

/// The unit of persistence: recognised text for one page of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub document_id: i64,
    pub page_number: u32,
    /// Recognised content. Empty when nothing was found, never absent.
    pub ocr_text: String,
}

/// The four working stages of a single ingestion run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Resolve and check the source image path.
    Locate,
    /// Grayscale, upscale, and binarize the image.
    Normalize,
    /// Run OCR on the normalized image.
    Extract,
    /// Upsert the recognised text into the page store.
    Persist,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Locate, Stage::Normalize, Stage::Extract, Stage::Persist];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Locate => "locate",
            Stage::Normalize => "normalize",
            Stage::Extract => "extract",
            Stage::Persist => "persist",
        }
    }

    /// The stage that follows this one, or `None` after `Persist`.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Locate => Some(Stage::Normalize),
            Stage::Normalize => Some(Stage::Extract),
            Stage::Extract => Some(Stage::Persist),
            Stage::Persist => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pipeline run currently is. Transitions only move forward; a
/// failed run stays failed and must be restarted from `Locate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Running(Stage),
    Done,
    Failed(Stage),
}

impl PipelineState {
    pub fn start() -> Self {
        PipelineState::Running(Stage::Locate)
    }

    /// Advance after the current stage succeeded.
    pub fn advance(self) -> Self {
        match self {
            PipelineState::Running(stage) => match stage.next() {
                Some(next) => PipelineState::Running(next),
                None => PipelineState::Done,
            },
            terminal => terminal,
        }
    }

    /// Mark the current stage as failed.
    pub fn fail(self) -> Self {
        match self {
            PipelineState::Running(stage) => PipelineState::Failed(stage),
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PipelineState::Running(_))
    }
}
