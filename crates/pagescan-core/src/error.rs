// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagescan.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{PageKey, Stage};

/// Top-level error type for all Pagescan operations.
#[derive(Debug, Error)]
pub enum PageScanError {
    // -- Configuration --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid page key: {0}")]
    InvalidKey(String),

    /// A backend or engine that this build was compiled without.
    #[error("not available in this build: {0}")]
    Unsupported(String),

    // -- Source image --
    #[error("source image not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("image decode failed: {0}")]
    Decode(String),

    // -- Recognition --
    #[error("text extraction failed: {0}")]
    Extraction(String),

    // -- Storage / persistence --
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store constraint violated: {0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PageScanError {
    /// Stable taxonomy label, used in logs and machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::InvalidKey(_) => "InvalidKey",
            Self::Unsupported(_) => "UnsupportedError",
            Self::NotFound(_) => "NotFoundError",
            Self::Decode(_) => "DecodeError",
            Self::Extraction(_) => "ExtractionError",
            Self::Connection(_) => "ConnectionError",
            Self::Constraint(_) => "ConstraintError",
            Self::Database(_) => "DatabaseError",
            Self::Io(_) => "IoError",
            Self::Serialization(_) => "SerializationError",
        }
    }

    /// Process exit status for this failure. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::NotFound(_) => 3,
            Self::Decode(_) => 4,
            Self::Extraction(_) => 5,
            Self::Connection(_) => 6,
            Self::Constraint(_) => 7,
            Self::InvalidKey(_) => 8,
            Self::Unsupported(_) => 9,
            Self::Database(_) | Self::Io(_) | Self::Serialization(_) => 1,
        }
    }
}

/// A pipeline failure annotated with the stage that failed and the page it
/// was working on.
#[derive(Debug, Error)]
#[error("{stage} stage failed for {key}: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    pub key: PageKey,
    #[source]
    pub source: PageScanError,
}

impl StageFailure {
    pub fn new(stage: Stage, key: PageKey, source: PageScanError) -> Self {
        Self { stage, key, source }
    }

    pub fn exit_code(&self) -> i32 {
        self.source.exit_code()
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PageScanError>;
