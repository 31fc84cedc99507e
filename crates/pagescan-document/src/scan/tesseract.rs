// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract OCR via its command-line interface.
//
// The normalized page is written to a temporary PNG and recognised with
// `tesseract <file> stdout`. The binary must be installed separately
// (e.g. `apt install tesseract-ocr`); its absence surfaces as an extraction
// error rather than an empty result.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use pagescan_core::error::{PageScanError, Result};
use tracing::{debug, info, instrument, warn};

use super::TextExtractor;
use crate::image::normalizer::NormalizedImage;

pub const ENGINE_NAME: &str = "tesseract";

const DEFAULT_BINARY: &str = "tesseract";

/// Runs the `tesseract` executable once per page.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
        }
    }

    /// Use a specific executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Engine version string, or an extraction error if it cannot be run.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|err| self.spawn_error(err))?;
        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn spawn_error(&self, err: std::io::Error) -> PageScanError {
        if err.kind() == ErrorKind::NotFound {
            PageScanError::Extraction(format!(
                "{} is not installed or not on PATH",
                self.binary.display()
            ))
        } else {
            PageScanError::Extraction(format!(
                "failed to run {}: {}",
                self.binary.display(),
                err
            ))
        }
    }
}

impl TextExtractor for TesseractCli {
    fn engine_name(&self) -> &str {
        ENGINE_NAME
    }

    #[instrument(skip_all, fields(engine = ENGINE_NAME, width = image.width(), height = image.height()))]
    fn extract_text(&self, image: &NormalizedImage) -> Result<String> {
        let page = tempfile::Builder::new()
            .prefix("pagescan-")
            .suffix(".png")
            .tempfile()?;
        image.save_png(page.path())?;
        debug!(path = %page.path().display(), "Normalized page written for OCR");

        let output = Command::new(&self.binary)
            .arg(page.path())
            .arg("stdout")
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "tesseract exited with failure");
            return Err(PageScanError::Extraction(format!(
                "tesseract failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = clean_output(&String::from_utf8_lossy(&output.stdout));
        info!(
            line_count = text.lines().count(),
            char_count = text.chars().count(),
            "OCR recognition complete"
        );
        Ok(text)
    }
}

/// Drop the trailing page separator and whitespace tesseract appends.
fn clean_output(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c == '\u{c}' || c.is_whitespace())
        .to_string()
}
