// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for operators running ingestion.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Nothing is retried automatically; `retriable` only tells the operator
// whether re-running the same command could succeed without changes.

use crate::error::{PageScanError, StageFailure};

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or engine hiccup; re-running may succeed.
    Transient,
    /// Operator must fix something (settings, paths, missing tools).
    ActionRequired,
    /// Re-running cannot help: the input itself is unusable.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    /// Whether re-running unchanged could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Explain a failed pipeline stage, prefixing the stage and page.
pub fn humanize_failure(failure: &StageFailure) -> HumanError {
    let mut human = humanize_error(&failure.source);
    human.message = format!(
        "[{} / {}] {}",
        failure.stage, failure.key, human.message
    );
    human
}

/// Convert a `PageScanError` into a `HumanError`.
pub fn humanize_error(err: &PageScanError) -> HumanError {
    match err {
        PageScanError::Config(detail) => HumanError {
            message: "The database settings are incomplete.".into(),
            suggestion: format!(
                "Set DB_HOST, DB_USERNAME, DB_PASSWORD and DB_NAME in the environment or a .env file. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageScanError::InvalidKey(detail) => HumanError {
            message: "The document or page number is not valid.".into(),
            suggestion: format!("Document ids and page numbers start at 1. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageScanError::Unsupported(detail) => HumanError {
            message: "This build of pagescan doesn't include that feature.".into(),
            suggestion: format!("Rebuild with the named feature enabled. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageScanError::NotFound(path) => HumanError {
            message: "The page image couldn't be found.".into(),
            suggestion: format!(
                "Check the path is correct and the file hasn't been moved: {}",
                path.display()
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageScanError::Decode(_) => HumanError {
            message: "The page image couldn't be read.".into(),
            suggestion: "The file may be damaged or in an unsupported format. Try re-exporting it as PNG or JPEG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PageScanError::Extraction(detail) => humanize_extraction_error(detail),

        PageScanError::Connection(detail) => {
            let lower = detail.to_ascii_lowercase();
            if lower.contains("access denied") || lower.contains("authentication") {
                HumanError {
                    message: "The database rejected the login.".into(),
                    suggestion: "Check DB_USERNAME and DB_PASSWORD.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "The database couldn't be reached.".into(),
                    suggestion: format!("Check DB_HOST and that the database server is running. ({detail})"),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PageScanError::Constraint(_) => HumanError {
            message: "The page couldn't be saved because its document doesn't exist.".into(),
            suggestion: "Register the document first, or check the document id.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageScanError::Database(detail) => HumanError {
            message: "The database reported an error.".into(),
            suggestion: format!("Check that the pages table exists and has the expected columns. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        PageScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Permission denied while reading or writing a file.".into(),
                    suggestion: "Check the file permissions.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "A file operation failed.".into(),
                    suggestion: format!("Try again. ({io_err})"),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PageScanError::Serialization(_) => HumanError {
            message: "The report couldn't be written.".into(),
            suggestion: "This is a bug; please report it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_extraction_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("not installed") || lower.contains("model not found") {
        HumanError {
            message: "The text recognition engine isn't available.".into(),
            suggestion: format!("Install the OCR engine or its models, then try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "Text recognition failed on this page.".into(),
            suggestion: format!("Try again; if it keeps failing, re-scan the page. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
