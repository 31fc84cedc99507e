// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-document — Page image handling for the Pagescan ingestion pipeline.
//
// Provides image decoding and OCR normalization (grayscale, 2x Lanczos upscale,
// fixed-threshold binarization) and text extraction behind the `TextExtractor`
// capability, with a Tesseract CLI engine and an optional pure-Rust `ocrs` engine.

pub mod image;
pub mod scan;

// Re-export the primary items so callers can use `pagescan_document::normalize` etc.
pub use crate::image::normalizer::{NormalizedImage, decode_image, load_image, normalize};
pub use crate::scan::tesseract::TesseractCli;
pub use crate::scan::{TextExtractor, available_engines};

#[cfg(feature = "ocr")]
pub use crate::scan::ocr::OcrsEngine;
