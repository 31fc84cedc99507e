// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction — the OCR capability and its engines.

pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod ocr;

use pagescan_core::error::Result;

use crate::image::normalizer::NormalizedImage;

pub use tesseract::TesseractCli;

#[cfg(feature = "ocr")]
pub use ocr::OcrsEngine;

/// An OCR capability: normalized page image in, recognised text out.
///
/// Implementations make exactly one attempt per call. A page with no text is
/// `Ok(String::new())`; `Err` is reserved for an unavailable or crashing
/// engine.
pub trait TextExtractor {
    /// Short engine identifier for logs and reports (e.g. `"tesseract"`).
    fn engine_name(&self) -> &str;

    /// Recognise all text on the page as one string. Lines are separated by
    /// `\n` as the engine lays them out.
    fn extract_text(&self, image: &NormalizedImage) -> Result<String>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn engine_name(&self) -> &str {
        (**self).engine_name()
    }

    fn extract_text(&self, image: &NormalizedImage) -> Result<String> {
        (**self).extract_text(image)
    }
}

/// Names of the engines compiled into this build.
pub fn available_engines() -> Vec<&'static str> {
    let mut engines = vec![tesseract::ENGINE_NAME];
    #[cfg(feature = "ocr")]
    engines.push(ocr::ENGINE_NAME);
    engines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tesseract_is_always_available() {
        assert!(available_engines().contains(&"tesseract"));
    }
}
