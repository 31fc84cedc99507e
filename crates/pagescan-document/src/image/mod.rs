// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding and OCR normalization.

pub mod normalizer;

pub use self::normalizer::{NormalizedImage, normalize};
