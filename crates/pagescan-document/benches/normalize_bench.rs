// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page normalization in the pagescan-document crate.
// The Lanczos upscale dominates; the binarization pass is a single linear scan.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use pagescan_document::normalize;

/// Normalize a 400x300 synthetic RGB page: off-white background with
/// horizontal dark "text lines" every 12 pixels.
fn bench_normalize(c: &mut Criterion) {
    let (width, height) = (400u32, 300u32);
    let img = RgbImage::from_fn(width, height, |x, y| {
        if y % 12 < 3 && x > 20 && x < width - 20 {
            Rgb([25, 25, 25])
        } else {
            Rgb([240, 236, 228])
        }
    });
    let dynamic = DynamicImage::ImageRgb8(img);

    c.bench_function("normalize (400x300 rgb)", |b| {
        b.iter(|| {
            let normalized = normalize(black_box(&dynamic)).expect("normalize");
            black_box(normalized);
        });
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
