// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR normalization — grayscale, 2x Lanczos upscale, fixed-threshold
// binarization. Operates on in-memory images using the `image` crate.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use pagescan_core::error::{PageScanError, Result};
use tracing::{debug, info, instrument};

/// Linear scale factor applied before recognition.
pub const UPSCALE_FACTOR: u32 = 2;

/// Pixels strictly brighter than this become white; everything else black.
pub const BINARIZE_THRESHOLD: u8 = 128;

/// Resampling filter used for the upscale step.
pub const UPSCALE_FILTER: FilterType = FilterType::Lanczos3;

/// A grayscale, upscaled, binarized page image ready for OCR.
///
/// Only [`normalize`] constructs one, so anything holding a `NormalizedImage`
/// is guaranteed to contain nothing but 0 and 255 intensities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    image: GrayImage,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw pixel bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Clone into a `DynamicImage` for engines that take one.
    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageLuma8(self.image.clone())
    }

    /// Encode as PNG (lossless, so the binarization survives).
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| PageScanError::Decode(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write as PNG to `path`.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image
            .save_with_format(path.as_ref(), ImageFormat::Png)
            .map_err(|err| {
                PageScanError::Decode(format!(
                    "failed to write {}: {}",
                    path.as_ref().display(),
                    err
                ))
            })
    }
}

// -- Decoding -----------------------------------------------------------------

/// Load and decode an image from a file path.
///
/// A missing file is reported as [`PageScanError::NotFound`]; anything the
/// codec rejects is [`PageScanError::Decode`].
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PageScanError::NotFound(path.to_path_buf()));
    }
    let img = image::open(path).map_err(|err| {
        PageScanError::Decode(format!("failed to open {}: {}", path.display(), err))
    })?;
    info!(width = img.width(), height = img.height(), "Image loaded");
    Ok(img)
}

/// Decode raw encoded bytes (JPEG, PNG, TIFF, ...).
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(data)
        .map_err(|err| PageScanError::Decode(format!("failed to decode image: {}", err)))?;
    debug!(
        width = img.width(),
        height = img.height(),
        "Image decoded from bytes"
    );
    Ok(img)
}

// -- Normalization ------------------------------------------------------------

/// Run the full normalization: grayscale, upscale to `(2w, 2h)`, binarize.
///
/// The input is borrowed and left untouched. Output is fully determined by
/// the input pixels.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn normalize(image: &DynamicImage) -> Result<NormalizedImage> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PageScanError::Decode(format!(
            "image has no pixels ({width}x{height})"
        )));
    }
    let (target_w, target_h) = match (
        width.checked_mul(UPSCALE_FACTOR),
        height.checked_mul(UPSCALE_FACTOR),
    ) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(PageScanError::Decode(format!(
                "image too large to upscale ({width}x{height})"
            )));
        }
    };

    let gray = to_grayscale(image);
    let upscaled = upscale(&gray, target_w, target_h);
    let binary = binarize(upscaled);

    info!(
        from_w = width,
        from_h = height,
        to_w = binary.width(),
        to_h = binary.height(),
        "Image normalized for OCR"
    );
    Ok(NormalizedImage { image: binary })
}

/// Single-channel luminance.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Resize to exactly `width` x `height` with the Lanczos3 filter.
pub fn upscale(gray: &GrayImage, width: u32, height: u32) -> GrayImage {
    debug!(
        from_w = gray.width(),
        from_h = gray.height(),
        width,
        height,
        "Upscaling"
    );
    image::imageops::resize(gray, width, height, UPSCALE_FILTER)
}

/// Map every pixel to 255 if it is above [`BINARIZE_THRESHOLD`], else 0.
pub fn binarize(mut gray: GrayImage) -> GrayImage {
    for pixel in gray.pixels_mut() {
        let Luma([val]) = *pixel;
        *pixel = Luma([if val > BINARIZE_THRESHOLD { 255 } else { 0 }]);
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, RgbaImage};

    /// A page-like test image: light background with a dark bar and a
    /// gradient strip so every threshold boundary gets exercised.
    fn sample_page(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            if y > height / 3 && y < height / 2 {
                Rgb([20, 20, 30])
            } else if y >= height / 2 {
                let v = ((x * 255) / width.max(1)) as u8;
                Rgb([v, v, v])
            } else {
                Rgb([235, 230, 220])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn output_is_twice_the_input_size() {
        for (w, h) in [(1, 1), (3, 7), (40, 25), (64, 64)] {
            let out = normalize(&sample_page(w, h)).unwrap();
            assert_eq!((out.width(), out.height()), (2 * w, 2 * h), "input {w}x{h}");
        }
    }

    #[test]
    fn output_is_strictly_binary() {
        let out = normalize(&sample_page(50, 40)).unwrap();
        assert!(out.as_bytes().iter().all(|&p| p == 0 || p == 255));
        // The gradient strip must produce both levels.
        assert!(out.as_bytes().contains(&0));
        assert!(out.as_bytes().contains(&255));
    }

    #[test]
    fn normalization_is_deterministic() {
        let img = sample_page(33, 21);
        let a = normalize(&img).unwrap();
        let b = normalize(&img).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.to_png_bytes().unwrap(), b.to_png_bytes().unwrap());
    }

    #[test]
    fn input_is_not_mutated() {
        let img = sample_page(20, 20);
        let before = img.clone();
        let _ = normalize(&img).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn threshold_boundary() {
        let mut gray = GrayImage::new(4, 1);
        for (x, v) in [127u8, 128, 129, 255].into_iter().enumerate() {
            gray.put_pixel(x as u32, 0, Luma([v]));
        }
        let out = binarize(gray);
        assert_eq!(out.as_raw(), &vec![0, 0, 255, 255]);
    }

    #[test]
    fn blank_white_page_stays_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            30,
            30,
            image::Rgba([255, 255, 255, 255]),
        ));
        let out = normalize(&img).unwrap();
        assert!(out.as_bytes().iter().all(|&p| p == 255));
    }

    #[test]
    fn empty_image_is_a_decode_error() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 5));
        let err = normalize(&img).unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = load_image("/nonexistent/scans/page-0001.jpg").unwrap_err();
        assert!(matches!(err, PageScanError::NotFound(_)));
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        let out = normalize(&sample_page(16, 12)).unwrap();
        let decoded = decode_image(&out.to_png_bytes().unwrap()).unwrap();
        assert_eq!(decoded.to_luma8().as_raw(), out.as_bytes());
    }
}
