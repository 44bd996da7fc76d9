//! JPEG preparation of captured photos for upload.
//!
//! [`ImagePreparer`] re-encodes an image at decreasing JPEG quality until
//! the encoded size drops below a byte ceiling. The search is linear with
//! a fixed step, so the number of encodes is bounded by
//! [`PrepareOptions::max_iterations`].
//!
//! The ceiling is a best-effort target: when even the quality floor
//! produces an oversized blob, that blob is returned with
//! [`PreparedImage::within_budget`] set to `false` instead of failing.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, RgbImage};

/// Default upload ceiling: 1 MiB.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;
/// Quality of the first encode attempt.
pub const DEFAULT_START_QUALITY: u8 = 100;
/// Quality decrement between attempts.
pub const DEFAULT_QUALITY_STEP: u8 = 5;
/// Lowest quality the preparer will encode at.
pub const DEFAULT_MIN_QUALITY: u8 = 5;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from image preparation. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    /// The source could not be decoded (corrupt stream, unknown format).
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The source file could not be read.
    #[error("Failed to read image source: {0}")]
    Io(#[from] std::io::Error),

    /// The JPEG encoder rejected the bitmap.
    #[error("Failed to encode JPEG at quality {quality}: {source}")]
    Encode {
        quality: u8,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid preparation options: {0}")]
    InvalidOptions(String),

    /// The worker running the preparation stopped before finishing.
    #[error("Image preparation did not complete: {0}")]
    Interrupted(String),
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tunable parameters for the quality search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    /// The encoded blob must be strictly smaller than this.
    pub max_bytes: usize,
    pub start_quality: u8,
    pub quality_step: u8,
    pub min_quality: u8,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            start_quality: DEFAULT_START_QUALITY,
            quality_step: DEFAULT_QUALITY_STEP,
            min_quality: DEFAULT_MIN_QUALITY,
        }
    }
}

impl PrepareOptions {
    /// Default options with a different byte ceiling.
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), PrepareError> {
        if self.max_bytes == 0 {
            return Err(PrepareError::InvalidOptions(
                "max_bytes must be greater than zero".into(),
            ));
        }
        if self.quality_step == 0 {
            return Err(PrepareError::InvalidOptions(
                "quality_step must be greater than zero".into(),
            ));
        }
        if self.min_quality == 0 {
            return Err(PrepareError::InvalidOptions(
                "min_quality must be at least 1".into(),
            ));
        }
        if self.start_quality > 100 {
            return Err(PrepareError::InvalidOptions(format!(
                "start_quality must be at most 100, got {}",
                self.start_quality
            )));
        }
        if self.min_quality > self.start_quality {
            return Err(PrepareError::InvalidOptions(format!(
                "min_quality ({}) exceeds start_quality ({})",
                self.min_quality, self.start_quality
            )));
        }
        Ok(())
    }

    /// Upper bound on encode attempts: `(start - min) / step + 1`.
    pub fn max_iterations(&self) -> u32 {
        let span = u32::from(self.start_quality.saturating_sub(self.min_quality));
        span / u32::from(self.quality_step.max(1)) + 1
    }
}

// ---------------------------------------------------------------------------
// PreparedImage
// ---------------------------------------------------------------------------

/// An upload-ready JPEG blob plus how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    /// Quality of the final encode.
    pub quality: u8,
    /// Number of encodes performed.
    pub iterations: u32,
    /// `false` when the floor was reached without getting under the ceiling.
    pub within_budget: bool,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ImagePreparer
// ---------------------------------------------------------------------------

/// Shrinks images into JPEG blobs under a byte ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreparer {
    options: PrepareOptions,
}

impl ImagePreparer {
    pub fn new(options: PrepareOptions) -> Result<Self, PrepareError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Read, decode, and prepare an image file.
    pub fn prepare_file(&self, path: &Path) -> Result<PreparedImage, PrepareError> {
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Read image source");
        self.prepare_bytes(&bytes)
    }

    /// Decode an encoded image (format guessed from content) and prepare it.
    pub fn prepare_bytes(&self, source: &[u8]) -> Result<PreparedImage, PrepareError> {
        let image = image::load_from_memory(source).map_err(PrepareError::Decode)?;
        self.prepare(&image)
    }

    /// Run the quality search on a decoded bitmap.
    ///
    /// Stops as soon as an encode is below the ceiling, or when the next
    /// step would go below `min_quality`.
    pub fn prepare(&self, image: &DynamicImage) -> Result<PreparedImage, PrepareError> {
        let opts = &self.options;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut quality = opts.start_quality;
        let mut iterations = 0u32;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            encode_jpeg(&rgb, quality, &mut buf)?;
            iterations += 1;

            tracing::debug!(quality, size = buf.len(), iteration = iterations, "Encoded JPEG");

            if buf.len() < opts.max_bytes || quality <= opts.min_quality {
                break;
            }

            match quality.checked_sub(opts.quality_step) {
                Some(next) if next >= opts.min_quality => quality = next,
                _ => break,
            }
        }

        let within_budget = buf.len() < opts.max_bytes;
        if within_budget {
            tracing::info!(
                width,
                height,
                quality,
                iterations,
                size = buf.len(),
                "Prepared image for upload",
            );
        } else {
            tracing::warn!(
                width,
                height,
                quality,
                iterations,
                size = buf.len(),
                max_bytes = opts.max_bytes,
                "Image exceeds upload ceiling at minimum quality, using it anyway",
            );
        }

        Ok(PreparedImage {
            bytes: buf,
            quality,
            iterations,
            within_budget,
            width,
            height,
        })
    }
}

/// Encode an RGB bitmap as JPEG into `out`.
fn encode_jpeg(rgb: &RgbImage, quality: u8, out: &mut Vec<u8>) -> Result<(), PrepareError> {
    let mut encoder = JpegEncoder::new_with_quality(&mut *out, quality);
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|source| PrepareError::Encode { quality, source })
}
