use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::debug;

/// A named target size for one banner variant, e.g. `300x250`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeSpec {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

impl SizeSpec {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
        }
    }
}

/// One PNG-encoded output of [`resize`]
#[derive(Debug, Clone)]
pub struct ResizedVariant {
    pub label: String,
    pub png: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("no image sizes configured")]
    NoSizes,
    #[error("cannot resize {label} to a zero dimension")]
    ZeroDimension { label: String },
    #[error("failed to encode {label} as PNG")]
    Encode {
        label: String,
        #[source]
        source: image::ImageError,
    },
}

impl ResizeError {
    /// The size label that failed, if the failure belongs to one
    pub fn label(&self) -> Option<&str> {
        match self {
            ResizeError::NoSizes => None,
            ResizeError::ZeroDimension { label } | ResizeError::Encode { label, .. } => Some(label),
        }
    }
}

/// Decode uploaded bytes, guessing the format from the content rather than the filename
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Resize `source` to every size in `sizes`, in order.
///
/// Each variant is an exact-dimension Lanczos3 resample re-encoded as PNG.
/// The first failing size aborts the whole batch, so callers never see a
/// partial set.
pub fn resize(source: &DynamicImage, sizes: &[SizeSpec]) -> Result<Vec<ResizedVariant>, ResizeError> {
    if sizes.is_empty() {
        return Err(ResizeError::NoSizes);
    }

    sizes.iter().map(|size| resize_one(source, size)).collect()
}

fn resize_one(source: &DynamicImage, size: &SizeSpec) -> Result<ResizedVariant, ResizeError> {
    if size.width == 0 || size.height == 0 {
        return Err(ResizeError::ZeroDimension {
            label: size.label.clone(),
        });
    }

    debug!(
        "Resizing {}x{} source to {} ({}x{})",
        source.width(),
        source.height(),
        size.label,
        size.width,
        size.height
    );

    let resized = source.resize_exact(size.width, size.height, FilterType::Lanczos3);

    let mut png = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|source| ResizeError::Encode {
            label: size.label.clone(),
            source,
        })?;

    Ok(ResizedVariant {
        label: size.label.clone(),
        png,
    })
}
