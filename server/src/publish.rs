//! Upload-and-publish pipeline behind `POST /upload`.
//!
//! presence -> extension -> decode -> resize -> auth gate -> upload -> post.
//! Every step is a hard gate: the first failure ends the request.

use std::io::Write as _;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    oauth::AccessToken,
    platform::{MediaId, PlatformError, PostId, SocialPlatform},
    resize::{self, ResizeError, ResizedVariant, SizeSpec},
};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

const CAPTION_PREFIX: &str = "Automated image upload with multiple sizes: ";

/// The `image` field of the upload form
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub media_count: usize,
    pub post_id: PostId,
}

/// Why a publish attempt stopped. Display strings are shown to the user.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("No file selected.")]
    NoFileProvided,
    #[error("Unsupported file type.")]
    UnsupportedFileType,
    #[error("Error processing image: {0}")]
    ImageDecode(String),
    #[error("Error resizing image for {label}.")]
    ImageResize {
        label: String,
        #[source]
        source: ResizeError,
    },
    #[error("Please log in to publish images.")]
    NotAuthenticated,
    #[error("Error uploading the {label} image.")]
    MediaUpload {
        label: String,
        #[source]
        source: PlatformError,
    },
    #[error("Error posting images.")]
    PostCreation(#[source] PlatformError),
    #[error("Error processing image.")]
    Processing(#[source] tokio::task::JoinError),
}

/// True when the text after the last `.` is an allowed image extension
pub fn has_allowed_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, extension)) => {
            let extension = extension.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&extension.as_str())
        }
        None => false,
    }
}

/// Caption listing every size label, in configuration order
pub fn compose_caption(sizes: &[SizeSpec]) -> String {
    let labels = sizes
        .iter()
        .map(|size| size.label.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!("{CAPTION_PREFIX}{labels}")
}

/// Write a variant to a named temp file. The file is deleted when the
/// returned handle drops.
fn stage(variant: &ResizedVariant) -> std::io::Result<NamedTempFile> {
    let mut staged = tempfile::Builder::new()
        .prefix(&format!("adsizer-{}-", variant.label))
        .suffix(".png")
        .tempfile()?;
    staged.write_all(&variant.png)?;
    staged.flush()?;
    Ok(staged)
}

/// Decode and resample. CPU bound, so callers run it on the blocking pool.
fn decode_and_resize(
    upload: UploadedImage,
    sizes: Vec<SizeSpec>,
) -> Result<Vec<ResizedVariant>, PublishError> {
    let source = resize::decode(&upload.bytes).map_err(|e| {
        warn!("Failed to decode {}: {}", upload.filename, e);
        PublishError::ImageDecode(e.to_string())
    })?;

    resize::resize(&source, &sizes).map_err(|source| PublishError::ImageResize {
        label: source.label().unwrap_or("(no sizes configured)").to_string(),
        source,
    })
}

/// Stage every variant, keeping its label. Blocking file I/O.
fn stage_all(variants: Vec<ResizedVariant>) -> Result<Vec<(String, NamedTempFile)>, PublishError> {
    variants
        .into_iter()
        .map(|variant| {
            let staged = stage(&variant).map_err(|e| {
                error!("Failed to stage {} for upload: {}", variant.label, e);
                PublishError::MediaUpload {
                    label: variant.label.clone(),
                    source: PlatformError::Io {
                        path: std::env::temp_dir().display().to_string(),
                        source: e,
                    },
                }
            })?;
            Ok((variant.label, staged))
        })
        .collect()
}

#[tracing::instrument(
    skip_all,
    fields(filename = upload.as_ref().map(|u| u.filename.as_str()).unwrap_or_default())
)]
pub async fn publish(
    upload: Option<UploadedImage>,
    sizes: &[SizeSpec],
    credentials: Option<&AccessToken>,
    platform: &dyn SocialPlatform,
) -> Result<Published, PublishError> {
    let upload = upload
        .filter(|upload| !upload.filename.is_empty())
        .ok_or(PublishError::NoFileProvided)?;

    if !has_allowed_extension(&upload.filename) {
        return Err(PublishError::UnsupportedFileType);
    }

    let owned_sizes = sizes.to_vec();
    let variants = tokio::task::spawn_blocking(move || decode_and_resize(upload, owned_sizes))
        .await
        .map_err(PublishError::Processing)??;

    let Some(credentials) = credentials else {
        return Err(PublishError::NotAuthenticated);
    };

    let staged = tokio::task::spawn_blocking(move || stage_all(variants))
        .await
        .map_err(PublishError::Processing)??;

    let mut media_ids: Vec<MediaId> = Vec::with_capacity(staged.len());
    for (label, file) in &staged {
        let media_id = platform
            .upload_media(credentials, file.path())
            .await
            .map_err(|source| PublishError::MediaUpload {
                label: label.clone(),
                source,
            })?;

        info!("Uploaded {} as media {}", label, media_id.0);
        media_ids.push(media_id);
    }

    let caption = compose_caption(sizes);
    let post_id = platform
        .create_post(credentials, &caption, &media_ids)
        .await
        .map_err(PublishError::PostCreation)?;

    Ok(Published {
        media_count: media_ids.len(),
        post_id,
    })
}
