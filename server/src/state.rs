use std::collections::HashSet;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{bail, eyre, WrapErr as _};
use sha2::{Digest as _, Sha512};
use tower_cookies::Key;
use tracing::{info, warn};

use crate::{
    oauth::ConsumerCredentials,
    platform::{HttpPlatform, PlatformSettings, SocialPlatform},
    resize::SizeSpec,
};

pub const DEFAULT_IMAGE_SIZES: &str = "300x250,728x90,160x600,300x600";
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:3000/callback";
pub const DEFAULT_API_URL: &str = "https://api.twitter.com";
pub const DEFAULT_UPLOAD_URL: &str = "https://upload.twitter.com";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// The platform attaches at most this many images to one post
pub const MAX_MEDIA_PER_POST: usize = 4;

/// Process-wide settings, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub platform: PlatformSettings,
    pub session_secret: Option<String>,
    pub image_sizes: Vec<SizeSpec>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub protocol: String,
}

impl AppConfig {
    pub fn from_env() -> color_eyre::Result<Self> {
        let consumer = ConsumerCredentials {
            key: env::var("CONSUMER_KEY")
                .map_err(|_| eyre!("CONSUMER_KEY environment variable not set"))?,
            secret: env::var("CONSUMER_SECRET")
                .map_err(|_| eyre!("CONSUMER_SECRET environment variable not set"))?,
        };

        let timeout_secs: u64 = parse_env("HTTP_TIMEOUT_SECS", 30)?;

        let platform = PlatformSettings {
            consumer,
            callback_url: env::var("CALLBACK_URL")
                .unwrap_or_else(|_| DEFAULT_CALLBACK_URL.to_string()),
            api_url: env::var("PLATFORM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            upload_url: env::var("PLATFORM_UPLOAD_URL")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        let image_sizes = parse_image_sizes(
            &env::var("IMAGE_SIZES").unwrap_or_else(|_| DEFAULT_IMAGE_SIZES.to_string()),
        )
        .wrap_err("Invalid IMAGE_SIZES")?;

        println!("PLATFORM_API_URL: {}", platform.api_url);
        println!("PLATFORM_UPLOAD_URL: {}", platform.upload_url);
        println!("CALLBACK_URL: {}", platform.callback_url);

        Ok(Self {
            platform,
            session_secret: env::var("SESSION_SECRET").ok().filter(|s| !s.is_empty()),
            image_sizes,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 3000)?,
            protocol: env::var("PROTO").unwrap_or_else(|_| "http".to_string()),
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.protocol == "https"
    }

    /// Cookie key stretched from `SESSION_SECRET`, or a random one when unset
    pub fn cookie_key(&self) -> Key {
        match &self.session_secret {
            Some(secret) => Key::from(Sha512::digest(secret.as_bytes()).as_slice()),
            None => {
                warn!("SESSION_SECRET not set, sessions will not survive a restart");
                Key::generate()
            }
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> color_eyre::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| eyre!("Failed to parse {}={:?}: {}", name, value, e)),
        Err(_) => Ok(default),
    }
}

/// Parse `WIDTHxHEIGHT` or `label=WIDTHxHEIGHT` entries separated by commas
pub fn parse_image_sizes(raw: &str) -> color_eyre::Result<Vec<SizeSpec>> {
    let mut sizes = Vec::new();
    let mut seen = HashSet::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (label, dimensions) = match entry.split_once('=') {
            Some((label, dimensions)) => (label.trim().to_string(), dimensions.trim()),
            None => (entry.to_string(), entry),
        };

        if label.is_empty() || label.contains(['/', '\\']) {
            bail!("Invalid size label {:?}", label);
        }

        let (width, height) = dimensions
            .split_once(['x', 'X'])
            .ok_or_else(|| eyre!("Size {:?} is not WIDTHxHEIGHT", entry))?;
        let width: u32 = width
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid width in {entry:?}"))?;
        let height: u32 = height
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid height in {entry:?}"))?;

        if width == 0 || height == 0 {
            bail!("Size {:?} has a zero dimension", entry);
        }
        if !seen.insert(label.clone()) {
            bail!("Duplicate size label {:?}", label);
        }

        sizes.push(SizeSpec::new(label, width, height));
    }

    if sizes.is_empty() {
        bail!("At least one image size is required");
    }
    if sizes.len() > MAX_MEDIA_PER_POST {
        bail!(
            "{} sizes configured but a post holds at most {} images",
            sizes.len(),
            MAX_MEDIA_PER_POST
        );
    }

    Ok(sizes)
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub platform: Arc<dyn SocialPlatform>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn from_env() -> color_eyre::Result<Self> {
        let config = AppConfig::from_env()?;
        let platform = HttpPlatform::new(config.platform.clone())?;

        info!(
            sizes = ?config.image_sizes.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
            "Configuration loaded"
        );

        Ok(Self::new(config, Arc::new(platform)))
    }

    pub fn new(config: AppConfig, platform: Arc<dyn SocialPlatform>) -> Self {
        let cookie_key = config.cookie_key();

        Self {
            config: Arc::new(config),
            platform,
            cookie_key,
        }
    }
}
