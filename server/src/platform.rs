//! Client for the social platform's OAuth and REST endpoints.
//!
//! [`SocialPlatform`] is the seam the auth controller and the publish
//! pipeline talk to; [`HttpPlatform`] is the real implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::eyre::WrapErr as _;
use reqwest::{multipart, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::oauth::{
    signer::Signer,
    token::{
        AccessToken, AccessTokenResponse, ConsumerCredentials, RequestToken, RequestTokenResponse,
    },
};

/// Opaque id the platform returns for an uploaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId(pub String);

/// Opaque id of a created post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
    #[error("platform did not confirm the OAuth callback")]
    CallbackNotConfirmed,
    #[error("failed to read staged media {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// Obtain temporary credentials for a new login
    async fn request_token(&self) -> Result<RequestToken, PlatformError>;

    /// Where to send the browser so the user can approve the request token
    fn authorize_url(&self, request_token: &RequestToken) -> String;

    /// Trade an approved request token and its verifier for access credentials
    async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, PlatformError>;

    /// Upload one staged image file
    async fn upload_media(
        &self,
        credentials: &AccessToken,
        path: &Path,
    ) -> Result<MediaId, PlatformError>;

    /// Create a post with `text` and the given media attached, in order
    async fn create_post(
        &self,
        credentials: &AccessToken,
        text: &str,
        media: &[MediaId],
    ) -> Result<PostId, PlatformError>;
}

/// Endpoints and credentials for [`HttpPlatform`]
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    pub consumer: ConsumerCredentials,
    pub callback_url: String,
    pub api_url: String,
    pub upload_url: String,
    pub timeout: Duration,
}

pub struct HttpPlatform {
    client: Client,
    settings: PlatformSettings,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Deserialize)]
struct StatusUpdateResponse {
    id_str: String,
}

impl HttpPlatform {
    pub fn new(settings: PlatformSettings) -> color_eyre::Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(settings.timeout)
            .use_rustls_tls()
            .build()
            .wrap_err("Failed to build platform HTTP client")?;

        Ok(Self { client, settings })
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_url.trim_end_matches('/'), path)
    }

    fn upload(&self, path: &str) -> String {
        format!("{}{}", self.settings.upload_url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PlatformError> {
        let response = request.send().await.map_err(|source| PlatformError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(PlatformError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(response)
    }

    async fn read_form<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, PlatformError> {
        let body = response.text().await.map_err(|source| PlatformError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_urlencoded::from_str(&body).map_err(|e| PlatformError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn read_json<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, PlatformError> {
        let body = response.bytes().await.map_err(|source| PlatformError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| PlatformError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Form body of a status update, signed and sent as-is
#[derive(Debug, Serialize, oauth1_request::Request)]
struct StatusUpdate<'a> {
    media_ids: &'a str,
    status: &'a str,
}

#[async_trait]
impl SocialPlatform for HttpPlatform {
    async fn request_token(&self) -> Result<RequestToken, PlatformError> {
        let url = self.api("/oauth/request_token");
        let header = Signer::new(&self.settings.consumer)
            .callback(&self.settings.callback_url)
            .authorization_header("POST", &url, &());

        let response = self
            .send(&url, self.client.post(&url).header("Authorization", header))
            .await?;
        let parsed: RequestTokenResponse = Self::read_form(&url, response).await?;

        if !parsed.callback_confirmed() {
            return Err(PlatformError::CallbackNotConfirmed);
        }

        info!("Obtained request token");
        Ok(parsed.into())
    }

    fn authorize_url(&self, request_token: &RequestToken) -> String {
        format!(
            "{}?oauth_token={}",
            self.api("/oauth/authorize"),
            urlencoding::encode(&request_token.token)
        )
    }

    async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, PlatformError> {
        let url = self.api("/oauth/access_token");
        let header = Signer::new(&self.settings.consumer)
            .token(&request_token.token, &request_token.secret)
            .verifier(verifier)
            .authorization_header("POST", &url, &());

        let response = self
            .send(&url, self.client.post(&url).header("Authorization", header))
            .await?;
        let parsed: AccessTokenResponse = Self::read_form(&url, response).await?;

        info!(screen_name = ?parsed.screen_name, "Exchanged verifier for access token");
        Ok(parsed.into())
    }

    async fn upload_media(
        &self,
        credentials: &AccessToken,
        path: &Path,
    ) -> Result<MediaId, PlatformError> {
        let url = self.upload("/1.1/media/upload.json");

        let data = tokio::fs::read(path)
            .await
            .map_err(|source| PlatformError::Io {
                path: path.display().to_string(),
                source,
            })?;

        let mime_type = infer::get(&data)
            .map(|kind| kind.mime_type())
            .unwrap_or(mime::IMAGE_PNG.as_ref())
            .to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media.png".to_string());

        debug!(
            "Uploading {} ({} bytes, {}) to {}",
            file_name,
            data.len(),
            mime_type,
            url
        );

        let part = multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str(&mime_type)
            .map_err(|source| PlatformError::Http {
                url: url.clone(),
                source,
            })?;
        let form = multipart::Form::new().part("media", part);

        // Multipart bodies are not part of the signature
        let header = Signer::new(&self.settings.consumer)
            .token(&credentials.token, &credentials.secret)
            .authorization_header("POST", &url, &());

        let response = self
            .send(
                &url,
                self.client
                    .post(&url)
                    .header("Authorization", header)
                    .multipart(form),
            )
            .await?;
        let parsed: MediaUploadResponse = Self::read_json(&url, response).await?;

        Ok(MediaId(parsed.media_id_string))
    }

    async fn create_post(
        &self,
        credentials: &AccessToken,
        text: &str,
        media: &[MediaId],
    ) -> Result<PostId, PlatformError> {
        let url = self.api("/1.1/statuses/update.json");
        let media_ids = media
            .iter()
            .map(|id| id.0.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let update = StatusUpdate {
            media_ids: &media_ids,
            status: text,
        };

        let header = Signer::new(&self.settings.consumer)
            .token(&credentials.token, &credentials.secret)
            .authorization_header("POST", &url, &update);

        let response = self
            .send(
                &url,
                self.client
                    .post(&url)
                    .header("Authorization", header)
                    .form(&update),
            )
            .await?;
        let parsed: StatusUpdateResponse = Self::read_json(&url, response).await?;

        info!(post_id = %parsed.id_str, media = media.len(), "Created post");
        Ok(PostId(parsed.id_str))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Platform double that records calls without touching the network.
    #[derive(Default)]
    pub struct MockPlatform {
        pub calls: Mutex<Vec<RecordedCall>>,
        pub fail_request_token: bool,
        pub fail_access_token: bool,
        /// Zero-based index of the upload that should fail
        pub fail_upload_at: Option<usize>,
        pub fail_post: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedCall {
        RequestToken,
        AccessToken {
            request_token: String,
            verifier: String,
        },
        UploadMedia {
            path: PathBuf,
            /// Size of the staged file at upload time
            bytes: usize,
            is_png: bool,
        },
        CreatePost {
            text: String,
            media: Vec<String>,
        },
    }

    impl MockPlatform {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn uploads(&self) -> Vec<RecordedCall> {
            self.get_calls()
                .into_iter()
                .filter(|call| matches!(call, RecordedCall::UploadMedia { .. }))
                .collect()
        }

        fn rejected(url: &str) -> PlatformError {
            PlatformError::Status {
                url: url.to_string(),
                status: StatusCode::UNAUTHORIZED,
                body: "mock rejection".to_string(),
            }
        }
    }

    #[async_trait]
    impl SocialPlatform for MockPlatform {
        async fn request_token(&self) -> Result<RequestToken, PlatformError> {
            self.calls.lock().unwrap().push(RecordedCall::RequestToken);

            if self.fail_request_token {
                return Err(Self::rejected("mock://oauth/request_token"));
            }

            Ok(RequestToken {
                token: "request-token".to_string(),
                secret: "request-secret".to_string(),
            })
        }

        fn authorize_url(&self, request_token: &RequestToken) -> String {
            format!("mock://oauth/authorize?oauth_token={}", request_token.token)
        }

        async fn access_token(
            &self,
            request_token: &RequestToken,
            verifier: &str,
        ) -> Result<AccessToken, PlatformError> {
            self.calls.lock().unwrap().push(RecordedCall::AccessToken {
                request_token: request_token.token.clone(),
                verifier: verifier.to_string(),
            });

            if self.fail_access_token {
                return Err(Self::rejected("mock://oauth/access_token"));
            }

            Ok(AccessToken {
                token: "access-token".to_string(),
                secret: "access-secret".to_string(),
                screen_name: Some("banner_fan".to_string()),
            })
        }

        async fn upload_media(
            &self,
            _credentials: &AccessToken,
            path: &Path,
        ) -> Result<MediaId, PlatformError> {
            let data = std::fs::read(path).map_err(|source| PlatformError::Io {
                path: path.display().to_string(),
                source,
            })?;

            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(RecordedCall::UploadMedia {
                    path: path.to_path_buf(),
                    bytes: data.len(),
                    is_png: infer::get(&data).map(|kind| kind.mime_type()) == Some("image/png"),
                });
                calls
                    .iter()
                    .filter(|call| matches!(call, RecordedCall::UploadMedia { .. }))
                    .count()
                    - 1
            };

            if self.fail_upload_at == Some(index) {
                return Err(Self::rejected("mock://1.1/media/upload.json"));
            }

            Ok(MediaId(format!("media-{index}")))
        }

        async fn create_post(
            &self,
            _credentials: &AccessToken,
            text: &str,
            media: &[MediaId],
        ) -> Result<PostId, PlatformError> {
            self.calls.lock().unwrap().push(RecordedCall::CreatePost {
                text: text.to_string(),
                media: media.iter().map(|id| id.0.clone()).collect(),
            });

            if self.fail_post {
                return Err(Self::rejected("mock://1.1/statuses/update.json"));
            }

            Ok(PostId("post-1".to_string()))
        }
    }

    fn settings(api_url: &str) -> PlatformSettings {
        PlatformSettings {
            consumer: ConsumerCredentials {
                key: "key".to_string(),
                secret: "secret".to_string(),
            },
            callback_url: "http://localhost:3000/callback".to_string(),
            api_url: api_url.to_string(),
            upload_url: api_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_authorize_url_uses_api_base_and_encodes_token() {
        let platform = HttpPlatform::new(settings("https://api.example.test/")).unwrap();
        let url = platform.authorize_url(&RequestToken {
            token: "abc def".to_string(),
            secret: "s".to_string(),
        });

        assert_eq!(
            url,
            "https://api.example.test/oauth/authorize?oauth_token=abc%20def"
        );
    }

    #[test]
    fn test_endpoint_urls_join_without_double_slashes() {
        let platform = HttpPlatform::new(settings("http://127.0.0.1:9999/")).unwrap();

        assert_eq!(
            platform.api("/oauth/request_token"),
            "http://127.0.0.1:9999/oauth/request_token"
        );
        assert_eq!(
            platform.upload("/1.1/media/upload.json"),
            "http://127.0.0.1:9999/1.1/media/upload.json"
        );
    }

    #[tokio::test]
    async fn test_unreachable_platform_is_an_http_error() {
        // Port 9 (discard) is not expected to accept connections
        let platform = HttpPlatform::new(settings("http://127.0.0.1:9")).unwrap();

        let err = platform.request_token().await.unwrap_err();

        assert!(matches!(err, PlatformError::Http { .. }));
    }
}
