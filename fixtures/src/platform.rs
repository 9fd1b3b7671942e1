//! In-memory stand-in for the social platform's OAuth 1.0a, media, and status endpoints.
//!
//! Signatures are not verified. Every request must still carry an `OAuth`
//! Authorization header, and tokens must have been issued by this fixture.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

pub const DEFAULT_SCREEN_NAME: &str = "fixture_user";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMedia {
    pub media_id: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPost {
    pub id: String,
    pub access_token: String,
    pub status: String,
    pub media_ids: Vec<String>,
}

struct PendingAuthorization {
    callback: String,
    verifier: String,
}

#[derive(Default)]
struct Ledger {
    next_id: u64,
    pending: HashMap<String, PendingAuthorization>,
    access_tokens: HashMap<String, String>,
    media: Vec<RecordedMedia>,
    posts: Vec<RecordedPost>,
    reject_uploads: bool,
}

impl Ledger {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared handle to the fixture. Clones see the same recorded state.
#[derive(Clone)]
pub struct FakePlatform {
    ledger: Arc<Mutex<Ledger>>,
    screen_name: String,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger::default())),
            screen_name: DEFAULT_SCREEN_NAME.to_string(),
        }
    }

    pub fn with_screen_name(mut self, screen_name: &str) -> Self {
        self.screen_name = screen_name.to_string();
        self
    }

    /// Make every media upload fail with a 500
    pub fn reject_uploads(&self, reject: bool) {
        self.ledger().reject_uploads = reject;
    }

    pub fn media(&self) -> Vec<RecordedMedia> {
        self.ledger().media.clone()
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.ledger().posts.clone()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // SAFETY: We are in fixtures so a panic is fine
        self.ledger.lock().expect("fixture ledger poisoned")
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/oauth/request_token", post(request_token))
            .route("/oauth/authorize", get(authorize))
            .route("/oauth/access_token", post(access_token))
            .route("/1.1/media/upload.json", post(upload_media))
            .route("/1.1/statuses/update.json", post(update_status))
            .with_state(self.clone())
    }

    /// Serve on an ephemeral localhost port in the background
    pub async fn spawn(&self) -> anyhow::Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("Platform fixture stopped: {}", e);
            }
        });

        info!("Platform fixture listening on {}", addr);
        Ok(addr)
    }
}

/// Parse `OAuth k="v", ...` into its decoded parameters
pub fn parse_oauth_header(value: &str) -> Option<HashMap<String, String>> {
    let params = value.strip_prefix("OAuth ")?;

    params
        .split(',')
        .map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            let value = value.trim_matches('"');
            Some((
                urlencoding::decode(key).ok()?.into_owned(),
                urlencoding::decode(value).ok()?.into_owned(),
            ))
        })
        .collect()
}

fn oauth_params(headers: &HeaderMap) -> Result<HashMap<String, String>, Response> {
    let params = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(parse_oauth_header)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Missing OAuth header"))?;

    for required in ["oauth_consumer_key", "oauth_nonce", "oauth_signature"] {
        if !params.contains_key(required) {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                &format!("Missing {required}"),
            ));
        }
    }

    Ok(params)
}

/// The access token named in the header, if this fixture issued it
fn authorized_token(platform: &FakePlatform, headers: &HeaderMap) -> Result<String, Response> {
    let params = oauth_params(headers)?;
    let token = params
        .get("oauth_token")
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Missing oauth_token"))?;

    if !platform.ledger().access_tokens.contains_key(token) {
        return Err(error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token"));
    }

    Ok(token.clone())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "errors": [{ "code": status.as_u16(), "message": message }] })),
    )
        .into_response()
}

async fn request_token(State(platform): State<FakePlatform>, headers: HeaderMap) -> Response {
    let params = match oauth_params(&headers) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(callback) = params.get("oauth_callback") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing oauth_callback");
    };

    let mut ledger = platform.ledger();
    let id = ledger.next_id();
    let token = format!("request-token-{id}");
    ledger.pending.insert(
        token.clone(),
        PendingAuthorization {
            callback: callback.clone(),
            verifier: format!("verifier-{id}"),
        },
    );

    info!("Platform: issued request token {token}");
    let secret = format!("request-secret-{id}");
    // SAFETY: We are in fixtures so a panic is fine
    serde_urlencoded::to_string([
        ("oauth_token", token.as_str()),
        ("oauth_token_secret", secret.as_str()),
        ("oauth_callback_confirmed", "true"),
    ])
    .unwrap()
    .into_response()
}

#[derive(Deserialize)]
struct AuthorizeQuery {
    oauth_token: String,
}

/// Auto-approves and bounces the browser back to the registered callback
async fn authorize(
    State(platform): State<FakePlatform>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let ledger = platform.ledger();
    let Some(pending) = ledger.pending.get(&query.oauth_token) else {
        return error_response(StatusCode::BAD_REQUEST, "Unknown request token");
    };

    // SAFETY: We are in fixtures so a panic is fine
    let query_string = serde_urlencoded::to_string([
        ("oauth_token", query.oauth_token.as_str()),
        ("oauth_verifier", pending.verifier.as_str()),
    ])
    .unwrap();
    let redirect_url = format!("{}?{query_string}", pending.callback);

    info!("Platform: redirecting to {redirect_url}");
    Redirect::to(&redirect_url).into_response()
}

async fn access_token(State(platform): State<FakePlatform>, headers: HeaderMap) -> Response {
    let params = match oauth_params(&headers) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let (Some(token), Some(verifier)) = (params.get("oauth_token"), params.get("oauth_verifier"))
    else {
        return error_response(StatusCode::UNAUTHORIZED, "Missing token or verifier");
    };

    let mut ledger = platform.ledger();
    match ledger.pending.get(token) {
        Some(pending) if &pending.verifier == verifier => {}
        _ => return error_response(StatusCode::UNAUTHORIZED, "Invalid request token or verifier"),
    }
    ledger.pending.remove(token);

    let id = ledger.next_id();
    let access_token = format!("access-token-{id}");
    ledger
        .access_tokens
        .insert(access_token.clone(), platform.screen_name.clone());

    info!("Platform: issued access token {access_token}");
    let secret = format!("access-secret-{id}");
    let user_id = id.to_string();
    // SAFETY: We are in fixtures so a panic is fine
    serde_urlencoded::to_string([
        ("oauth_token", access_token.as_str()),
        ("oauth_token_secret", secret.as_str()),
        ("user_id", user_id.as_str()),
        ("screen_name", platform.screen_name.as_str()),
    ])
    .unwrap()
    .into_response()
}

async fn upload_media(
    State(platform): State<FakePlatform>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = authorized_token(&platform, &headers) {
        return response;
    }
    if platform.ledger().reject_uploads {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Upload rejected");
    }

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return error_response(StatusCode::BAD_REQUEST, "Missing media field"),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        };
        if field.name() != Some("media") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        };

        let mut ledger = platform.ledger();
        let media_id = (1_000 + ledger.next_id()).to_string();
        let size = bytes.len();
        ledger.media.push(RecordedMedia {
            media_id: media_id.clone(),
            file_name,
            content_type: content_type.clone(),
            bytes,
        });

        info!("Platform: stored media {media_id} ({size} bytes)");
        return Json(json!({
            "media_id": media_id.parse::<u64>().unwrap_or_default(),
            "media_id_string": media_id,
            "size": size,
            "image": { "image_type": content_type }
        }))
        .into_response();
    }
}

#[derive(Deserialize)]
struct StatusUpdate {
    status: String,
    #[serde(default)]
    media_ids: Option<String>,
}

async fn update_status(
    State(platform): State<FakePlatform>,
    headers: HeaderMap,
    Form(update): Form<StatusUpdate>,
) -> Response {
    let access_token = match authorized_token(&platform, &headers) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let media_ids: Vec<String> = update
        .media_ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let mut ledger = platform.ledger();
    if let Some(unknown) = media_ids
        .iter()
        .find(|id| !ledger.media.iter().any(|m| &m.media_id == *id))
    {
        return error_response(StatusCode::BAD_REQUEST, &format!("Unknown media id {unknown}"));
    }
    if media_ids.len() > 4 {
        return error_response(StatusCode::BAD_REQUEST, "Too many media ids");
    }

    let id = (9_000 + ledger.next_id()).to_string();
    ledger.posts.push(RecordedPost {
        id: id.clone(),
        access_token,
        status: update.status.clone(),
        media_ids,
    });

    info!("Platform: created post {id}");
    Json(json!({ "id_str": id, "text": update.status })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oauth_header_decodes_values() {
        let params = parse_oauth_header(
            r#"OAuth oauth_callback="http%3A%2F%2Flocalhost%3A3000%2Fcallback", oauth_nonce="abc""#,
        )
        .unwrap();

        assert_eq!(params["oauth_callback"], "http://localhost:3000/callback");
        assert_eq!(params["oauth_nonce"], "abc");
    }

    #[test]
    fn test_parse_oauth_header_rejects_other_schemes() {
        assert!(parse_oauth_header("Bearer abc").is_none());
    }
}
