use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    cookies::CookieJar,
    oauth::{AccessToken, RequestToken},
    state::AppState,
};

/// Cookie name for the per-browser credential store
pub const SESSION_COOKIE_NAME: &str = "adsizer_session";

/// Credentials held for one browser session.
///
/// Authenticated exactly when `access_token` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub request_token: Option<RequestToken>,
    #[serde(default)]
    pub access_token: Option<AccessToken>,
}

impl SessionData {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// The session as loaded from this request's cookie.
///
/// Changes to `data` only reach the browser through [`Session::save`].
pub struct Session {
    pub data: SessionData,
    jar: CookieJar,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state).await?;
        let data = jar.get_json(SESSION_COOKIE_NAME).unwrap_or_default();

        Ok(Session { data, jar })
    }
}

impl Session {
    pub fn save(&self) -> color_eyre::Result<()> {
        self.jar.set_json(SESSION_COOKIE_NAME, &self.data)
    }

    /// Forget every credential and drop the cookie
    pub fn clear(&mut self) {
        self.data = SessionData::default();
        self.jar.remove(SESSION_COOKIE_NAME);
        info!("Session cookie removed");
    }
}
