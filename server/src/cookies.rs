use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse as _, Response},
};
use color_eyre::eyre::WrapErr as _;
use serde::{de::DeserializeOwned, Serialize};
use tower_cookies::cookie::SameSite;
use tracing::{error, warn};

pub use tower_cookies::Cookie;

use crate::state::AppState;

/// Private (encrypted and authenticated) cookie access for one request
pub struct CookieJar {
    cookies: tower_cookies::Cookies,
    state: AppState,
}

#[async_trait]
impl FromRequestParts<AppState> for CookieJar {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = match tower_cookies::Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err(_) => {
                error!("Failed to extract cookies from request, is CookieManagerLayer installed?");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        Ok(CookieJar {
            cookies,
            state: state.clone(),
        })
    }
}

impl CookieJar {
    fn base_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.state.config.secure_cookies());
        cookie
    }

    /// Store `value` as JSON in a browser-session cookie
    pub fn set_json<T: Serialize>(&self, name: &'static str, value: &T) -> color_eyre::Result<()> {
        let encoded = serde_json::to_string(value)
            .wrap_err_with(|| format!("Failed to serialize cookie {name}"))?;

        let private = self.cookies.private(&self.state.cookie_key);
        private.add(self.base_cookie(name, encoded));
        Ok(())
    }

    /// Read a JSON cookie. Missing, tampered, or malformed cookies read as `None`.
    pub fn get_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let private = self.cookies.private(&self.state.cookie_key);
        let cookie = private.get(name)?;

        match serde_json::from_str(cookie.value()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed {} cookie: {}", name, e);
                None
            }
        }
    }

    /// Removes the named cookie from the browser
    pub fn remove(&self, name: &'static str) {
        let private = self.cookies.private(&self.state.cookie_key);
        private.remove(self.base_cookie(name, String::new()));
    }
}
