use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use tracing::error;

use crate::{cookies::CookieJar, state::AppState};

const FLASH_COOKIE_NAME: &str = "adsizer_flash";

/// One-shot notices shown on the next page render
pub struct Flash {
    jar: CookieJar,
}

#[async_trait]
impl FromRequestParts<AppState> for Flash {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Flash {
            jar: CookieJar::from_request_parts(parts, state).await?,
        })
    }
}

impl Flash {
    /// Queue a message for the next page. Failures are logged, never surfaced.
    pub fn push(&self, message: impl Into<String>) {
        let mut messages: Vec<String> = self.jar.get_json(FLASH_COOKIE_NAME).unwrap_or_default();
        messages.push(message.into());

        if let Err(err) = self.jar.set_json(FLASH_COOKIE_NAME, &messages) {
            error!(error = ?err, "Failed to store flash message");
        }
    }

    /// Drain every pending message
    pub fn take(&self) -> Vec<String> {
        let messages: Vec<String> = self.jar.get_json(FLASH_COOKIE_NAME).unwrap_or_default();
        if !messages.is_empty() {
            self.jar.remove(FLASH_COOKIE_NAME);
        }
        messages
    }
}
