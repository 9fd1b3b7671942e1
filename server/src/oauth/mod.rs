//! OAuth 1.0a login flow against the social platform
//!
//! `Unauthenticated -> RequestTokenIssued -> Authenticated`, with the state
//! carried in [`SessionData`](crate::session::SessionData).

pub mod signer;
pub mod token;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    platform::{PlatformError, SocialPlatform},
    session::SessionData,
};

pub use token::{AccessToken, ConsumerCredentials, RequestToken};

/// Login failures. Display strings are shown to the user as flash messages.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Error! Failed to get request token.")]
    RequestToken(#[source] PlatformError),
    #[error("Error! Failed to get access token.")]
    AccessToken(#[source] PlatformError),
    #[error("Error! Failed to get access token.")]
    MissingVerifier,
    /// The platform redirected back with a query we could not parse
    #[error("Error! Failed to get access token.")]
    MalformedCallback,
    #[error("Missing request token.")]
    MissingRequestToken,
}

/// Start a login: fetch a request token, remember it in the session, and
/// return the URL the browser should be sent to.
///
/// On failure the session is left untouched.
#[tracing::instrument(skip_all, err)]
pub async fn begin_login(
    platform: &dyn SocialPlatform,
    session: &mut SessionData,
) -> Result<String, AuthError> {
    let request_token = platform
        .request_token()
        .await
        .map_err(AuthError::RequestToken)?;

    let redirect_url = platform.authorize_url(&request_token);
    session.request_token = Some(request_token);

    Ok(redirect_url)
}

/// Finish a login with the verifier the platform handed back.
///
/// Requires a request token from [`begin_login`]; without one the platform is
/// never contacted. On success the access pair replaces the request token.
#[tracing::instrument(skip_all, err)]
pub async fn complete_login(
    platform: &dyn SocialPlatform,
    session: &mut SessionData,
    verifier: Option<&str>,
) -> Result<AccessToken, AuthError> {
    let Some(request_token) = session.request_token.as_ref() else {
        return Err(AuthError::MissingRequestToken);
    };

    let Some(verifier) = verifier.filter(|v| !v.is_empty()) else {
        warn!("Callback arrived without an oauth_verifier");
        return Err(AuthError::MissingVerifier);
    };

    let access_token = platform
        .access_token(request_token, verifier)
        .await
        .map_err(AuthError::AccessToken)?;

    info!(screen_name = ?access_token.screen_name, "Login completed");

    session.access_token = Some(access_token.clone());
    session.request_token = None;

    Ok(access_token)
}
