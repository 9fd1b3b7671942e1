use serde::{Deserialize, Serialize};

/// Consumer (application) credentials issued by the platform
#[derive(Clone)]
pub struct ConsumerCredentials {
    pub key: String,
    pub secret: String,
}

impl std::fmt::Debug for ConsumerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Temporary credentials issued at the start of the OAuth flow.
/// Lives in the session only between `/login` and `/callback`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

/// Long-lived credentials for acting on the user's behalf
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
    /// Handle of the authorizing account, when the platform reports one
    #[serde(default)]
    pub screen_name: Option<String>,
}

// Secrets stay out of logs
impl std::fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestToken")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.token)
            .field("screen_name", &self.screen_name)
            .finish_non_exhaustive()
    }
}

/// Form-encoded body of the `oauth/request_token` response
#[derive(Debug, Deserialize)]
pub struct RequestTokenResponse {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default)]
    pub oauth_callback_confirmed: Option<String>,
}

impl RequestTokenResponse {
    pub fn callback_confirmed(&self) -> bool {
        self.oauth_callback_confirmed.as_deref() == Some("true")
    }
}

impl From<RequestTokenResponse> for RequestToken {
    fn from(response: RequestTokenResponse) -> Self {
        Self {
            token: response.oauth_token,
            secret: response.oauth_token_secret,
        }
    }
}

/// Form-encoded body of the `oauth/access_token` response
#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default)]
    pub screen_name: Option<String>,
}

impl From<AccessTokenResponse> for AccessToken {
    fn from(response: AccessTokenResponse) -> Self {
        Self {
            token: response.oauth_token,
            secret: response.oauth_token_secret,
            screen_name: response.screen_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_token_response_parses_form_body() {
        let body = "oauth_token=Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik&oauth_token_secret=Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM&oauth_callback_confirmed=true";

        let response: RequestTokenResponse = serde_urlencoded::from_str(body).unwrap();
        assert!(response.callback_confirmed());

        let token = RequestToken::from(response);
        assert_eq!(token.token, "Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik");
        assert_eq!(token.secret, "Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM");
    }

    #[test]
    fn test_unconfirmed_callback_is_detected() {
        let response: RequestTokenResponse =
            serde_urlencoded::from_str("oauth_token=a&oauth_token_secret=b").unwrap();
        assert!(!response.callback_confirmed());
    }

    #[test]
    fn test_access_token_response_keeps_screen_name() {
        let body = "oauth_token=6253282-eWudHldSbIaelX7swmsiHImEL4KinwaGloHANdrY&oauth_token_secret=2EEfA6BG5ly3sR3XjE0IBSnlQu4ZrUzPiYTmrkVU&user_id=6253282&screen_name=twitterapi";

        let token = AccessToken::from(
            serde_urlencoded::from_str::<AccessTokenResponse>(body).unwrap(),
        );
        assert_eq!(token.screen_name.as_deref(), Some("twitterapi"));
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let token = AccessToken {
            token: "public-token".to_string(),
            secret: "very-secret".to_string(),
            screen_name: None,
        };

        let debug = format!("{token:?}");
        assert!(debug.contains("public-token"));
        assert!(!debug.contains("very-secret"));
    }
}
