//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1)
//!
//! Every call to the platform carries an `Authorization: OAuth ...` header
//! signed with the consumer secret and, once one exists, the token secret.
//! The base string and HMAC come from `oauth1_request`; [`Signer`] only
//! gathers the protocol parameters for one request.

use oauth1_request::{Credentials, HMAC_SHA1};
use rand::{distributions::Alphanumeric, Rng};

use super::token::ConsumerCredentials;

const NONCE_LENGTH: usize = 32;

pub struct Signer<'a> {
    consumer: &'a ConsumerCredentials,
    token: Option<(&'a str, &'a str)>,
    callback: Option<&'a str>,
    verifier: Option<&'a str>,
    nonce: String,
    timestamp: u64,
}

impl<'a> Signer<'a> {
    pub fn new(consumer: &'a ConsumerCredentials) -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect();

        Self {
            consumer,
            token: None,
            callback: None,
            verifier: None,
            nonce,
            timestamp: u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default(),
        }
    }

    /// Sign with a request or access token
    pub fn token(mut self, token: &'a str, secret: &'a str) -> Self {
        self.token = Some((token, secret));
        self
    }

    pub fn callback(mut self, callback: &'a str) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn verifier(mut self, verifier: &'a str) -> Self {
        self.verifier = Some(verifier);
        self
    }

    #[cfg(test)]
    fn fixed(mut self, nonce: &str, timestamp: u64) -> Self {
        self.nonce = nonce.to_string();
        self.timestamp = timestamp;
        self
    }

    /// Value for the `Authorization` header of this request.
    ///
    /// `url` must not carry a query string. Query and form-body parameters
    /// are passed as `request`; use `&()` when there are none. Multipart
    /// bodies are never signed.
    pub fn authorization_header<R>(&self, method: &str, url: &str, request: &R) -> String
    where
        R: oauth1_request::Request + ?Sized,
    {
        let mut builder = oauth1_request::Builder::new(
            Credentials::new(self.consumer.key.as_str(), self.consumer.secret.as_str()),
            HMAC_SHA1,
        );
        builder
            .token(
                self.token
                    .map(|(token, secret)| Credentials::new(token, secret)),
            )
            .callback(self.callback)
            .verifier(self.verifier)
            .nonce(self.nonce.as_str())
            .timestamp(std::num::NonZeroU64::new(self.timestamp))
            .version(true);

        builder.authorize(method, url, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from the platform's "Creating a signature" documentation
    fn documented_consumer() -> ConsumerCredentials {
        ConsumerCredentials {
            key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
        }
    }

    const DOC_TOKEN: &str = "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb";
    const DOC_TOKEN_SECRET: &str = "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE";
    const DOC_URL: &str = "https://api.twitter.com/1.1/statuses/update.json";

    #[derive(oauth1_request::Request)]
    struct DocumentedUpdate<'a> {
        include_entities: bool,
        status: &'a str,
    }

    const DOC_UPDATE: DocumentedUpdate<'static> = DocumentedUpdate {
        include_entities: true,
        status: "Hello Ladies + Gentlemen, a signed OAuth request!",
    };

    fn documented_signer(consumer: &ConsumerCredentials) -> Signer<'_> {
        Signer::new(consumer)
            .token(DOC_TOKEN, DOC_TOKEN_SECRET)
            .fixed("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg", 1318622958)
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let consumer = documented_consumer();
        let signer = documented_signer(&consumer);

        let header = signer.authorization_header("POST", DOC_URL, &DOC_UPDATE);

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
    }

    #[test]
    fn test_header_carries_protocol_params_only() {
        let consumer = documented_consumer();
        let signer = documented_signer(&consumer);

        let header = signer.authorization_header("POST", DOC_URL, &DOC_UPDATE);

        assert!(header.contains("oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains(&format!("oauth_token=\"{DOC_TOKEN}\"")));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_version=\"1.0\""));
        assert!(!header.contains("status"));
        assert!(!header.contains("include_entities"));
    }

    #[test]
    fn test_body_params_change_the_signature() {
        let consumer = documented_consumer();

        let with_body = documented_signer(&consumer).authorization_header("POST", DOC_URL, &DOC_UPDATE);
        let without_body = documented_signer(&consumer).authorization_header("POST", DOC_URL, &());

        assert_ne!(with_body, without_body);
    }

    #[test]
    fn test_callback_and_verifier_are_signed_parameters() {
        let consumer = documented_consumer();
        let signer = Signer::new(&consumer)
            .callback("http://localhost:3000/callback")
            .verifier("abc123")
            .fixed("nonce", 1);

        let header = signer.authorization_header("POST", "https://example.test/oauth/request_token", &());

        assert!(header.contains("oauth_callback=\"http%3A%2F%2Flocalhost%3A3000%2Fcallback\""));
        assert!(header.contains("oauth_verifier=\"abc123\""));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn test_nonces_are_fresh_per_request() {
        let consumer = documented_consumer();
        let a = Signer::new(&consumer);
        let b = Signer::new(&consumer);

        assert_eq!(a.nonce.len(), NONCE_LENGTH);
        assert_ne!(a.nonce, b.nonce);
    }
}
