use fixtures::platform::{FakePlatform, DEFAULT_SCREEN_NAME};
use std::collections::HashMap;

const OAUTH_HEADER: &str =
    r#"OAuth oauth_consumer_key="key", oauth_nonce="nonce", oauth_signature="sig""#;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn header_with(extra: &[(&str, &str)]) -> String {
    let mut header = OAUTH_HEADER.to_string();
    for (key, value) in extra {
        header.push_str(&format!(", {key}=\"{}\"", urlencoding::encode(value)));
    }
    header
}

/// Runs the three-legged handshake and returns the issued access token
async fn authorize(base: &str, client: &reqwest::Client) -> HashMap<String, String> {
    let body = client
        .post(format!("{base}/oauth/request_token"))
        .header(
            "Authorization",
            header_with(&[("oauth_callback", "http://app.test/callback")]),
        )
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let request: HashMap<String, String> = serde_urlencoded::from_str(&body).unwrap();
    assert_eq!(request["oauth_callback_confirmed"], "true");

    let response = client
        .get(format!(
            "{base}/oauth/authorize?oauth_token={}",
            request["oauth_token"]
        ))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    let location = response.headers()["location"].to_str().unwrap().to_string();
    let (callback, query) = location.split_once('?').unwrap();
    assert_eq!(callback, "http://app.test/callback");
    let returned: HashMap<String, String> = serde_urlencoded::from_str(query).unwrap();
    assert_eq!(returned["oauth_token"], request["oauth_token"]);

    let body = client
        .post(format!("{base}/oauth/access_token"))
        .header(
            "Authorization",
            header_with(&[
                ("oauth_token", request["oauth_token"].as_str()),
                ("oauth_verifier", returned["oauth_verifier"].as_str()),
            ]),
        )
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    serde_urlencoded::from_str(&body).unwrap()
}

#[tokio::test]
async fn test_request_token_requires_oauth_header() {
    let platform = FakePlatform::new();
    let addr = platform.spawn().await.unwrap();

    let response = client()
        .post(format!("http://{addr}/oauth/request_token"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_handshake_issues_access_token() {
    let platform = FakePlatform::new();
    let addr = platform.spawn().await.unwrap();

    let access = authorize(&format!("http://{addr}"), &client()).await;

    assert!(access["oauth_token"].starts_with("access-token-"));
    assert!(access["oauth_token_secret"].starts_with("access-secret-"));
    assert_eq!(access["screen_name"], DEFAULT_SCREEN_NAME);
}

#[tokio::test]
async fn test_wrong_verifier_is_rejected() {
    let platform = FakePlatform::new();
    let addr = platform.spawn().await.unwrap();
    let client = client();

    let body = client
        .post(format!("http://{addr}/oauth/request_token"))
        .header(
            "Authorization",
            header_with(&[("oauth_callback", "http://app.test/callback")]),
        )
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let request: HashMap<String, String> = serde_urlencoded::from_str(&body).unwrap();

    let response = client
        .post(format!("http://{addr}/oauth/access_token"))
        .header(
            "Authorization",
            header_with(&[
                ("oauth_token", request["oauth_token"].as_str()),
                ("oauth_verifier", "not-the-verifier"),
            ]),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_then_post_is_recorded() {
    let platform = FakePlatform::new();
    let addr = platform.spawn().await.unwrap();
    let client = client();
    let access = authorize(&format!("http://{addr}"), &client).await;
    let auth = header_with(&[("oauth_token", access["oauth_token"].as_str())]);

    let part = reqwest::multipart::Part::bytes(vec![1, 2, 3])
        .file_name("banner.png")
        .mime_str("image/png")
        .unwrap();
    let uploaded: serde_json::Value = client
        .post(format!("http://{addr}/1.1/media/upload.json"))
        .header("Authorization", &auth)
        .multipart(reqwest::multipart::Form::new().part("media", part))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let media_id = uploaded["media_id_string"].as_str().unwrap().to_string();

    let posted: serde_json::Value = client
        .post(format!("http://{addr}/1.1/statuses/update.json"))
        .header("Authorization", &auth)
        .form(&[("status", "hello"), ("media_ids", media_id.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let media = platform.media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].bytes, vec![1, 2, 3]);
    assert_eq!(media[0].file_name.as_deref(), Some("banner.png"));

    let posts = platform.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, posted["id_str"].as_str().unwrap());
    assert_eq!(posts[0].status, "hello");
    assert_eq!(posts[0].media_ids, vec![media_id]);
}

#[tokio::test]
async fn test_post_with_unknown_media_is_rejected() {
    let platform = FakePlatform::new();
    let addr = platform.spawn().await.unwrap();
    let client = client();
    let access = authorize(&format!("http://{addr}"), &client).await;

    let response = client
        .post(format!("http://{addr}/1.1/statuses/update.json"))
        .header(
            "Authorization",
            header_with(&[("oauth_token", access["oauth_token"].as_str())]),
        )
        .form(&[("status", "hello"), ("media_ids", "424242")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(platform.posts().is_empty());
}

#[tokio::test]
async fn test_unknown_access_token_cannot_upload() {
    let platform = FakePlatform::new();
    let addr = platform.spawn().await.unwrap();

    let response = client()
        .post(format!("http://{addr}/1.1/media/upload.json"))
        .header("Authorization", header_with(&[("oauth_token", "forged")]))
        .multipart(reqwest::multipart::Form::new().text("media", "x"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert!(platform.media().is_empty());
}
