use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, DefaultBodyLimit, Multipart,
        Query, State,
    },
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use color_eyre::eyre::WrapErr as _;
use maud::Render;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tracing::{info, warn};

use crate::{
    components::{
        form::{FileInput, Form},
        layout::{Card, Page},
        ui::{button::Button, flash::FlashList},
    },
    errors::{ServerResult, WithRedirect},
    flash::Flash,
    oauth,
    publish::{self, UploadedImage},
    session::Session,
    state::AppState,
};

/// Multipart field carrying the image
const IMAGE_FIELD: &str = "image";

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> axum::Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;

    axum::Router::new()
        .route("/", get(root_page))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", get(logout))
        .route("/upload", post(upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CookieManagerLayer::new())
        .layer(sentry_tower::SentryHttpLayer::with_transaction())
        .layer(sentry_tower::NewSentryLayer::<axum::extract::Request>::new_from_top())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Landing page: login state, pending notices, and the upload form
async fn root_page(State(state): State<AppState>, session: Session, flash: Flash) -> Page {
    let sizes = &state.config.image_sizes;
    let accept = publish::ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    let account = session
        .data
        .access_token
        .as_ref()
        .map(|token| match &token.screen_name {
            Some(name) => format!("@{name}"),
            None => "your account".to_string(),
        });

    let content = maud::html! {
        h1 class="text-3xl font-bold text-gray-800 mb-2" { "adsizer" }
        p class="text-gray-600 mb-6" {
            "Upload one image and post it in every banner size at once."
        }

        (FlashList::new(flash.take()))

        div class="mb-6" {
            h2 class="text-sm font-semibold uppercase tracking-wide text-gray-500 mb-2" { "Sizes" }
            ul class="flex flex-wrap gap-2" {
                @for size in sizes {
                    li class="px-2 py-1 rounded bg-indigo-50 text-indigo-700 text-sm font-mono" {
                        (size.label)
                        @if size.label != format!("{}x{}", size.width, size.height) {
                            " (" (size.width) "x" (size.height) ")"
                        }
                    }
                }
            }
        }

        @match &account {
            Some(account) => {
                p class="text-gray-700 mb-4" { "Logged in as " strong { (account) } "." }

                (Form::new("/upload", "post", maud::html! {
                    (FileInput::new(IMAGE_FIELD)
                        .label("Image (png, jpg, jpeg, gif)")
                        .accept(&accept)
                        .required(true)
                        .render())

                    (Button::primary("Resize and publish")
                        .button_type("submit")
                        .icon("fa-solid fa-paper-plane")
                        .full_width(true)
                        .render())
                }).multipart().render())

                div class="mt-4" {
                    (Button::secondary("Log out").href("/logout").full_width(true).render())
                }
            }
            None => {
                p class="text-gray-700 mb-4" { "Log in to publish images to your account." }
                (Button::primary("Log in").href("/login").icon("fa-solid fa-sign-in-alt").full_width(true).render())
            }
        }
    };

    Page::new(
        "adsizer - banner publisher".to_string(),
        Box::new(Card::new(content).with_max_width("max-w-lg")),
    )
}

/// Start the OAuth flow and send the browser to the platform
async fn login(
    State(state): State<AppState>,
    mut session: Session,
    flash: Flash,
) -> ServerResult<Response, Redirect> {
    match oauth::begin_login(state.platform.as_ref(), &mut session.data).await {
        Ok(redirect_url) => {
            session
                .save()
                .wrap_err("Failed to store request token")
                .with_redirect(Redirect::to("/"))?;

            info!("Redirecting to platform for authorization");
            Ok(Redirect::to(&redirect_url).into_response())
        }
        Err(err) => {
            warn!(error = ?err, "Could not start login");
            flash.push(err.to_string());
            Ok(Redirect::to("/").into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
    /// Present instead of a verifier when the user refuses access
    pub denied: Option<String>,
}

/// Platform redirect target after the user approves (or refuses) access
async fn callback(
    State(state): State<AppState>,
    mut session: Session,
    flash: Flash,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> ServerResult<Redirect, Redirect> {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            warn!("Malformed callback query: {}", rejection);
            flash.push(oauth::AuthError::MalformedCallback.to_string());
            return Ok(Redirect::to("/"));
        }
    };

    if params.denied.is_some() {
        info!("User denied access on the platform");
    }

    if let (Some(returned), Some(pending)) = (&params.oauth_token, &session.data.request_token) {
        if returned != &pending.token {
            warn!("Callback token does not match the pending request token");
        }
    }

    match oauth::complete_login(
        state.platform.as_ref(),
        &mut session.data,
        params.oauth_verifier.as_deref(),
    )
    .await
    {
        Ok(access_token) => {
            session
                .save()
                .wrap_err("Failed to store access token")
                .with_redirect(Redirect::to("/"))?;

            flash.push(match access_token.screen_name {
                Some(name) => format!("Successfully authenticated as @{name}!"),
                None => "Successfully authenticated!".to_string(),
            });
        }
        Err(err) => {
            warn!(error = ?err, "Could not complete login");
            flash.push(err.to_string());
        }
    }

    Ok(Redirect::to("/"))
}

/// Logout route - forgets the credentials and redirects to home
async fn logout(mut session: Session, flash: Flash) -> Redirect {
    session.clear();
    flash.push("Logged out.");

    info!("User logged out successfully");
    Redirect::to("/")
}

/// Resize the uploaded image and publish every variant in one post
async fn upload(
    State(state): State<AppState>,
    session: Session,
    flash: Flash,
    multipart: Result<Multipart, MultipartRejection>,
) -> Redirect {
    let upload = read_image_field(multipart).await;

    let result = publish::publish(
        upload,
        &state.config.image_sizes,
        session.data.access_token.as_ref(),
        state.platform.as_ref(),
    )
    .await;

    match result {
        Ok(published) => {
            info!(
                post_id = %published.post_id.0,
                media = published.media_count,
                "Published banner set"
            );
            flash.push(format!(
                "Images have been successfully posted to your account! ({} images)",
                published.media_count
            ));
        }
        Err(err) => {
            warn!(error = ?err, "Publish failed");
            flash.push(err.to_string());
        }
    }

    Redirect::to("/")
}

/// Pull the image field out of the form. Anything unreadable counts as no file.
async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Option<UploadedImage> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("Upload was not a multipart form: {}", rejection);
            return None;
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read multipart body: {}", e);
                return None;
            }
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        return match field.bytes().await {
            Ok(bytes) => Some(UploadedImage {
                filename,
                bytes: bytes.to_vec(),
            }),
            Err(e) => {
                warn!("Failed to read uploaded file {}: {}", filename, e);
                None
            }
        };
    }
}

async fn health() -> &'static str {
    "ok"
}
