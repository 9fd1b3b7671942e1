use axum::response::{IntoResponse, Redirect, Response};
use color_eyre::Report;

/// An unexpected failure paired with the response the user should get
#[derive(Debug)]
pub struct ServerError<R: IntoResponse>(pub(crate) Report, pub(crate) R);

pub type ServerResult<S, F = Response> = Result<S, ServerError<F>>;

impl<R: IntoResponse> IntoResponse for ServerError<R> {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self.0, "Request Error");
        sentry::capture_message(&format!("{:#}", self.0), sentry::Level::Error);

        self.1.into_response()
    }
}

pub(crate) trait WithRedirect<T> {
    fn with_redirect(self, redirect: Redirect) -> Result<T, ServerError<Redirect>>;
}

impl<T> WithRedirect<T> for Result<T, Report> {
    fn with_redirect(self, redirect: Redirect) -> Result<T, ServerError<Redirect>> {
        self.map_err(|err| ServerError(err, redirect))
    }
}
