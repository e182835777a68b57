use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::{Error, ErrorKind};

use super::askama::{HtmlTemplate, StatusPage};

impl Error {
    /// Renders the error as the status page of the named application.
    ///
    /// Error details, including the backtrace, are never part of the
    /// response and are only available through the application logs.
    pub fn into_status_page(self, app_name: &str) -> Response {
        match &self.kind {
            ErrorKind::BadInput(_) => {
                tracing::trace!("{}", self);
                (
                    StatusCode::BAD_REQUEST,
                    HtmlTemplate(StatusPage::missing_email(app_name)),
                )
                    .into_response()
            }
            ErrorKind::StoreNotConfigured(_) | ErrorKind::ConfigError(_) => {
                tracing::error!("misconfigured: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    HtmlTemplate(StatusPage::server_error(app_name)),
                )
                    .into_response()
            }
            _ => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    HtmlTemplate(StatusPage::server_error(app_name)),
                )
                    .into_response()
            }
        }
    }
}

/// Implements conversion into html response for all possible error variants,
/// for handlers without access to the configured application name.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_status_page(env!("CARGO_PKG_NAME"))
    }
}
