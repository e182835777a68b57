use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use http::StatusCode;

/// Wrapper rendering any askama template into an html response.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::error!("failed rendering template: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed rendering template").into_response()
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StatusClass {
    Success,
    Warning,
    Error,
}

impl StatusClass {
    pub fn icon(&self) -> &'static str {
        match self {
            StatusClass::Success => "✓",
            StatusClass::Warning => "!",
            StatusClass::Error => "✕",
        }
    }
}

/// Page shown for every outcome of an unsubscribe request, errors included.
#[derive(Template, Clone, Debug)]
#[template(path = "status.html")]
pub struct StatusPage {
    /// Shown as the page heading.
    pub app_name: String,
    pub status_class: StatusClass,
    pub status_icon: &'static str,
    pub status_title: &'static str,
    pub message: String,
}

impl StatusPage {
    fn new(app_name: &str, class: StatusClass, title: &'static str, message: String) -> Self {
        Self {
            app_name: app_name.to_string(),
            status_class: class,
            status_icon: class.icon(),
            status_title: title,
            message,
        }
    }

    pub fn unsubscribed(app_name: &str, email: &str) -> Self {
        Self::new(
            app_name,
            StatusClass::Success,
            "Unsubscribed",
            format!("{email} has been unsubscribed successfully. You will no longer receive emails from us."),
        )
    }

    pub fn already_unsubscribed(app_name: &str, email: &str) -> Self {
        Self::new(
            app_name,
            StatusClass::Warning,
            "Already unsubscribed",
            format!("{email} is already unsubscribed from our mailing list."),
        )
    }

    pub fn missing_email(app_name: &str) -> Self {
        Self::new(
            app_name,
            StatusClass::Error,
            "Missing email address",
            "No email address was provided. Please use the unsubscribe link from one of our emails."
                .to_string(),
        )
    }

    pub fn server_error(app_name: &str) -> Self {
        Self::new(
            app_name,
            StatusClass::Error,
            "Something went wrong",
            "We couldn't process your request right now. Please try again later.".to_string(),
        )
    }
}
