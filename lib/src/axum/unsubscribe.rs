use axum::{
    extract::RawQuery,
    response::{IntoResponse, Response},
    routing::get,
    Extension,
};
use http::StatusCode;

use crate::unsubscribe::{Insertion, Unsubscribed};
use crate::{email, ErrorKind, Registry, Result};

use super::askama::{HtmlTemplate, StatusPage};
use super::{ConfigExt, RegistryExt, Router};

pub const UNSUBSCRIBE: &str = "/unsubscribe";

pub fn router() -> Router {
    Router::new().route(UNSUBSCRIBE, get(unsubscribe))
}

/// Records the address passed in the `email` query parameter.
///
/// The raw parameter value is normalized with [`email::normalize`], which
/// does its own percent-decoding. Form decoding is not applied, a `+` stays
/// a `+`.
pub async fn unsubscribe(
    Extension(config): ConfigExt,
    Extension(registry): RegistryExt,
    RawQuery(query): RawQuery,
) -> Response {
    match record(&config.name, &registry, query.as_deref()) {
        Ok(page) => (StatusCode::OK, HtmlTemplate(page)).into_response(),
        Err(e) => e.into_status_page(&config.name),
    }
}

fn record(app_name: &str, registry: &Registry, query: Option<&str>) -> Result<StatusPage> {
    // Fail before looking at the input if there is nowhere to store it
    let store = registry.store()?;

    let email = email_param(query)
        .map(email::normalize)
        .unwrap_or_default();
    if email.is_empty() {
        return Err(ErrorKind::BadInput("missing email address".to_string()).into());
    }

    let record = Unsubscribed::new(email);
    let page = match store.insert(&record)? {
        Insertion::Created => {
            tracing::info!("recorded new unsubscribe");
            StatusPage::unsubscribed(app_name, &record.email)
        }
        Insertion::AlreadyPresent => {
            tracing::debug!("address already unsubscribed");
            StatusPage::already_unsubscribed(app_name, &record.email)
        }
    };

    Ok(page)
}

/// Extracts the raw value of the first `email` parameter. A bare `email`
/// key counts as an empty value.
fn email_param(query: Option<&str>) -> Option<&str> {
    query?.split('&').find_map(|pair| match pair.split_once('=') {
        Some(("email", value)) => Some(value),
        None if pair == "email" => Some(""),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::email_param;

    #[test]
    fn finds_first_email_param() {
        assert_eq!(email_param(None), None);
        assert_eq!(email_param(Some("")), None);
        assert_eq!(email_param(Some("list=main")), None);
        assert_eq!(email_param(Some("email")), Some(""));
        assert_eq!(email_param(Some("email=")), Some(""));
        assert_eq!(
            email_param(Some("list=main&email=a%40b.com&email=c@d.com")),
            Some("a%40b.com")
        );
        assert_eq!(email_param(Some("emails=x&email=y")), Some("y"));
    }

    #[test]
    fn plus_is_not_form_decoded() {
        assert_eq!(
            email_param(Some("email=foo+news@example.com")),
            Some("foo+news@example.com")
        );
    }
}
