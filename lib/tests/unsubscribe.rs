//! End-to-end tests of the unsubscribe route.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;

use unlist::unsubscribe::{Insertion, Store, Unsubscribed};
use unlist::{Config, Database, ErrorKind, Registry, Result};

/// Sends a GET request and returns the status with the body text.
async fn get(router: &axum::Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn status_class(body: &str) -> &'static str {
    for class in ["success", "warning", "error"] {
        if body.contains(&format!(r#"class="card {class}""#)) {
            return class;
        }
    }
    panic!("no status class in body: {body}");
}

fn config() -> Config {
    Config {
        name: "Weekly Digest".to_string(),
        ..Default::default()
    }
}

fn setup() -> (axum::Router, Database) {
    let db = Database::temporary("newsletter").unwrap();
    let router = unlist::axum::app(config(), Registry::new(db.clone()));
    (router, db)
}

/// Store that is never reachable. Counts the attempts made.
#[derive(Default)]
struct Unreachable {
    attempts: AtomicUsize,
}

impl Store for Unreachable {
    fn insert(&self, _record: &Unsubscribed) -> Result<Insertion> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ErrorKind::DbError("connection refused: store.internal:27017".to_string()).into())
    }

    fn find(&self, _email: &str) -> Result<Option<Unsubscribed>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ErrorKind::DbError("connection refused: store.internal:27017".to_string()).into())
    }

    fn list(&self) -> Result<Vec<Unsubscribed>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ErrorKind::DbError("connection refused: store.internal:27017".to_string()).into())
    }
}

#[tokio::test]
async fn encoded_address_is_recorded_once() {
    let (router, db) = setup();

    let before = Utc::now();
    let (status, body) = get(&router, "/unsubscribe?email=%20Foo%40Example.com%20").await;
    let after = Utc::now();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_class(&body), "success");
    assert!(body.contains("foo@example.com has been unsubscribed"));

    let record = db.find("foo@example.com").unwrap().unwrap();
    assert!(record.unsubscribed_at >= before && record.unsubscribed_at <= after);

    let (status, body) = get(&router, "/unsubscribe?email=%20Foo%40Example.com%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_class(&body), "warning");
    assert!(body.contains("already unsubscribed"));

    // the first record stays untouched
    assert_eq!(db.list().unwrap(), vec![record]);
}

#[tokio::test]
async fn different_spellings_map_to_one_record() {
    let (router, db) = setup();

    let (_, body) = get(&router, "/unsubscribe?email=bar@example.com").await;
    assert_eq!(status_class(&body), "success");

    for uri in [
        "/unsubscribe?email=BAR@EXAMPLE.COM",
        "/unsubscribe?email=bar%40example.com",
        "/unsubscribe?email=%09Bar@Example.com%20%20",
        "/unsubscribe?list=main&email=bar@example.com",
    ] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::OK, "uri: {uri}");
        assert_eq!(status_class(&body), "warning", "uri: {uri}");
    }

    assert_eq!(db.list().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_address_is_rejected() {
    let (router, db) = setup();

    for uri in [
        "/unsubscribe",
        "/unsubscribe?",
        "/unsubscribe?email",
        "/unsubscribe?email=",
        "/unsubscribe?email=%20%20",
        "/unsubscribe?list=main",
    ] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(status_class(&body), "error", "uri: {uri}");
        assert!(body.contains("Missing email address"));
    }

    assert!(db.list().unwrap().is_empty());
}

#[tokio::test]
async fn unconfigured_store_fails_every_request() {
    let registry = Registry::connect(&unlist::config::Store {
        url: Some("memory".to_string()),
        name: None,
    })
    .unwrap();
    assert!(!registry.is_configured());
    let router = unlist::axum::app(config(), registry);

    for uri in ["/unsubscribe?email=foo@example.com", "/unsubscribe"] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "uri: {uri}");
        assert_eq!(status_class(&body), "error");
        assert!(body.contains("Something went wrong"));
    }
}

#[tokio::test]
async fn unreachable_store_fails_without_leaking_details() {
    let store = Arc::new(Unreachable::default());
    let router = unlist::axum::app(config(), Registry::new(store.clone()));

    let (status, body) = get(&router, "/unsubscribe?email=foo@example.com").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(status_class(&body), "error");
    assert!(!body.contains("connection refused"));
    assert!(!body.contains("store.internal"));
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);

    // input is still validated first
    let (status, _) = get(&router, "/unsubscribe?email=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_requests_create_a_single_record() {
    let (router, db) = setup();

    let requests = (0..16).map(|n| {
        let router = router.clone();
        let uri = if n % 2 == 0 {
            "/unsubscribe?email=race@example.com"
        } else {
            "/unsubscribe?email=RACE%40example.com"
        };
        tokio::spawn(async move { get(&router, uri).await })
    });
    let responses = futures::future::join_all(requests).await;

    let mut created = 0;
    for response in responses {
        let (status, body) = response.unwrap();
        assert_eq!(status, StatusCode::OK);
        if status_class(&body) == "success" {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(db.list().unwrap().len(), 1);
}

#[tokio::test]
async fn every_page_is_headed_with_the_app_name() {
    let (router, _db) = setup();
    let unconfigured = unlist::axum::app(config(), Registry::unconfigured());

    for (router, uri) in [
        (&router, "/unsubscribe?email=foo@example.com"),
        (&router, "/unsubscribe?email=foo@example.com"),
        (&router, "/unsubscribe"),
        (&unconfigured, "/unsubscribe?email=foo@example.com"),
    ] {
        let (_, body) = get(router, uri).await;
        assert!(
            body.contains(r#"<header class="app">Weekly Digest</header>"#),
            "uri: {uri}"
        );
    }
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let (router, _db) = setup();
    let (status, _) = get(&router, "/subscribe?email=foo@example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
