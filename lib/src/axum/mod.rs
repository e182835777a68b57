pub mod askama;
pub mod error;
pub mod unsubscribe;

use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::Extension;
use tower_http::trace::TraceLayer;
use tracing::Span;
use uuid::Uuid;

use crate::{Config, Registry, Result};

pub type Router = axum::Router;

pub type ConfigExt = Extension<Arc<Config>>;
pub type RegistryExt = Extension<Registry>;

/// Returns the router with all the application routes, without any state.
pub fn router() -> Router {
    Router::new().merge(unsubscribe::router())
}

/// Builds the complete application, registering the config, the shared
/// registry and the request tracing layer on top of [`router`].
pub fn app(config: Config, registry: Registry) -> Router {
    router()
        .layer(Extension(Arc::new(config)))
        .layer(Extension(registry))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Every request gets its own span and id. Only the path is recorded, the
/// query string carries the email address.
fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Initializes tracing, connects to the store and serves the application
/// until ctrl-c is received.
pub async fn start(config: Config) -> Result<()> {
    start_with(config, shutdown_signal()).await
}

/// Same as [`start`] but runs until the provided future completes.
pub async fn start_with(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    crate::tracing::init(&config).unwrap_or_else(|e| {
        log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}")
    });

    let registry = Registry::connect(&config.store)?;
    serve(&config, registry, shutdown).await
}

/// Serves the application with the provided registry. The registry is closed
/// once the server has shut down gracefully.
pub async fn serve(
    config: &Config,
    registry: Registry,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = config.address;
    if !registry.is_configured() {
        tracing::warn!("no store configured, unsubscribe requests will fail");
    }
    let router = app(config.clone(), registry.clone());

    tracing::info!("starting {} {} at {addr}", config.name, config.version);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("server stopped, closing store");
    registry.close()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed listening for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
