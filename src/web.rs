use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::{MapRouteConfig, ServerConfig};
use crate::orchestrator::RouteResolver;

/// Headroom above the agent deadline before the HTTP layer gives up
const TRANSPORT_GRACE: Duration = Duration::from_secs(5);

/// Full application with middleware applied
pub fn app(resolver: RouteResolver, server: &ServerConfig, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router(resolver)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout + TRANSPORT_GRACE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(config: &MapRouteConfig, resolver: RouteResolver) -> Result<()> {
    let server = &config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", server.host, server.port))?;
    let app = app(resolver, server, config.agent.request_timeout());

    match (&server.tls_cert_path, &server.tls_key_path) {
        (Some(cert), Some(key)) => serve_tls(addr, app, cert, key).await,
        _ => serve(addr, app).await,
    }
}

async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "Web server failed")?;
    tracing::info!("Web server stopped");
    Ok(())
}

#[cfg(feature = "tls")]
async fn serve_tls(
    addr: SocketAddr,
    app: Router,
    cert: &std::path::Path,
    key: &std::path::Path,
) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let tls = RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {}", cert.display()))?;

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    tracing::info!("Web server running at https://{}", addr);
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .with_context(|| "Web server failed")?;
    tracing::info!("Web server stopped");
    Ok(())
}

#[cfg(not(feature = "tls"))]
async fn serve_tls(
    _addr: SocketAddr,
    _app: Router,
    _cert: &std::path::Path,
    _key: &std::path::Path,
) -> Result<()> {
    anyhow::bail!("TLS certificate configured but maproute was built without the `tls` feature")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
