use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Router, http::StatusCode, middleware};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, SessionStore};
use crate::config::WeatherDashConfig;
use crate::dashboard;
use crate::users::UserStore;
use crate::weather::ForecastProvider;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<SessionStore>,
    pub provider: Arc<dyn ForecastProvider>,
    pub config: Arc<WeatherDashConfig>,
}

impl AppState {
    pub fn new(
        config: WeatherDashConfig,
        users: Arc<dyn UserStore>,
        provider: Arc<dyn ForecastProvider>,
    ) -> Self {
        let ttl = Duration::from_secs(u64::from(config.session.ttl_hours) * 3600);
        Self {
            users,
            sessions: Arc::new(SessionStore::new(ttl)),
            provider,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        // the limit's response body has no Default, so it must wrap the timeout
        .layer(RequestBodyLimitLayer::new(server.max_body_kb as usize * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(u64::from(server.request_timeout_seconds)),
        ));
    let assets = ServeDir::new(&server.assets_dir);

    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_login,
        ))
        .nest_service("/assets", assets)
        .layer(layers)
        .with_state(state)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Serve the app until a shutdown signal arrives. HTTPS when TLS paths are configured.
pub async fn serve(state: AppState) -> Result<()> {
    let config = Arc::clone(&state.config);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let app = build_router(state);

    match config.tls_paths() {
        Some((cert, key)) => serve_tls(app, addr, cert, key).await,
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            tracing::info!("Web server running at http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server failed")
        }
    }
}

#[cfg(feature = "tls")]
async fn serve_tls(app: Router, addr: SocketAddr, cert: &str, key: &str) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

    let tls = RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {cert} / key {key}"))?;

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    tracing::info!("Web server running at https://{}", addr);
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("HTTPS server failed")
}

#[cfg(not(feature = "tls"))]
async fn serve_tls(_app: Router, _addr: SocketAddr, _cert: &str, _key: &str) -> Result<()> {
    anyhow::bail!("TLS is configured but this build was compiled without the `tls` feature")
}
