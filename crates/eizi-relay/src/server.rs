//! Relay HTTP server - router, CORS, and startup.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use eizi_core::config::RelayConfig;

use crate::proxy::{health, limits_handler, relay_handler, RelayState};

/// CORS layer from the configured origin list. `"*"` allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Build the relay router: `<path>` (all methods, POST-only inside),
/// `GET /api/limits` and `GET /health`.
///
/// `path` comes from user config and must start with `/`.
pub fn router(path: &str, state: RelayState, allowed_origins: &[String]) -> Result<Router> {
    if !path.starts_with('/') {
        bail!("relay path '{}' must start with '/'", path);
    }
    if path == "/health" || path == "/api/limits" {
        bail!("relay path '{}' collides with a built-in route", path);
    }

    Ok(Router::new()
        .route(path, any(relay_handler))
        .route("/api/limits", get(limits_handler))
        .route("/health", get(health))
        .layer(cors_layer(allowed_origins))
        .with_state(Arc::new(state)))
}

/// Serve the relay on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, config: &RelayConfig) -> Result<()> {
    let app = router(
        &config.path,
        RelayState::from_config(config),
        &config.allowed_origins,
    )?;
    axum::serve(listener, app).await.context("relay server failed")?;
    Ok(())
}

/// Bind `host:port` and serve until the process exits.
pub async fn run(config: &RelayConfig) -> Result<()> {
    if !config.is_configured() {
        bail!("relay API key not configured (set OPENAI_API_KEY or EIZI_RELAY__API_KEY)");
    }
    if !config.path.starts_with('/') {
        bail!("relay path '{}' must start with '/'", config.path);
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        addr = %addr,
        path = %config.path,
        upstream = %config.upstream_base,
        "relay listening"
    );
    serve(listener, config).await
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
