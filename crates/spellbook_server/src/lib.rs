//! HTTP server wiring for Spellbook (routes, middleware, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for spell, trash, and health endpoints.
pub mod handlers;

pub use spellbook_core::{
    config, constants, models, store, AppError, Config, SpellStore, StoreBackend,
    DEFAULT_LIST_LIMIT, DEFAULT_PORT, MAX_LIST_LIMIT,
};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SpellStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state around an opened store.
    pub fn new(config: Config, store: Arc<dyn SpellStore>) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from a `BIND` override and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
/// - `bind_override`: Raw `BIND` value, if set.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(
    config: &Config,
    allow_public_access: bool,
    bind_override: Option<&str>,
) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match bind_override.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => match value.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        None => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

/// Origins that parse as header values; anything else is logged and skipped.
///
/// A literal `*` is rejected here; wildcard access goes through
/// `ALLOW_PUBLIC_ACCESS` instead.
fn allowed_origin_headers(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if origin != "*" => Some(value),
            _ => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect()
}

fn cors_layer(config: &Config, allow_public_access: bool, cors_port: u16) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    if allow_public_access {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any);
    }

    // Requests from origins outside the list simply get no CORS headers.
    let origins = allowed_origin_headers(&config.effective_cors_origins(cors_port));
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let cors = cors_layer(&state.config, allow_public_access, cors_port);
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/spells",
            get(handlers::spell::list_spells).post(handlers::spell::create_spell),
        )
        .route(
            "/spells/:id",
            get(handlers::spell::get_spell)
                .put(handlers::spell::update_spell)
                .delete(handlers::spell::delete_spell),
        )
        .route("/trash", get(handlers::trash::list_trash))
        .route("/trash/:id/restore", post(handlers::trash::restore_spell))
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_body_size))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::{allowed_origin_headers, listener_cors_port, resolve_bind_address};
    use spellbook_core::{Config, StoreBackend, DEFAULT_PORT};
    use std::net::SocketAddr;
    use std::path::PathBuf;

    fn config_on_port(port: u16) -> Config {
        Config {
            store: StoreBackend::JsonFile,
            data_dir: PathBuf::from("/tmp/spellbook-test"),
            port,
            max_body_size: 1024,
            cors_origins: Vec::new(),
        }
    }

    #[tokio::test]
    async fn listener_cors_port_uses_bound_listener_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener");
        let expected = listener.local_addr().expect("listener addr").port();
        assert_eq!(listener_cors_port(&listener, DEFAULT_PORT), expected);
    }

    #[test]
    fn resolve_bind_address_enforces_loopback_when_public_access_disabled() {
        let config = config_on_port(4040);
        let resolved = resolve_bind_address(&config, false, Some("0.0.0.0:4040"));
        assert_eq!(resolved, SocketAddr::from(([127, 0, 0, 1], 4040)));

        let public = resolve_bind_address(&config, true, Some("0.0.0.0:4040"));
        assert_eq!(public, SocketAddr::from(([0, 0, 0, 0], 4040)));
    }

    #[test]
    fn resolve_bind_address_allows_loopback_and_invalid_fallback() {
        let config = config_on_port(4041);
        assert_eq!(
            resolve_bind_address(&config, false, None),
            SocketAddr::from(([127, 0, 0, 1], 4041))
        );
        assert_eq!(
            resolve_bind_address(&config, false, Some("bad:host")),
            SocketAddr::from(([127, 0, 0, 1], 4041))
        );
    }

    #[test]
    fn invalid_cors_origins_are_skipped() {
        let origins = vec![
            "https://spells.example".to_string(),
            "bad\norigin".to_string(),
            "*".to_string(),
        ];
        let headers = allowed_origin_headers(&origins);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0], "https://spells.example");
    }
}
