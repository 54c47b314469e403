use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub mod album;
pub mod feed;
pub mod handlers;
pub mod navigation;
pub mod pcloud;
pub mod startup_checks;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub pcloud: PcloudConfig,
    #[serde(default)]
    pub lightbox: LightboxConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PcloudConfig {
    /// Regional API hosts, tried in order.
    pub api_servers: Vec<String>,
    /// Result codes that move a call on to the next host.
    pub retry_codes: Vec<u32>,
    pub thumbnail_size: String,
    pub thumbnail_crop: bool,
    pub thumbnail_type: String,
    pub high_res_size: String,
    pub user_agent: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for PcloudConfig {
    fn default() -> Self {
        Self {
            api_servers: vec!["api.pcloud.com".to_string(), "eapi.pcloud.com".to_string()],
            retry_codes: vec![pcloud::WRONG_REGION, pcloud::INTERNAL_ERROR],
            thumbnail_size: "640x640".to_string(),
            thumbnail_crop: false,
            thumbnail_type: "auto".to_string(),
            high_res_size: "2048x2048".to_string(),
            user_agent: format!("publink-gallery/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: None,
        }
    }
}

impl PcloudConfig {
    pub fn thumbnail_spec(&self) -> pcloud::ThumbnailSpec {
        pcloud::ThumbnailSpec {
            size: self.thumbnail_size.clone(),
            crop: self.thumbnail_crop,
            kind: self.thumbnail_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LightboxConfig {
    /// Minimum horizontal drag distance that counts as a swipe.
    pub swipe_threshold: f64,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 50.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "Publink Gallery".to_string(),
                log_level: "info".to_string(),
                base_url: None,
            },
            pcloud: PcloudConfig::default(),
            lightbox: LightboxConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml_edit::de::Error),
}

impl Config {
    /// Reads `path`, or falls back to the defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = toml_edit::de::from_str::<Config>(&content)?;
        tracing::info!("Configuration loaded from: {:?}", path);
        Ok(config)
    }
}

use axum::Router;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub feed: feed::SharedFeed,
    pub navigator: navigation::Navigator,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, client: pcloud::SharedClient) -> Self {
        let resolver = album::AlbumResolver::new(client.clone(), config.pcloud.thumbnail_spec());
        let feed = Arc::new(feed::PhotoFeed::new(
            resolver,
            client,
            config.pcloud.high_res_size.clone(),
        ));

        Self {
            feed,
            navigator: navigation::Navigator::new(config.lightbox.swipe_threshold),
            config,
        }
    }

    /// Prefixes `path` with the configured public base URL, if any.
    pub fn link(&self, path: &str) -> String {
        match &self.config.app.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}

pub fn create_app(config: Config) -> Result<Router, pcloud::PcloudError> {
    let client = Arc::new(pcloud::PcloudClient::from_config(&config.pcloud)?);
    Ok(create_app_with_client(config, client))
}

pub fn create_app_with_transport(config: Config, transport: pcloud::DynTransport) -> Router {
    let client = Arc::new(pcloud::PcloudClient::with_transport(
        &config.pcloud,
        transport,
    ));
    create_app_with_client(config, client)
}

pub fn create_app_with_client(config: Config, client: pcloud::SharedClient) -> Router {
    tracing::info!(
        "Remote calls go through the {} transport to {:?}",
        client.transport_name(),
        client.servers()
    );
    let app_state = AppState::new(config, client);

    Router::new()
        .route("/", axum::routing::get(handlers::home_handler))
        .route("/app", axum::routing::get(handlers::album_handler))
        .route(
            "/app/photo/{photo_id}",
            axum::routing::get(handlers::photo_handler),
        )
        .route(
            "/app/photo/{photo_id}/navigate",
            axum::routing::get(handlers::navigate_handler),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let uri = request.uri();
                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %uri.path(),
                        query = ?uri.query(),
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
