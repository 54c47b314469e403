use crate::Config;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum StartupCheckError {
    #[error("No pCloud API servers configured")]
    NoApiServers,

    #[error("Invalid API server host: {0:?}")]
    InvalidApiServer(String),

    #[error("Invalid image size for {field}: {value:?} (expected WIDTHxHEIGHT)")]
    InvalidImageSize { field: &'static str, value: String },

    #[error("Swipe threshold must be positive, got {0}")]
    InvalidSwipeThreshold(f64),

    #[error("Invalid listen address: {0:?}")]
    InvalidHost(String),
}

/// Accepts pCloud size strings such as `640x640`.
pub fn parse_image_size(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.split_once('x')?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

pub fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    if config.pcloud.api_servers.is_empty() {
        error!("No API servers configured");
        errors.push(StartupCheckError::NoApiServers);
    }

    for server in &config.pcloud.api_servers {
        if server.is_empty() || server.contains('/') || server.contains(char::is_whitespace) {
            error!("API server entry is not a bare host name: {:?}", server);
            errors.push(StartupCheckError::InvalidApiServer(server.clone()));
        } else {
            info!("API server: {}", server);
        }
    }

    if config.pcloud.retry_codes.is_empty() {
        warn!("No retry codes configured, region fallback is disabled");
    }

    for (field, value) in [
        ("thumbnail_size", &config.pcloud.thumbnail_size),
        ("high_res_size", &config.pcloud.high_res_size),
    ] {
        if parse_image_size(value).is_none() {
            errors.push(StartupCheckError::InvalidImageSize {
                field,
                value: value.clone(),
            });
        }
    }

    let threshold = config.lightbox.swipe_threshold;
    if !(threshold.is_finite() && threshold > 0.0) {
        errors.push(StartupCheckError::InvalidSwipeThreshold(threshold));
    }

    if config.server.host.parse::<std::net::IpAddr>().is_err() {
        errors.push(StartupCheckError::InvalidHost(config.server.host.clone()));
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert_eq!(perform_startup_checks(&Config::default()), Ok(()));
    }

    #[test]
    fn test_image_size_parsing() {
        assert_eq!(parse_image_size("2048x2048"), Some((2048, 2048)));
        assert_eq!(parse_image_size("640x480"), Some((640, 480)));
        assert_eq!(parse_image_size("0x480"), None);
        assert_eq!(parse_image_size("large"), None);
        assert_eq!(parse_image_size("640"), None);
    }

    #[test]
    fn test_collects_every_problem() {
        let mut config = Config::default();
        config.pcloud.api_servers = vec!["https://api.pcloud.com/".to_string()];
        config.pcloud.high_res_size = "huge".to_string();
        config.lightbox.swipe_threshold = 0.0;
        config.server.host = "localhost:3000".to_string();

        let errors = perform_startup_checks(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                StartupCheckError::InvalidApiServer("https://api.pcloud.com/".to_string()),
                StartupCheckError::InvalidImageSize {
                    field: "high_res_size",
                    value: "huge".to_string(),
                },
                StartupCheckError::InvalidSwipeThreshold(0.0),
                StartupCheckError::InvalidHost("localhost:3000".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_server_list() {
        let mut config = Config::default();
        config.pcloud.api_servers.clear();

        let errors = perform_startup_checks(&config).unwrap_err();
        assert_eq!(errors, vec![StartupCheckError::NoApiServers]);
    }
}
