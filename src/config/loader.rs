//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportKind;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [transports]
            rpc_url = "http://127.0.0.1:20336"
            ws_url = "ws://127.0.0.1:20335"
            default = "ws"

            [timeouts]
            request_secs = 3

            [observability]
            log_level = "debug"
            metrics_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.transports.default, Some(TransportKind::WebSocket));
        assert_eq!(config.timeouts.request_secs, 3);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.transports.rpc_url.as_deref(), Some("http://localhost:20336"));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse_config("[timeouts]\nrequest_secs = \"ten\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = parse_config("[timeouts]\nrequest_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("timeouts.request_secs"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/node-client.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
