//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint URLs and their schemes
//! - Check a pinned default refers to a configured transport
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::ClientConfig;
use crate::transport::TransportKind;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check `config` for every semantic problem.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let transports = &config.transports;

    let endpoints = [
        ("transports.rpc_url", &transports.rpc_url, ["http", "https"]),
        ("transports.rest_url", &transports.rest_url, ["http", "https"]),
        ("transports.ws_url", &transports.ws_url, ["ws", "wss"]),
    ];
    for (field, url, schemes) in endpoints {
        if let Some(url) = url {
            check_url(field, url, &schemes, &mut errors);
        }
    }

    if endpoints.iter().all(|(_, url, _)| url.is_none()) {
        errors.push(ValidationError::new("transports", "no transport endpoint configured"));
    }

    if let Some(kind) = transports.default {
        let configured = match kind {
            TransportKind::Rpc => transports.rpc_url.is_some(),
            TransportKind::Rest => transports.rest_url.is_some(),
            TransportKind::WebSocket => transports.ws_url.is_some(),
        };
        if !configured {
            errors.push(ValidationError::new(
                "transports.default",
                format!("'{}' has no endpoint configured", kind),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, raw: &str, schemes: &[&str], errors: &mut Vec<ValidationError>) {
    match url::Url::parse(raw) {
        Ok(parsed) if schemes.contains(&parsed.scheme()) => {}
        Ok(parsed) => errors.push(ValidationError::new(
            field,
            format!("scheme '{}' not one of {:?}", parsed.scheme(), schemes),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
    }
}
