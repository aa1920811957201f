//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs before anything binds or connects
//! - Check the traffic log file template is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServerConfig;
use crate::traffic::sink::TIME_PLACEHOLDER;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.url '{0}' is not a valid http(s) URL")]
    UpstreamUrl(String),

    #[error("traffic_log.file_name '{0}' has more than one time placeholder")]
    FileNameTemplate(String),

    #[error("traffic_log.max_body_bytes must be > 0 when include_body is set")]
    MaxBodyBytes,

    #[error("timeouts.request_secs must be > 0")]
    RequestTimeout,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Some(raw) = &config.upstream.url {
        let ok = Url::parse(raw)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
            .unwrap_or(false);
        if !ok {
            errors.push(ValidationError::UpstreamUrl(raw.clone()));
        }
    }

    let log = &config.traffic_log;
    if log.file_name.matches(TIME_PLACEHOLDER).count() > 1 {
        errors.push(ValidationError::FileNameTemplate(log.file_name.clone()));
    }
    if log.include_body && log.max_body_bytes == 0 {
        errors.push(ValidationError::MaxBodyBytes);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn rejects_double_placeholder_and_zero_body_cap() {
        let mut config = ServerConfig::default();
        config.traffic_log.file_name = "http_%s_%s.log".into();
        config.traffic_log.include_body = true;
        config.traffic_log.max_body_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::FileNameTemplate("http_%s_%s.log".into()),
                ValidationError::MaxBodyBytes,
            ]
        );
    }

    #[test]
    fn upstream_must_be_http() {
        let mut config = ServerConfig::default();
        config.upstream.url = Some("ftp://files.example.com".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::UpstreamUrl("ftp://files.example.com".into())])
        );

        config.upstream.url = Some("http://127.0.0.1:3000".into());
        assert_eq!(validate_config(&config), Ok(()));
    }
}
