//! Configuration validation.
//!
//! # Responsibilities
//! - Every required field is non-empty after trimming
//! - The authority address is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before any file or network activity

use thiserror::Error;

use crate::config::schema::AgentConfig;

/// A single semantic problem with the startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field is missing or blank.
    #[error("missing field: {field} ({description})")]
    MissingField {
        field: &'static str,
        description: &'static str,
    },

    /// Authority address does not parse as an http(s) URL.
    #[error("invalid authority address '{address}': {reason}")]
    InvalidAuthority { address: String, reason: String },
}

/// Validate a loaded configuration.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required: [(&'static str, &'static str, &str); 6] = [
        ("Ip", "address of the configuration authority", &config.ip),
        ("Env", "environment of the managed item", &config.env),
        ("AppId", "application id of the managed item", &config.app_id),
        ("Token", "open API access token", &config.token),
        ("CreatedBy", "author recorded on changes", &config.created_by),
        ("NginxConfPath", "path of the managed nginx config", &config.nginx_conf_path),
    ];

    for (field, description, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::MissingField { field, description });
        }
    }

    if !config.ip.trim().is_empty() {
        if let Err(reason) = check_authority(config.authority()) {
            errors.push(ValidationError::InvalidAuthority {
                address: config.ip.clone(),
                reason,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_authority(address: &str) -> Result<(), String> {
    let url = url::Url::parse(address).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("no host".to_string());
    }
    Ok(())
}
