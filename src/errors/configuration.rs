//! Configuration error types
//!
//! Raised when a portal, its required per-type defaults, or a tool setting is missing or
//! invalid. These are always checked before any layer row is written or read.
//!
//! # Examples
//!
//! ```rust
//! use layerconfig::errors::ConfigurationError;
//!
//! let err = ConfigurationError::PortalNotFound("editor".to_string());
//! assert_eq!(err.to_string(), "Portal 'editor' is not registered");
//! ```

use thiserror::Error;

/// Portal and settings configuration errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Portal code has no row in `portals`
    #[error("Portal '{0}' is not registered")]
    PortalNotFound(String),

    /// Portal code is outside the configured allow-list
    #[error("Portal '{code}' is not allowed. Allowed: {}", .allowed.join(", "))]
    PortalNotAllowed { code: String, allowed: Vec<String> },

    /// One or more of the required layer-type defaults is absent
    #[error(
        "Portal '{portal}' is missing per-type defaults for: {}",
        .missing.join(", ")
    )]
    MissingTypeDefaults {
        portal: String,
        missing: Vec<String>,
    },

    /// A stored per-type defaults value is not a JSON object
    #[error("Defaults for layer type '{layer_type}' are not a JSON object")]
    InvalidTypeDefaults { layer_type: String },

    /// A tool setting could not be parsed
    #[error("Invalid setting {key}='{value}'")]
    InvalidSetting { key: String, value: String },
}

impl ConfigurationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigurationError::PortalNotFound(_) => "PORTAL_NOT_FOUND",
            ConfigurationError::PortalNotAllowed { .. } => "PORTAL_NOT_ALLOWED",
            ConfigurationError::MissingTypeDefaults { .. } => "MISSING_TYPE_DEFAULTS",
            ConfigurationError::InvalidTypeDefaults { .. } => "INVALID_TYPE_DEFAULTS",
            ConfigurationError::InvalidSetting { .. } => "INVALID_SETTING",
        }
    }
}
