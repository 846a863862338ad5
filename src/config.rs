use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::xyz_url::TokenPolicy;
use crate::errors::{CompilerError, CompilerResult, ConfigurationError};

/// Compiler settings loaded from an optional TOML file and environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Portal codes import may register. Empty allows any code.
    pub allowed_portals: Vec<String>,
    pub token_placeholder: String,
    pub token_query_param: String,
    /// Maximum number of offending ids listed in a batched error
    pub error_report_cap: usize,
    pub seed_switchlayer_defaults: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            allowed_portals: Vec::new(),
            token_placeholder: "{MAPBOX_TOKEN}".to_string(),
            token_query_param: "access_token".to_string(),
            error_report_cap: 20,
            seed_switchlayer_defaults: true,
        }
    }
}

impl CompilerConfig {
    /// Load from `path` when given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> CompilerResult<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(&Self::env_values())
    }

    pub fn from_env() -> CompilerResult<Self> {
        Self::from_map(&Self::env_values())
    }

    pub fn from_map(values: &HashMap<String, String>) -> CompilerResult<Self> {
        Self::default().with_overrides(values)
    }

    pub fn from_toml_file(path: &Path) -> CompilerResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|err| CompilerError::io(path, err))?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| CompilerError::parse(path.display().to_string(), err.to_string()))?;
        config.validated()
    }

    /// Token settings must be non-blank and the report cap positive.
    fn validated(self) -> CompilerResult<Self> {
        let settings = [
            ("token_placeholder", &self.token_placeholder),
            ("token_query_param", &self.token_query_param),
        ];
        for (key, value) in settings {
            if value.trim().is_empty() {
                return Err(ConfigurationError::InvalidSetting {
                    key: key.to_string(),
                    value: value.clone(),
                }
                .into());
            }
        }
        if self.error_report_cap == 0 {
            return Err(ConfigurationError::InvalidSetting {
                key: "error_report_cap".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(self)
    }

    fn with_overrides(mut self, values: &HashMap<String, String>) -> CompilerResult<Self> {
        fn read<'a>(values: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
            values
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        }

        fn invalid(key: &str, value: &str) -> CompilerError {
            ConfigurationError::InvalidSetting {
                key: key.to_string(),
                value: value.to_string(),
            }
            .into()
        }

        if let Some(value) = read(values, "LAYERCONFIG_ALLOWED_PORTALS") {
            self.allowed_portals = value
                .split(',')
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .collect();
        }
        if let Some(value) = read(values, "LAYERCONFIG_TOKEN_PLACEHOLDER") {
            self.token_placeholder = value.to_string();
        }
        if let Some(value) = read(values, "LAYERCONFIG_TOKEN_PARAM") {
            self.token_query_param = value.to_string();
        }
        if let Some(value) = read(values, "LAYERCONFIG_ERROR_REPORT_CAP") {
            self.error_report_cap = value
                .parse()
                .ok()
                .filter(|cap: &usize| *cap > 0)
                .ok_or_else(|| invalid("LAYERCONFIG_ERROR_REPORT_CAP", value))?;
        }
        if let Some(value) = read(values, "LAYERCONFIG_SEED_SWITCHLAYER_DEFAULTS") {
            self.seed_switchlayer_defaults = match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid("LAYERCONFIG_SEED_SWITCHLAYER_DEFAULTS", value)),
            };
        }

        self.validated()
    }

    fn env_values() -> HashMap<String, String> {
        Self::tracked_keys()
            .into_iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect()
    }

    fn tracked_keys() -> Vec<&'static str> {
        vec![
            "LAYERCONFIG_ALLOWED_PORTALS",
            "LAYERCONFIG_TOKEN_PLACEHOLDER",
            "LAYERCONFIG_TOKEN_PARAM",
            "LAYERCONFIG_ERROR_REPORT_CAP",
            "LAYERCONFIG_SEED_SWITCHLAYER_DEFAULTS",
        ]
    }

    pub fn token_policy(&self) -> CompilerResult<TokenPolicy> {
        TokenPolicy::new(&self.token_query_param, &self.token_placeholder).map_err(|_| {
            ConfigurationError::InvalidSetting {
                key: "token_query_param".to_string(),
                value: self.token_query_param.clone(),
            }
            .into()
        })
    }

    /// Fails when an allow-list is configured and `code` is not on it.
    pub fn check_portal_allowed(&self, code: &str) -> Result<(), ConfigurationError> {
        if self.allowed_portals.is_empty() || self.allowed_portals.iter().any(|c| c == code) {
            return Ok(());
        }
        let mut allowed = self.allowed_portals.clone();
        allowed.sort();
        Err(ConfigurationError::PortalNotAllowed {
            code: code.to_string(),
            allowed,
        })
    }
}
