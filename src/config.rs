//! Edit configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! simplify_expressions = true
//! ramp_element = "Ramp"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that turns simplification off when set to a
/// non-empty value
pub const NO_SIMPLIFY_VAR: &str = "NO_SIMPLIFY";

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Settings shared by every edit
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditConfig {
    /// Simplify values after translating, mirroring or setting them
    pub simplify_expressions: bool,
    /// Element whose angle flips on a vertical mirror
    pub ramp_element: String,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            simplify_expressions: true,
            ramp_element: "Ramp".to_string(),
        }
    }
}

impl EditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_simplify_expressions(mut self, simplify: bool) -> Self {
        self.simplify_expressions = simplify;
        self
    }

    pub fn with_ramp_element(mut self, name: impl Into<String>) -> Self {
        self.ramp_element = name.into();
        self
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        let no_simplify = std::env::var_os(NO_SIMPLIFY_VAR);
        self.with_no_simplify(no_simplify.as_deref().and_then(|v| v.to_str()))
    }

    fn with_no_simplify(self, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.with_simplify_expressions(false),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditConfig::default();
        assert!(config.simplify_expressions);
        assert_eq!(config.ramp_element, "Ramp");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = EditConfig::from_str("simplify_expressions = false").unwrap();
        assert!(!config.simplify_expressions);
        assert_eq!(config.ramp_element, "Ramp");
    }

    #[test]
    fn test_parse_full_toml() {
        let config = EditConfig::from_str(
            r#"
simplify_expressions = true
ramp_element = "Slope"
"#,
        )
        .unwrap();
        assert_eq!(config, EditConfig::new().with_ramp_element("Slope"));
    }

    #[test]
    fn test_invalid_toml_error() {
        let err = EditConfig::from_str("simplify_expressions = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(EditConfig::from_str("unknown_key = 1").is_err());
    }

    #[test]
    fn test_no_simplify_override() {
        assert!(!EditConfig::new().with_no_simplify(Some("1")).simplify_expressions);
        assert!(EditConfig::new().with_no_simplify(Some("")).simplify_expressions);
        assert!(EditConfig::new().with_no_simplify(None).simplify_expressions);
    }
}
