//! Bridge configuration.
//!
//! Settings come from a TOML document, with the mutability feature flag optionally switched
//! on through `CONTEXT_BRIDGE_ENABLE_FEATURES`.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::runner::bridge::converter::ConvertOptions;
use crate::runner::bridge::error::BridgeError;

pub const FEATURES_ENV_VAR: &str = "CONTEXT_BRIDGE_ENABLE_FEATURES";
pub const MUTABILITY_FEATURE: &str = "ContextBridgeMutability";
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

lazy_static! {
    static ref ENABLED_FEATURES: Vec<String> = env::var(FEATURES_ENV_VAR)
        .map(|v| parse_feature_list(&v))
        .unwrap_or_default();
}

/// Splits a comma separated feature list, dropping blanks.
pub fn parse_feature_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Leave exposed values writable instead of deep freezing them.
    pub mutability: bool,

    /// Realms run sandboxed, which takes away weak reference tracking.
    pub sandboxed: bool,

    /// Nesting level at which a conversion gives up.
    pub max_recursion_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            mutability: false,
            sandboxed: false,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig =
            toml::from_str(source).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        BridgeConfig::from_toml_str(&source)
    }

    /// Defaults plus whatever the environment enabled when the process first asked.
    pub fn from_env() -> Self {
        BridgeConfig::default().with_env_features()
    }

    pub fn with_env_features(self) -> Self {
        self.with_features(&ENABLED_FEATURES)
    }

    /// Switches on the settings behind each recognised name of `features`.
    pub fn with_features(mut self, features: &[String]) -> Self {
        if features.iter().any(|f| f == MUTABILITY_FEATURE) {
            self.mutability = true;
        }
        self
    }

    pub fn with_mutability(mut self, mutability: bool) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn with_sandboxed(mut self, sandboxed: bool) -> Self {
        self.sandboxed = sandboxed;
        self
    }

    fn validate(self) -> Result<Self, BridgeError> {
        if self.max_recursion_depth == 0 {
            return Err(BridgeError::Config(
                "max_recursion_depth must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    pub(crate) fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            max_depth: self.max_recursion_depth,
            dynamic_props: false,
            freeze: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert!(!config.mutability);
        assert!(!config.sandboxed);
        assert_eq!(config.max_recursion_depth, 1000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BridgeConfig::from_toml_str("mutability = true").unwrap();
        assert!(config.mutability);
        assert_eq!(config.max_recursion_depth, DEFAULT_MAX_RECURSION_DEPTH);
    }

    #[test]
    fn test_full_toml() {
        let config = BridgeConfig::from_toml_str(
            "mutability = false\nsandboxed = true\nmax_recursion_depth = 16\n",
        )
        .unwrap();
        assert_eq!(
            config,
            BridgeConfig {
                mutability: false,
                sandboxed: true,
                max_recursion_depth: 16,
            }
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = BridgeConfig::from_toml_str("mutable = true").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let err = BridgeConfig::from_toml_str("max_recursion_depth = 0").unwrap_err();
        assert!(err.to_string().contains("max_recursion_depth"));
    }

    #[test]
    fn test_missing_file() {
        let err = BridgeConfig::from_file("/nonexistent/context-bridge.toml").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_parse_feature_list() {
        assert_eq!(
            parse_feature_list(" ContextBridgeMutability, ,Other "),
            vec!["ContextBridgeMutability".to_string(), "Other".to_string()]
        );
        assert!(parse_feature_list("").is_empty());
    }

    #[test]
    fn test_feature_list_enables_mutability() {
        let config = BridgeConfig::default().with_features(&parse_feature_list("Other,ContextBridgeMutability"));
        assert!(config.mutability);
        let config = BridgeConfig::default().with_features(&parse_feature_list("Other"));
        assert!(!config.mutability);
    }

    #[test]
    fn test_builder_flags() {
        let config = BridgeConfig::default()
            .with_mutability(true)
            .with_sandboxed(true);
        assert!(config.mutability);
        assert!(config.sandboxed);
        assert!(!config.convert_options().dynamic_props);
        assert!(!config.convert_options().freeze);
    }
}
