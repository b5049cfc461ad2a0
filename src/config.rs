//! Store configuration
//!
//! Everything has a default so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// LocalStorage key the whole document lives under
pub const DEFAULT_STORAGE_KEY: &str = "appState";

/// How a persisted document is laid over the skeleton at init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitMerge {
    /// Persisted top-level sections replace default sections wholesale
    #[default]
    Shallow,
    /// Persisted values are merged into the defaults recursively
    Deep,
}

impl InitMerge {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitMerge::Shallow => "shallow",
            InitMerge::Deep => "deep",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shallow" => Some(InitMerge::Shallow),
            "deep" => Some(InitMerge::Deep),
            _ => None,
        }
    }
}

/// Store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Key the document is persisted under
    pub storage_key: String,
    /// Merge applied at init
    pub merge: InitMerge,
    /// Persist indented JSON (handy when inspecting storage by hand)
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            merge: InitMerge::Shallow,
            pretty: false,
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_merge(mut self, merge: InitMerge) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> StateResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StateResult<()> {
        if self.storage_key.is_empty() {
            return Err(StateError::Config("storage_key must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_key, "appState");
        assert_eq!(config.merge, InitMerge::Shallow);
        assert!(!config.pretty);
    }

    #[test]
    fn test_from_json_partial() {
        let config = StoreConfig::from_json(r#"{ "merge": "deep" }"#).unwrap();
        assert_eq!(config.merge, InitMerge::Deep);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);

        let config = StoreConfig::from_json("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_from_json_rejects_empty_key() {
        let err = StoreConfig::from_json(r#"{ "storage_key": "" }"#).unwrap_err();
        assert!(matches!(err, StateError::Config(_)));
    }

    #[test]
    fn test_merge_from_str() {
        assert_eq!(InitMerge::from_str("Deep"), Some(InitMerge::Deep));
        assert_eq!(InitMerge::from_str("shallow"), Some(InitMerge::Shallow));
        assert_eq!(InitMerge::from_str("wide"), None);
        assert_eq!(InitMerge::Deep.as_str(), "deep");
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::default()
            .with_storage_key("other")
            .with_merge(InitMerge::Deep)
            .with_pretty(true);
        assert_eq!(config.storage_key, "other");
        assert_eq!(config.merge, InitMerge::Deep);
        assert!(config.pretty);
    }
}
