//! Hierarchical YAML configuration ingestion.
//!
//! Peripheral to the supervision core by design — the service reads a
//! hierarchical key/value configuration from a single YAML document and
//! never re-parses it at each access site. Two access styles are supported:
//! flattened dot-separated keys for scalar leaves (`run.httpserver.port`),
//! and typed `serde::Deserialize` sections for the nested process/preset
//! definitions the controller bootstraps from.

mod loader;
mod value;

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;

pub use value::{ConfigValue, FromConfigValue};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading the config file.
    Load(String),
    /// A typed section failed to deserialize.
    Section { path: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "config load error: {msg}"),
            ConfigError::Section { path, message } => {
                write!(f, "config section '{path}' failed to deserialize: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A loaded configuration document.
///
/// Resolution happens once, at construction: the YAML document is parsed
/// and flattened into dot-separated keys for scalar access, while the raw
/// tree is retained for typed section deserialization.
#[derive(Debug, Clone)]
pub struct OverseerConfig {
    root: serde_yaml::Value,
    values: HashMap<String, ConfigValue>,
}

impl OverseerConfig {
    /// Load configuration from a YAML file on disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        let root = loader::load_yaml_file(path, &mut values)?;
        Ok(OverseerConfig { root, values })
    }

    /// Parse configuration from a YAML string (used by tests and `--config -`).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        let root = loader::load_yaml_str(yaml, &mut values)?;
        Ok(OverseerConfig { root, values })
    }

    /// An empty configuration document (used by tests).
    pub fn empty() -> Self {
        OverseerConfig {
            root: serde_yaml::Value::Null,
            values: HashMap::new(),
        }
    }

    /// Get a typed scalar value for a dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed scalar value, falling back to `default` if the key is
    /// absent or malformed.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Whether a flattened key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Deserialize a nested section at a dot-separated path into a typed
    /// value (e.g. `Vec<ProcessDefinition>` at
    /// `"serviceconfig.controller.processes.process"`).
    ///
    /// Returns `Ok(None)` if the path does not exist in the document at all,
    /// so callers can distinguish "section omitted" from "section malformed".
    pub fn section<T: DeserializeOwned>(&self, dotted_path: &str) -> Result<Option<T>, ConfigError> {
        let mut cursor = &self.root;
        for segment in dotted_path.split('.') {
            match cursor {
                serde_yaml::Value::Mapping(map) => {
                    match map.get(serde_yaml::Value::String(segment.to_string())) {
                        Some(next) => cursor = next,
                        None => return Ok(None),
                    }
                }
                serde_yaml::Value::Null => return Ok(None),
                _ => return Ok(None),
            }
        }
        if matches!(cursor, serde_yaml::Value::Null) {
            return Ok(None);
        }
        serde_yaml::from_value(cursor.clone())
            .map(Some)
            .map_err(|e| ConfigError::Section {
                path: dotted_path.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn flattened_scalar_access() {
        let cfg = OverseerConfig::from_yaml_str(
            r#"
run:
  httpserver:
    port: 8080
    host: "0.0.0.0"
"#,
        )
        .unwrap();
        assert_eq!(cfg.get::<i64>("run.httpserver.port").unwrap(), 8080);
        assert_eq!(cfg.get::<String>("run.httpserver.host").unwrap(), "0.0.0.0");
    }

    #[test]
    fn missing_key_is_not_found() {
        let cfg = OverseerConfig::empty();
        assert!(matches!(
            cfg.get::<String>("missing.key"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct ProcEntry {
        name: String,
        executable: String,
    }

    #[test]
    fn typed_section_deserializes_nested_sequence() {
        let cfg = OverseerConfig::from_yaml_str(
            r#"
serviceconfig:
  controller:
    processes:
      process:
        - name: echo
          executable: /bin/echo
        - name: cat
          executable: /bin/cat
"#,
        )
        .unwrap();
        let procs: Vec<ProcEntry> = cfg
            .section("serviceconfig.controller.processes.process")
            .unwrap()
            .unwrap();
        assert_eq!(
            procs,
            vec![
                ProcEntry {
                    name: "echo".into(),
                    executable: "/bin/echo".into()
                },
                ProcEntry {
                    name: "cat".into(),
                    executable: "/bin/cat".into()
                },
            ]
        );
    }

    #[test]
    fn typed_section_absent_returns_none() {
        let cfg = OverseerConfig::empty();
        let procs: Option<Vec<ProcEntry>> = cfg
            .section("serviceconfig.controller.processes.process")
            .unwrap();
        assert!(procs.is_none());
    }
}
