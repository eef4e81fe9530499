//! Layered configuration.
//!
//! Resolution order, later layers winning:
//! 1. built-in defaults ([`Settings::default`]);
//! 2. the base YAML file (`configuration/default.yaml` unless told otherwise);
//! 3. an override YAML file named by the `ML_OPS_CONFIG` environment variable;
//! 4. one environment variable per key, e.g. `UPDATE_DATA=True`.
//!
//! Environment values are parsed as literals, so `TEST_SIZE=0.25` is a number
//! and `DATA_PATH=/srv/data.xlsx` stays a string.

use crate::literal::parse_override;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming an override configuration file.
pub const OVERRIDE_ENV: &str = "ML_OPS_CONFIG";

/// Base configuration file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "configuration/default.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Runtime settings shared by the CLI, the workflows and the REST service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Settings {
    /// Database URL: `sqlite:///relative.db`, `sqlite:////abs.db` or `:memory:`.
    pub sqlalchemy_database: String,
    pub data_path: PathBuf,
    pub estimated_models_path: PathBuf,
    pub model_parameters_path: PathBuf,
    pub storage_path: PathBuf,
    pub prediction_path: PathBuf,
    #[serde(deserialize_with = "flag")]
    pub update_data: bool,
    #[serde(deserialize_with = "flag")]
    pub debug: bool,
    pub bind_address: String,
    pub target: String,
    pub test_size: f64,
    pub random_state: Option<u64>,
    pub scrape_base_url: String,
    pub scrape_reference_page: String,
    pub scrape_output_path: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sqlalchemy_database: "sqlite:///data/indicators.db".to_string(),
            data_path: PathBuf::from("data/dataset/data.xlsx"),
            estimated_models_path: PathBuf::from("res/estimated_models"),
            model_parameters_path: PathBuf::from("data/parameters"),
            storage_path: PathBuf::from("res/split_storage"),
            prediction_path: PathBuf::from("res/prediction"),
            update_data: false,
            debug: false,
            bind_address: "127.0.0.1:5000".to_string(),
            target: "edu_index".to_string(),
            test_size: 0.3,
            random_state: None,
            scrape_base_url: "http://indicators.miccedu.ru/monitoring/2019/".to_string(),
            scrape_reference_page: "_vpo/inst.php?id=1944".to_string(),
            scrape_output_path: PathBuf::from("data/dataset/data.xlsx"),
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Loads settings from `base` and the process environment.
    pub fn load(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(base, |key| std::env::var(key).ok())
    }

    /// Loads settings with an explicit environment lookup.
    pub fn load_with_env(
        base: impl AsRef<Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut merged = match serde_yaml::to_value(Settings::default())? {
            Value::Mapping(map) => map,
            _ => return Err(ConfigError::ParseError("defaults are not a mapping".into())),
        };

        let base = base.as_ref();
        if base.exists() {
            merge(&mut merged, read_mapping(base)?);
        } else {
            warn!(path = %base.display(), "config file not found, using defaults");
        }

        if let Some(raw) = env(OVERRIDE_ENV) {
            let path = match parse_override(&raw) {
                serde_json::Value::String(s) => PathBuf::from(s),
                other => PathBuf::from(other.to_string()),
            };
            debug!(path = %path.display(), "applying override config");
            merge(&mut merged, read_mapping(&path)?);
        }

        let keys: Vec<String> = merged
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect();
        for key in keys {
            if let Some(raw) = env(&key) {
                debug!(key = %key, "environment override");
                let value = serde_yaml::to_value(parse_override(&raw))?;
                merged.insert(Value::String(key), value);
            }
        }

        let settings: Settings = serde_yaml::from_value(Value::Mapping(merged))?;
        settings.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        for (path, fallback) in [
            (&mut self.data_path, defaults.data_path),
            (&mut self.estimated_models_path, defaults.estimated_models_path),
            (&mut self.model_parameters_path, defaults.model_parameters_path),
            (&mut self.storage_path, defaults.storage_path),
            (&mut self.prediction_path, defaults.prediction_path),
            (&mut self.scrape_output_path, defaults.scrape_output_path),
        ] {
            if path.as_os_str().is_empty() {
                *path = fallback;
            }
        }

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "TEST_SIZE must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.target.trim().is_empty() {
            return Err(ConfigError::ValidationError("TARGET must not be empty".into()));
        }
        Ok(self)
    }
}

fn read_mapping(path: &Path) -> Result<Mapping, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::ParseError(format!(
            "{} is not a key/value document",
            path.display()
        ))),
    }
}

fn merge(target: &mut Mapping, layer: Mapping) {
    for (key, value) in layer {
        target.insert(key, value);
    }
}

/// Accepts `true`/`false`, integers and their string spellings.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Int(i) => Ok(i != 0),
        Raw::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("not a boolean flag: {other}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_yaml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load_with_env("/nonexistent/config.yaml", env_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_base_file_overrides_defaults() {
        let file = write_yaml("DATA_PATH: /srv/data.xlsx\nUPDATE_DATA: true\nTEST_SIZE: 0.2\n");
        let settings = Settings::load_with_env(file.path(), env_from(&[])).unwrap();
        assert_eq!(settings.data_path, PathBuf::from("/srv/data.xlsx"));
        assert!(settings.update_data);
        assert_eq!(settings.test_size, 0.2);
        assert_eq!(settings.target, "edu_index");
    }

    #[test]
    fn test_override_file_then_env() {
        let base = write_yaml("DEBUG: false\nBIND_ADDRESS: 0.0.0.0:8000\n");
        let overlay = write_yaml("DEBUG: true\nSTORAGE_PATH: /tmp/splits\n");
        let overlay_path = overlay.path().display().to_string();
        let env = env_from(&[
            (OVERRIDE_ENV, overlay_path.as_str()),
            ("STORAGE_PATH", "'/var/splits'"),
            ("RANDOM_STATE", "7"),
            ("UPDATE_DATA", "1"),
        ]);

        let settings = Settings::load_with_env(base.path(), env).unwrap();
        assert!(settings.debug);
        assert!(settings.update_data);
        assert_eq!(settings.bind_address, "0.0.0.0:8000");
        assert_eq!(settings.storage_path, PathBuf::from("/var/splits"));
        assert_eq!(settings.random_state, Some(7));
    }

    #[test]
    fn test_empty_paths_fall_back() {
        let file = write_yaml("ESTIMATED_MODELS_PATH: ''\n");
        let settings = Settings::load_with_env(file.path(), env_from(&[])).unwrap();
        assert_eq!(
            settings.estimated_models_path,
            PathBuf::from("res/estimated_models")
        );
    }

    #[test]
    fn test_invalid_test_size_rejected() {
        let file = write_yaml("TEST_SIZE: 1.5\n");
        let result = Settings::load_with_env(file.path(), env_from(&[]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_override_file_is_error() {
        let env = env_from(&[(OVERRIDE_ENV, "/nonexistent/override.yaml")]);
        let result = Settings::load_with_env("/nonexistent/config.yaml", env);
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
