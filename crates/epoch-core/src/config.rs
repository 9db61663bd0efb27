//! Epoch Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with defaults matching the inference policy.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EpochConfig {
    /// Where person records and run artifacts live
    pub storage: StorageConfig,

    /// Numeric inference policy
    pub inference: InferenceConfig,

    /// Century output settings
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl EpochConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Storage
        if let Ok(dir) = std::env::var("EPOCH_PERSONS_DIR") {
            config.storage.persons_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("EPOCH_KB_PATH") {
            config.storage.kb_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("EPOCH_OUTPUT_PATH") {
            config.storage.output_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("EPOCH_SUMMARY_PATH") {
            config.storage.summary_path = Some(PathBuf::from(path));
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            config.logging.json_format = parse_bool("LOG_JSON", &json)?;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.inference.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = StorageConfig::default();

        // Only override if env values differ from defaults
        if env_config.storage.persons_dir != defaults.persons_dir {
            self.storage.persons_dir = env_config.storage.persons_dir;
        }
        if env_config.storage.kb_path != defaults.kb_path {
            self.storage.kb_path = env_config.storage.kb_path;
        }
        if env_config.storage.output_path != defaults.output_path {
            self.storage.output_path = env_config.storage.output_path;
        }
        if env_config.storage.summary_path.is_some() {
            self.storage.summary_path = env_config.storage.summary_path;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json_format = parse_bool("LOG_JSON", &json)?;
        }

        Ok(self)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the hash-sharded person records
    pub persons_dir: PathBuf,

    /// Identifier prefix of person records
    pub person_prefix: String,

    /// Extension of person record files
    pub file_extension: String,

    /// Knowledge base snapshot path
    pub kb_path: PathBuf,

    /// Century associations output path
    pub output_path: PathBuf,

    /// Optional JSON run summary path
    pub summary_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persons_dir: PathBuf::from("persons"),
            person_prefix: "P".to_string(),
            file_extension: "json".to_string(),
            kb_path: PathBuf::from("kb.json"),
            output_path: PathBuf::from("centuries.ttl"),
            summary_path: None,
        }
    }
}

/// Numeric parameters of the inference policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Years between birth and the start of the productive era
    pub birth_productive_offset: i32,

    /// Generation gap used for kinship and teacher/student links
    pub kinship_offset: i32,

    /// Gap between an incarnation and its successor
    pub incarnation_offset: i32,

    /// Largest century span still trusted
    pub max_century_span: i32,

    /// Below this years-in-first / years-in-second ratio only the later century is kept
    pub split_ratio_low: f64,

    /// Above this ratio only the earlier century is kept
    pub split_ratio_high: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            birth_productive_offset: 15,
            kinship_offset: 20,
            incarnation_offset: 30,
            max_century_span: 3,
            split_ratio_low: 0.2,
            split_ratio_high: 5.0,
        }
    }
}

impl InferenceConfig {
    /// Reject parameter combinations the classifier cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_century_span < 1 {
            return Err(ConfigError::InvalidValue {
                key: "inference.max_century_span".to_string(),
                value: self.max_century_span.to_string(),
            });
        }
        if !(self.split_ratio_low > 0.0 && self.split_ratio_low <= self.split_ratio_high) {
            return Err(ConfigError::InvalidValue {
                key: "inference.split_ratio_low".to_string(),
                value: self.split_ratio_low.to_string(),
            });
        }
        Ok(())
    }
}

/// Turtle output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix used for person resources
    pub resource_prefix: String,

    /// Namespace IRI of person resources
    pub resource_namespace: String,

    /// Prefix used for the century property
    pub property_prefix: String,

    /// Namespace IRI of the century property
    pub property_namespace: String,

    /// Local name of the century property
    pub century_property: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            resource_prefix: "bdr".to_string(),
            resource_namespace: "http://purl.bdrc.io/resource/".to_string(),
            property_prefix: "tmp".to_string(),
            property_namespace: "http://purl.bdrc.io/ontology/tmp/".to_string(),
            century_property: "associatedCentury".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
