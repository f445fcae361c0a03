//! Configuration - collection names and logging, loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::Record;
use crate::records::{CollegeTask, Exam, Purchase};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub collections: CollectionNames,
    pub logging: LoggingConfig,
}

/// Store collection per entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub exams: String,
    pub purchases: String,
    pub college_tasks: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            exams: Exam::COLLECTION.to_string(),
            purchases: Purchase::COLLECTION.to_string(),
            college_tasks: CollegeTask::COLLECTION.to_string(),
        }
    }
}

impl CollectionNames {
    /// Collection backing `R`. Types without an entry use `R::COLLECTION`.
    pub fn resolve<R: Record>(&self) -> &str {
        match R::COLLECTION {
            c if c == Exam::COLLECTION => self.exams.as_str(),
            c if c == Purchase::COLLECTION => self.purchases.as_str(),
            c if c == CollegeTask::COLLECTION => self.college_tasks.as_str(),
            other => other,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("exams", &self.exams),
            ("purchases", &self.purchases),
            ("college_tasks", &self.college_tasks),
        ];

        for (key, name) in names {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("collections.{key} must not be blank"),
                });
            }
        }

        for (i, (key, name)) in names.iter().enumerate() {
            if let Some((other, _)) = names[i + 1..].iter().find(|(_, n)| n == name) {
                return Err(ConfigError::ValidationError {
                    message: format!("collections.{key} and collections.{other} both use '{name}'"),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"tareas=debug"`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::ParseError { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise parses it as TOML and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Checks that collection names are non-blank and distinct.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collections.validate()
    }
}
