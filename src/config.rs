use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("identifier")
            .with_message("must be a plain Cypher identifier".into()))
    }
}

fn validate_suffix(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("suffix")
            .with_message("may only contain letters, digits and underscores".into()))
    }
}

/// Naming conventions the Cypher grammar renders with
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrammarConfig {
    /// Property name callers use for a node's identity (`where_in("id", ..)`)
    #[validate(custom(function = "validate_identifier"))]
    pub identity_column: String,

    /// Function that reads a node's identity, rendered as `id(alias)`
    #[validate(custom(function = "validate_identifier"))]
    pub identity_function: String,

    /// Column name the aggregate projection is returned under
    #[validate(custom(function = "validate_identifier"))]
    pub aggregate_alias: String,

    /// Alias used when a label set is empty
    #[validate(custom(function = "validate_identifier"))]
    pub fallback_node_alias: String,

    /// Suffix appended to update payload keys so they never shadow query bindings
    #[validate(
        length(min = 1, message = "Update suffix cannot be empty"),
        custom(function = "validate_suffix")
    )]
    pub update_suffix: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            identity_column: "id".to_string(),
            identity_function: "id".to_string(),
            aggregate_alias: "aggregate".to_string(),
            fallback_node_alias: "n".to_string(),
            update_suffix: "_update".to_string(),
        }
    }
}

impl GrammarConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            identity_column: env_or("CYPHER_BUILDER_IDENTITY_COLUMN", defaults.identity_column),
            identity_function: env_or(
                "CYPHER_BUILDER_IDENTITY_FUNCTION",
                defaults.identity_function,
            ),
            aggregate_alias: env_or("CYPHER_BUILDER_AGGREGATE_ALIAS", defaults.aggregate_alias),
            fallback_node_alias: env_or(
                "CYPHER_BUILDER_FALLBACK_NODE_ALIAS",
                defaults.fallback_node_alias,
            ),
            update_suffix: env_or("CYPHER_BUILDER_UPDATE_SUFFIX", defaults.update_suffix),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}
