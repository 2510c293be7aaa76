//! bytebundle configuration
//!
//! Provides the plugin configuration for the template compilation pipeline:
//! - Plugin options (`bytebundle.toml` or built in code)
//! - Compiler mode names
//! - Configuration discovery, environment overrides and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Project config (nearest `bytebundle.toml` walking up from the start directory)
//! 2. Environment variables (BYTEBUNDLE_*)
//! 3. Options set in code by the embedding build host
//!
//! # Example
//!
//! ```no_run
//! use bytebundle_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("bytecode asset: {}", config.plugin.output);
//! ```

pub mod loader;
pub mod mode;
pub mod plugin;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("You must pass either a compiler mode or a compiler delegate, not both")]
    ConflictingCompiler,

    #[error("You must supply either a compiler mode or a compiler delegate")]
    MissingCompiler,

    #[error("Unknown compiler mode '{0}' (expected one of: {modes})", modes = mode::CompilerMode::NAMES.join(", "))]
    UnknownMode(String),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use mode::CompilerMode;
pub use plugin::{BuiltinKind, BuiltinSpec, PluginConfig, DEFAULT_DATA_SEGMENT};
