//! Configuration Loader
//!
//! Handles locating `bytebundle.toml` and applying environment overrides.

use crate::plugin::PluginConfig;
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the plugin configuration file
pub const CONFIG_FILE_NAME: &str = "bytebundle.toml";

/// Configuration loader
///
/// Loads configuration and merges it with proper precedence:
/// 1. Project config (bytebundle.toml) - lowest priority
/// 2. Environment variables (BYTEBUNDLE_*) - overrides project
/// 3. Options set in code - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides
    ignore_env: bool,
}

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Plugin options
    pub plugin: PluginConfig,

    /// Directory containing the configuration file
    pub config_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Disable environment variable overrides
    pub fn without_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find bytebundle.toml.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let config_path = Self::find_config_file(start_dir)
            .ok_or_else(|| ConfigError::NotFound(start_dir.join(CONFIG_FILE_NAME)))?;

        self.load_from_file(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let plugin = PluginConfig::load_from_file(config_path)?;
        let plugin = self.apply_env_overrides(plugin)?;

        Ok(Config {
            plugin,
            config_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find the nearest config file by walking up the directory tree
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Apply environment variable overrides to plugin options
    ///
    /// Recognized variables: BYTEBUNDLE_OUTPUT, BYTEBUNDLE_MODE, BYTEBUNDLE_CONTEXT
    fn apply_env_overrides(&self, mut config: PluginConfig) -> ConfigResult<PluginConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        if let Ok(output) = env::var("BYTEBUNDLE_OUTPUT") {
            config.output = output;
        }

        if let Ok(mode) = env::var("BYTEBUNDLE_MODE") {
            config.mode = Some(mode);
        }

        if let Ok(context) = env::var("BYTEBUNDLE_CONTEXT") {
            config.context = Some(PathBuf::from(context));
        }

        // Overrides go through the same checks as the file itself
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Get the configured project root
    ///
    /// A relative `context` is resolved against the directory holding the
    /// configuration file.
    pub fn context(&self) -> Option<PathBuf> {
        let context = self.plugin.context.as_ref()?;
        match &self.config_root {
            Some(root) if context.is_relative() => Some(root.join(context)),
            _ => Some(context.clone()),
        }
    }

    /// Plugin options with `context` resolved to an absolute-from-root path
    pub fn resolved_plugin(&self) -> PluginConfig {
        let mut plugin = self.plugin.clone();
        plugin.context = self.context();
        plugin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    fn test_load_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), r#"output = "templates.gbx""#);

        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert_eq!(config.plugin.output, "templates.gbx");
        assert_eq!(config.config_root.as_deref(), Some(temp_dir.path()));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), r#"output = "parent.gbx""#);

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(&sub_dir)
            .unwrap();

        assert_eq!(config.plugin.output, "parent.gbx");
    }

    #[test]
    fn test_relative_context_resolves_against_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
output = "templates.gbx"
context = "app"
"#,
        );

        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert_eq!(config.context(), Some(temp_dir.path().join("app")));
        assert_eq!(config.resolved_plugin().context, Some(temp_dir.path().join("app")));
    }

    #[test]
    #[serial]
    fn test_env_override_mode() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), r#"output = "templates.gbx""#);

        env::set_var("BYTEBUNDLE_MODE", "module-unification");

        let config = ConfigLoader::new().load_from_directory(temp_dir.path());

        env::remove_var("BYTEBUNDLE_MODE");

        assert_eq!(
            config.unwrap().plugin.mode.as_deref(),
            Some("module-unification")
        );
    }

    #[test]
    #[serial]
    fn test_env_override_is_validated() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), r#"output = "templates.gbx""#);

        env::set_var("BYTEBUNDLE_OUTPUT", "../escape.gbx");

        let result = ConfigLoader::new().load_from_directory(temp_dir.path());

        env::remove_var("BYTEBUNDLE_OUTPUT");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
