//! Plugin Configuration (bytebundle.toml)
//!
//! The options the template compilation plugin is instantiated with. The same
//! structure is read from `bytebundle.toml` or filled in directly by an
//! embedding build host.

use crate::mode::CompilerMode;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Default file name of the generated data segment module
pub const DEFAULT_DATA_SEGMENT: &str = "table.js";

/// Plugin options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Output asset file name for the compiled bytecode
    pub output: String,

    /// Project root; falls back to the host's context when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,

    /// Named built-in compiler strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Runtime builtins made available to templates
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub builtins: BTreeMap<String, BuiltinSpec>,

    /// Module path of the entry template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_path: Option<String>,

    /// File name of the generated data segment module (default: "table.js")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_segment: Option<String>,
}

/// A builtin exposed to templates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuiltinSpec {
    /// Module specifier providing the builtin
    pub module: String,

    /// Export name inside the module (default: "default")
    #[serde(default = "default_export")]
    pub export: String,

    /// What the builtin is used as
    pub kind: BuiltinKind,
}

fn default_export() -> String {
    "default".to_string()
}

/// Kind of builtin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinKind {
    Helper,
    Modifier,
    Component,
}

impl BuiltinSpec {
    /// Create a builtin using the module's default export
    pub fn new(module: impl Into<String>, kind: BuiltinKind) -> Self {
        Self {
            module: module.into(),
            export: default_export(),
            kind,
        }
    }

    /// Set the export name
    pub fn with_export(mut self, export: impl Into<String>) -> Self {
        self.export = export.into();
        self
    }
}

impl PluginConfig {
    /// Create options for the given bytecode output name
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            context: None,
            mode: None,
            builtins: BTreeMap::new(),
            main_path: None,
            data_segment: None,
        }
    }

    /// Set the project root
    pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set the compiler mode
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the entry template module path
    pub fn with_main_path(mut self, main_path: impl Into<String>) -> Self {
        self.main_path = Some(main_path.into());
        self
    }

    /// Add a builtin
    pub fn with_builtin(mut self, name: impl Into<String>, spec: BuiltinSpec) -> Self {
        self.builtins.insert(name.into(), spec);
        self
    }

    /// Set the data segment file name
    pub fn with_data_segment(mut self, name: impl Into<String>) -> Self {
        self.data_segment = Some(name.into());
        self
    }

    /// Load plugin options from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the options
    ///
    /// Only the shape of each value is checked here. Whether a compiler is
    /// actually available is decided when the plugin is instantiated, since an
    /// explicit delegate can only be supplied in code.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_file_name("output", &self.output)?;

        if let Some(name) = &self.data_segment {
            validate_file_name("data_segment", name)?;
        }

        if let Some(mode) = &self.mode {
            if mode.is_empty() {
                return Err(ConfigError::invalid_value("mode", "mode cannot be empty"));
            }
        }

        if let Some(main_path) = &self.main_path {
            if main_path.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "main_path",
                    "main path cannot be empty",
                ));
            }
        }

        for (name, spec) in &self.builtins {
            validate_builtin(name, spec)?;
        }

        Ok(())
    }

    /// Parse the configured mode, if any
    pub fn compiler_mode(&self) -> ConfigResult<Option<CompilerMode>> {
        self.mode.as_deref().map(str::parse).transpose()
    }

    /// Get the effective data segment file name
    pub fn data_segment_name(&self) -> &str {
        self.data_segment.as_deref().unwrap_or(DEFAULT_DATA_SEGMENT)
    }

    /// Merge another config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &PluginConfig) {
        if !other.output.is_empty() {
            self.output = other.output.clone();
        }
        if other.context.is_some() {
            self.context = other.context.clone();
        }
        if other.mode.is_some() {
            self.mode = other.mode.clone();
        }
        if !other.builtins.is_empty() {
            self.builtins.extend(other.builtins.clone());
        }
        if other.main_path.is_some() {
            self.main_path = other.main_path.clone();
        }
        if other.data_segment.is_some() {
            self.data_segment = other.data_segment.clone();
        }
    }
}

/// Asset names are relative, forward-only paths
fn validate_file_name(field: &str, name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::invalid_value(field, "file name cannot be empty"));
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return Err(ConfigError::invalid_value(
            field,
            format!("'{}' must be relative to the output directory", name),
        ));
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ConfigError::invalid_value(
            field,
            format!("'{}' cannot leave the output directory", name),
        ));
    }

    Ok(())
}

fn validate_builtin(name: &str, spec: &BuiltinSpec) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::invalid_value(
            "builtin name",
            "name cannot be empty",
        ));
    }

    if spec.module.is_empty() {
        return Err(ConfigError::invalid_value(
            format!("builtins.{}", name),
            "module cannot be empty",
        ));
    }

    if spec.export.is_empty() {
        return Err(ConfigError::invalid_value(
            format!("builtins.{}", name),
            "export cannot be empty",
        ));
    }

    Ok(())
}
