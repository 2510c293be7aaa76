//! Compiler delegates and their configuration
//!
//! The delegate is the strategy that turns the templates collected in a
//! [`Bundle`](crate::bundle::Bundle) into bytecode plus a data segment. It is
//! picked once per plugin instance, either by naming a built-in mode or by
//! handing over a constructor, and instantiated fresh for every build session.

use crate::module_unification::ModuleUnificationDelegate;
use async_trait::async_trait;
use bytebundle_config::{BuiltinSpec, CompilerMode, ConfigError, ConfigResult, PluginConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Export name the entry template is expected under
pub const MAIN_TEMPLATE_EXPORT: &str = "mainTemplate";

/// Names in a component template's lexical scope, mapped to module specifiers
pub type TemplateScope = BTreeMap<String, String>;

/// A component template registered during discovery
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEntry {
    pub path: PathBuf,
    pub template: String,
    pub scope: TemplateScope,
}

/// A precompiled template program registered during discovery
#[derive(Debug, Clone, PartialEq)]
pub struct AstEntry {
    pub path: PathBuf,
    pub ast: serde_json::Value,
}

/// Everything a delegate compiles in one go
#[derive(Debug, Clone, Copy)]
pub struct BundleInput<'a> {
    pub components: &'a [ComponentEntry],
    pub asts: &'a [AstEntry],
}

/// Result of compiling a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    /// Bytecode written as the output asset
    pub bytecode: Vec<u8>,
    /// Source text injected into every placeholder module
    pub data_segment: String,
}

/// Locates the entry template: a module path plus the export holding it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTemplateLocator {
    pub module: String,
    pub name: String,
}

impl MainTemplateLocator {
    /// Locator for the well-known main template export of `module`
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: MAIN_TEMPLATE_EXPORT.to_string(),
        }
    }
}

/// Names of the files a compiled bundle is split into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub data_segment: String,
    pub bytecode: String,
}

/// Everything a delegate is constructed with
#[derive(Debug, Clone, PartialEq)]
pub struct DelegateOptions {
    pub project_root: PathBuf,
    pub output_files: OutputFiles,
    pub builtins: BTreeMap<String, BuiltinSpec>,
    pub main_locator: Option<MainTemplateLocator>,
}

/// Strategy that compiles a bundle of templates
#[async_trait(?Send)]
pub trait CompilerDelegate {
    /// Compile every registered template into bytecode and a data segment
    async fn compile_bundle(&mut self, input: &BundleInput<'_>) -> anyhow::Result<CompiledOutput>;
}

/// Constructor for a custom delegate
pub type DelegateCtor = Rc<dyn Fn(DelegateOptions) -> Box<dyn CompilerDelegate>>;

/// Which delegate a plugin instance uses
#[derive(Clone)]
pub enum CompilerSelection {
    /// A built-in strategy named by `mode`
    Mode(CompilerMode),
    /// A constructor supplied by the embedder
    Custom(DelegateCtor),
}

impl CompilerSelection {
    /// Pick the delegate from a mode name or a constructor, never both
    pub fn resolve(mode: Option<&str>, custom: Option<DelegateCtor>) -> ConfigResult<Self> {
        match (mode, custom) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingCompiler),
            (None, None) => Err(ConfigError::MissingCompiler),
            (Some(mode), None) => Ok(Self::Mode(mode.parse()?)),
            (None, Some(ctor)) => Ok(Self::Custom(ctor)),
        }
    }

    /// Build a delegate instance
    pub fn instantiate(&self, options: DelegateOptions) -> Box<dyn CompilerDelegate> {
        match self {
            Self::Mode(CompilerMode::ModuleUnification) => {
                Box::new(ModuleUnificationDelegate::new(options))
            }
            Self::Custom(ctor) => ctor(options),
        }
    }
}

impl fmt::Debug for CompilerSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(mode) => f.debug_tuple("Mode").field(mode).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Delegate configuration, resolved once per plugin instance
#[derive(Debug, Clone)]
pub struct DelegateConfig {
    pub selection: CompilerSelection,
    pub output_files: OutputFiles,
    pub builtins: BTreeMap<String, BuiltinSpec>,
    pub main_locator: Option<MainTemplateLocator>,
}

impl DelegateConfig {
    /// Resolve the delegate configuration from plugin options
    pub fn resolve(config: &PluginConfig, custom: Option<DelegateCtor>) -> ConfigResult<Self> {
        config.validate()?;
        let selection = CompilerSelection::resolve(config.mode.as_deref(), custom)?;

        Ok(Self {
            selection,
            output_files: OutputFiles {
                data_segment: config.data_segment_name().to_string(),
                bytecode: config.output.clone(),
            },
            builtins: config.builtins.clone(),
            main_locator: config.main_path.clone().map(MainTemplateLocator::for_module),
        })
    }

    /// Construct a delegate bound to a project root
    pub fn bind(&self, project_root: impl Into<PathBuf>) -> Box<dyn CompilerDelegate> {
        self.selection.instantiate(DelegateOptions {
            project_root: project_root.into(),
            output_files: self.output_files.clone(),
            builtins: self.builtins.clone(),
            main_locator: self.main_locator.clone(),
        })
    }
}
