//! Per-session template bundle
//!
//! Collects the components and precompiled programs discovered during one
//! build and hands them to the session's compiler delegate.

use crate::delegate::{
    AstEntry, BundleInput, CompiledOutput, CompilerDelegate, ComponentEntry, DelegateConfig,
    TemplateScope,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Templates registered for one build, plus the delegate that compiles them
pub struct Bundle {
    project_root: PathBuf,
    delegate: Box<dyn CompilerDelegate>,
    components: Vec<ComponentEntry>,
    asts: Vec<AstEntry>,
}

impl Bundle {
    /// Create a bundle with a fresh delegate bound to `project_root`
    pub fn new(config: &DelegateConfig, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let delegate = config.bind(project_root.clone());
        Self::with_delegate(project_root, delegate)
    }

    /// Create a bundle around an already constructed delegate
    pub fn with_delegate(project_root: impl Into<PathBuf>, delegate: Box<dyn CompilerDelegate>) -> Self {
        Self {
            project_root: project_root.into(),
            delegate,
            components: Vec::new(),
            asts: Vec::new(),
        }
    }

    /// Register a component template
    pub fn add_component(&mut self, path: impl Into<PathBuf>, template: impl Into<String>, scope: TemplateScope) {
        self.components.push(ComponentEntry {
            path: path.into(),
            template: template.into(),
            scope,
        });
    }

    /// Register a precompiled template program
    pub fn add_ast(&mut self, path: impl Into<PathBuf>, ast: serde_json::Value) {
        self.asts.push(AstEntry {
            path: path.into(),
            ast,
        });
    }

    /// Compile everything registered so far
    pub async fn compile(&mut self) -> anyhow::Result<CompiledOutput> {
        let input = BundleInput {
            components: &self.components,
            asts: &self.asts,
        };
        self.delegate.compile_bundle(&input).await
    }

    /// Project root the delegate is bound to
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Registered component templates
    pub fn components(&self) -> &[ComponentEntry] {
        &self.components
    }

    /// Registered precompiled programs
    pub fn asts(&self) -> &[AstEntry] {
        &self.asts
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("project_root", &self.project_root)
            .field("components", &self.components.len())
            .field("asts", &self.asts.len())
            .finish_non_exhaustive()
    }
}
