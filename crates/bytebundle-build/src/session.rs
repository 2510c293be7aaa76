//! Build session state
//!
//! Everything scoped to one host build lives here and is replaced wholesale
//! when the next build starts, so nothing from a previous watch iteration can
//! leak into the next one.

use crate::bundle::Bundle;
use crate::delegate::{CompiledOutput, TemplateScope};
use crate::placeholder::{PlaceholderHandle, PlaceholderRegistry};
use crate::reseal::ResealGuard;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Component templates registered
    pub components: usize,
    /// Precompiled programs registered
    pub asts: usize,
    /// Placeholder registrations
    pub placeholders: usize,
    /// Placeholders rebuilt after the rewrite
    pub rebuilt_modules: usize,
    /// Size of the compiled bytecode
    pub bytecode_size: usize,
    /// Time spent in the delegate
    pub compile_time: Duration,
}

/// State of one build
#[derive(Debug)]
pub struct BuildSession {
    pub(crate) id: u64,
    pub(crate) bundle: Bundle,
    pub(crate) placeholders: PlaceholderRegistry,
    pub(crate) guard: ResealGuard,
    pub(crate) compile_attempted: bool,
    pub(crate) compiled: Option<Rc<CompiledOutput>>,
    pub(crate) pending_emit: Option<Rc<CompiledOutput>>,
    pub(crate) reseal_armed: bool,
    pub(crate) stats: SessionStats,
}

impl BuildSession {
    /// Start a session around a fresh bundle
    pub fn new(id: u64, bundle: Bundle) -> Self {
        Self {
            id,
            bundle,
            placeholders: PlaceholderRegistry::new(),
            guard: ResealGuard::new(),
            compile_attempted: false,
            compiled: None,
            pending_emit: None,
            reseal_armed: false,
            stats: SessionStats::default(),
        }
    }

    /// Session id, increasing across builds of one plugin instance
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Project root of this build
    pub fn project_root(&self) -> &Path {
        self.bundle.project_root()
    }

    /// The session's bundle
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// Placeholder modules registered so far
    pub fn placeholders(&self) -> &PlaceholderRegistry {
        &self.placeholders
    }

    /// Whether the extra seal pass has been granted
    pub fn reseal_granted(&self) -> bool {
        self.guard.is_tripped()
    }

    /// Compiled output, once the bundle has been compiled
    pub fn compiled(&self) -> Option<&CompiledOutput> {
        self.compiled.as_deref()
    }

    /// Statistics gathered so far
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Borrow the session for discovery collaborators
    pub fn discovery(&mut self) -> Discovery<'_> {
        Discovery { session: self }
    }
}

/// Registration surface handed to the loaders that discover templates
///
/// Borrows the active session directly, so registrations always land in the
/// build that is currently running.
pub struct Discovery<'a> {
    session: &'a mut BuildSession,
}

impl Discovery<'_> {
    /// Mark a module as a data segment placeholder
    pub fn register_placeholder(&mut self, module: PlaceholderHandle) {
        tracing::trace!(session = self.session.id, module = %module.id(), "placeholder registered");
        self.session.placeholders.register(module);
        self.session.stats.placeholders += 1;
    }

    /// Register a component template
    pub fn register_component(
        &mut self,
        path: impl Into<PathBuf>,
        template: impl Into<String>,
        scope: TemplateScope,
    ) {
        self.session.bundle.add_component(path, template, scope);
        self.session.stats.components += 1;
    }

    /// Register a precompiled template program
    pub fn register_ast(&mut self, path: impl Into<PathBuf>, ast: serde_json::Value) {
        self.session.bundle.add_ast(path, ast);
        self.session.stats.asts += 1;
    }
}
