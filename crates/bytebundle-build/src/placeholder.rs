//! Data segment placeholder modules
//!
//! A placeholder is a module in the host's graph whose final source is the
//! compiled data segment rather than whatever the loader produced. The host
//! keeps ownership of the module; this crate only sees it through
//! [`PlaceholderModule`].

use async_trait::async_trait;
use std::fmt;
use std::rc::Rc;

/// Narrow view of a host module that receives the data segment
///
/// Implementations use interior mutability: the host owns the module and the
/// build is single-threaded, so `set_source` takes `&self`.
#[async_trait(?Send)]
pub trait PlaceholderModule {
    /// Stable identifier used in logs and errors (usually the resource path)
    fn id(&self) -> String;

    /// Current source content
    fn source(&self) -> String;

    /// Replace the source content
    fn set_source(&self, source: &str);

    /// Re-run the host's transform pipeline on the current source
    async fn rebuild(&self) -> anyhow::Result<()>;
}

/// Shared handle to a placeholder module
pub type PlaceholderHandle = Rc<dyn PlaceholderModule>;

/// Placeholder modules registered during one build session
///
/// Registration order is kept. Duplicates are kept too: rewriting is
/// idempotent, so a module registered twice simply gets the same source twice.
#[derive(Default)]
pub struct PlaceholderRegistry {
    modules: Vec<PlaceholderHandle>,
}

impl PlaceholderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a placeholder module
    pub fn register(&mut self, module: PlaceholderHandle) {
        self.modules.push(module);
    }

    /// Registered modules in registration order
    pub fn modules(&self) -> &[PlaceholderHandle] {
        &self.modules
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for PlaceholderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| m.id()))
            .finish()
    }
}
