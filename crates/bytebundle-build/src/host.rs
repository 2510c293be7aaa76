//! Seams between the orchestrator and the host build system
//!
//! The host drives a build through [`BuildHooks`] and exposes the small part
//! of its module graph the orchestrator is allowed to touch through
//! [`ModuleGraph`].

use crate::asset::AssetMap;
use crate::error::BuildResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// What the host knows when a build session starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContext {
    /// The host's own project root, if it has one
    pub context: Option<PathBuf>,
}

impl HostContext {
    /// Host context with a project root
    pub fn with_context(context: impl Into<PathBuf>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }
}

/// Graph-wide operations used to schedule the extra seal pass
pub trait ModuleGraph {
    /// Forget computed usage and export information for every module
    fn reset_usage_info(&mut self);

    /// Mark the graph as needing to be sealed again
    fn unseal(&mut self);
}

/// Lifecycle hooks a host calls during one build
///
/// Call order per build: `on_session_start`, discovery, then `on_optimize`
/// followed by `needs_additional_seal` until it answers false, then
/// `on_emit_assets`.
#[async_trait(?Send)]
pub trait BuildHooks {
    /// A new build begins; all per-build state is replaced
    fn on_session_start(&mut self, host: &HostContext) -> BuildResult<()>;

    /// The module graph is otherwise final; the host waits for completion
    async fn on_optimize(&mut self) -> BuildResult<()>;

    /// Polled after each optimize pass; true asks for one more full pass
    fn needs_additional_seal(&mut self, graph: &mut dyn ModuleGraph) -> bool;

    /// Contribute output assets; returns how many were written
    fn on_emit_assets(&mut self, assets: &mut AssetMap) -> usize;
}
