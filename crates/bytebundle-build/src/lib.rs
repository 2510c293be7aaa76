//! bytebundle build orchestration
//!
//! Splices compiled templates into a bundler's build graph:
//! - Template and placeholder registration per build session
//! - Exactly-once bundle compilation through a swappable compiler delegate
//! - Placeholder rewrite and rebuild gate
//! - A single bounded extra seal pass
//! - Bytecode asset emission
//!
//! The host build system talks to [`BytecodePlugin`] through [`BuildHooks`];
//! [`seal_and_emit`] is a reference driver for hosts that have no seal loop
//! of their own.

pub mod asset;
pub mod bundle;
pub mod delegate;
pub mod error;
pub mod host;
pub mod module_unification;
pub mod pipeline;
pub mod placeholder;
pub mod plugin;
pub mod rebuild;
pub mod reseal;
pub mod session;

// Re-export main types
pub use asset::{AssetMap, AssetMetadata, BytecodeAsset};
pub use bundle::Bundle;
pub use delegate::{
    AstEntry, BundleInput, CompiledOutput, CompilerDelegate, CompilerSelection, ComponentEntry,
    DelegateConfig, DelegateCtor, DelegateOptions, MainTemplateLocator, OutputFiles,
    TemplateScope, MAIN_TEMPLATE_EXPORT,
};
pub use error::{BuildError, BuildResult};
pub use host::{BuildHooks, HostContext, ModuleGraph};
pub use module_unification::{read_container, ContainerEntry, EntryKind, ModuleUnificationDelegate};
pub use pipeline::{seal_and_emit, SealSummary, MAX_SEAL_PASSES};
pub use placeholder::{PlaceholderHandle, PlaceholderModule, PlaceholderRegistry};
pub use plugin::BytecodePlugin;
pub use rebuild::rewrite_and_rebuild_all;
pub use reseal::ResealGuard;
pub use session::{BuildSession, Discovery, SessionStats};

// Re-export configuration types for convenience
pub use bytebundle_config::{BuiltinKind, BuiltinSpec, CompilerMode, ConfigError, PluginConfig};
