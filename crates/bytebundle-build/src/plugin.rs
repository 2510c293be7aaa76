//! Compilation lifecycle controller
//!
//! [`BytecodePlugin`] ties one build together:
//!
//! 1. `on_session_start` replaces all per-build state.
//! 2. Loaders register templates and placeholders through [`Discovery`].
//! 3. The first `on_optimize` compiles the bundle, rewrites every placeholder
//!    with the data segment and waits for their rebuilds.
//! 4. `needs_additional_seal` grants exactly one extra pass so the rewritten
//!    modules are sealed with their new content.
//! 5. The second `on_optimize` sees the granted pass and does nothing.
//! 6. `on_emit_assets` writes the bytecode under the configured name.

use crate::asset::{AssetMap, BytecodeAsset};
use crate::bundle::Bundle;
use crate::delegate::{DelegateConfig, DelegateCtor};
use crate::error::{BuildError, BuildResult};
use crate::host::{BuildHooks, HostContext, ModuleGraph};
use crate::rebuild::rewrite_and_rebuild_all;
use crate::session::{BuildSession, Discovery};
use async_trait::async_trait;
use bytebundle_config::PluginConfig;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Template compilation plugin
#[derive(Debug)]
pub struct BytecodePlugin {
    config: PluginConfig,
    delegate: DelegateConfig,
    session: Option<BuildSession>,
    sessions_started: u64,
}

impl BytecodePlugin {
    /// Create a plugin using the built-in compiler named by `config.mode`
    pub fn new(config: PluginConfig) -> BuildResult<Self> {
        Self::build(config, None)
    }

    /// Create a plugin using a custom compiler delegate
    ///
    /// Fails if `config.mode` is also set.
    pub fn with_delegate(config: PluginConfig, ctor: DelegateCtor) -> BuildResult<Self> {
        Self::build(config, Some(ctor))
    }

    fn build(config: PluginConfig, ctor: Option<DelegateCtor>) -> BuildResult<Self> {
        let delegate = DelegateConfig::resolve(&config, ctor)?;
        Ok(Self {
            config,
            delegate,
            session: None,
            sessions_started: 0,
        })
    }

    /// Output asset name of the bytecode
    pub fn output_name(&self) -> &str {
        &self.config.output
    }

    /// Plugin options
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// The active build session, if one has started
    pub fn session(&self) -> Option<&BuildSession> {
        self.session.as_ref()
    }

    /// Registration surface for the active session
    pub fn discovery(&mut self) -> BuildResult<Discovery<'_>> {
        self.session
            .as_mut()
            .map(BuildSession::discovery)
            .ok_or(BuildError::SessionNotStarted)
    }
}

#[async_trait(?Send)]
impl BuildHooks for BytecodePlugin {
    fn on_session_start(&mut self, host: &HostContext) -> BuildResult<()> {
        let project_root = self
            .config
            .context
            .clone()
            .or_else(|| host.context.clone())
            .ok_or(BuildError::MissingContext)?;

        self.sessions_started += 1;
        let id = self.sessions_started;
        debug!(session = id, root = %project_root.display(), "build session started");

        let bundle = Bundle::new(&self.delegate, project_root);
        self.session = Some(BuildSession::new(id, bundle));
        Ok(())
    }

    async fn on_optimize(&mut self) -> BuildResult<()> {
        let session = self.session.as_mut().ok_or(BuildError::SessionNotStarted)?;
        let span = info_span!("optimize", session = session.id);
        optimize(session).instrument(span).await
    }

    fn needs_additional_seal(&mut self, graph: &mut dyn ModuleGraph) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if !session.reseal_armed || !session.guard.trip_if_untripped() {
            return false;
        }

        graph.reset_usage_info();
        graph.unseal();
        info!(session = session.id, "placeholders rewritten, requesting one more seal pass");
        true
    }

    fn on_emit_assets(&mut self, assets: &mut AssetMap) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let Some(output) = session.pending_emit.take() else {
            return 0;
        };

        let asset = BytecodeAsset::new(output.bytecode.clone(), session.id);
        info!(
            session = session.id,
            asset = %self.config.output,
            size = asset.size(),
            checksum = %asset.metadata.checksum,
            "emitting template bytecode"
        );
        if assets.insert(self.config.output.clone(), asset).is_some() {
            warn!(asset = %self.config.output, "replaced an existing asset");
        }
        1
    }
}

/// One optimize pass of a session
async fn optimize(session: &mut BuildSession) -> BuildResult<()> {
    if session.guard.is_tripped() {
        debug!("seal pass after rewrite, nothing to compile");
        return Ok(());
    }

    if session.compile_attempted {
        return Err(BuildError::AlreadyCompiled { session: session.id });
    }
    session.compile_attempted = true;

    info!(
        components = session.stats.components,
        asts = session.stats.asts,
        placeholders = session.stats.placeholders,
        "compiling template bundle"
    );

    let started = Instant::now();
    let output = session.bundle.compile().await.map_err(|e| {
        let err = BuildError::compilation(e);
        warn!(error = %err, "template compilation failed");
        err
    })?;
    let output = Rc::new(output);

    session.stats.compile_time = started.elapsed();
    session.stats.bytecode_size = output.bytecode.len();
    session.compiled = Some(output.clone());

    let rebuilt = rewrite_and_rebuild_all(session.placeholders.modules(), &output.data_segment).await?;
    session.stats.rebuilt_modules = rebuilt;

    session.pending_emit = Some(output);
    session.reseal_armed = true;

    info!(
        bytecode_size = session.stats.bytecode_size,
        rebuilt_modules = rebuilt,
        compile_time = ?session.stats.compile_time,
        "template bundle compiled"
    );
    Ok(())
}
