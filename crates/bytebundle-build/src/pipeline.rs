//! Reference seal loop
//!
//! Runs the optimize / reseal / emit part of a build the way a bundler host
//! does, for embedders that have no host of their own. The loop is capped so a
//! misbehaving hook cannot keep the build sealing forever.

use crate::asset::AssetMap;
use crate::error::{BuildError, BuildResult};
use crate::host::{BuildHooks, ModuleGraph};
use tracing::debug;

/// Upper bound on optimize passes per build
pub const MAX_SEAL_PASSES: usize = 4;

/// Outcome of a completed seal loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealSummary {
    /// Optimize passes run
    pub passes: usize,
    /// Assets contributed by the emit hook
    pub assets_written: usize,
}

/// Seal the build until no hook asks for another pass, then emit assets
///
/// Any optimize failure aborts the build before assets are emitted.
pub async fn seal_and_emit<H>(
    hooks: &mut H,
    graph: &mut dyn ModuleGraph,
    assets: &mut AssetMap,
) -> BuildResult<SealSummary>
where
    H: BuildHooks + ?Sized,
{
    let mut passes = 0;

    loop {
        if passes == MAX_SEAL_PASSES {
            return Err(BuildError::ResealLimit { passes });
        }
        passes += 1;

        debug!(pass = passes, "seal pass");
        hooks.on_optimize().await?;

        if !hooks.needs_additional_seal(graph) {
            break;
        }
    }

    let assets_written = hooks.on_emit_assets(assets);
    Ok(SealSummary {
        passes,
        assets_written,
    })
}
