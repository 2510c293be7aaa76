//! Placeholder rewrite and rebuild gate
//!
//! Every placeholder gets the data segment as its source, then the host is
//! asked to rebuild each one. Rebuilds are polled concurrently on the current
//! task; the gate opens when all of them succeed and reports the first failure
//! once every rebuild has finished.

use crate::error::{BuildError, BuildResult};
use crate::placeholder::PlaceholderHandle;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

/// Rewrite each placeholder with `data_segment` and rebuild all of them
///
/// Returns the number of completed rebuilds. A failed rebuild does not cancel
/// the others: all of them run to completion, then the first failure is
/// returned and later ones are only logged.
pub async fn rewrite_and_rebuild_all(
    placeholders: &[PlaceholderHandle],
    data_segment: &str,
) -> BuildResult<usize> {
    for module in placeholders {
        module.set_source(data_segment);
    }

    let mut pending: FuturesUnordered<_> = placeholders
        .iter()
        .map(|module| async move {
            let id = module.id();
            match module.rebuild().await {
                Ok(()) => Ok(id),
                Err(e) => Err(BuildError::rebuild(id, e)),
            }
        })
        .collect();

    let mut completed = 0;
    let mut first_failure = None;
    while let Some(result) = pending.next().await {
        match result {
            Ok(id) => {
                completed += 1;
                debug!(module = %id, completed, total = placeholders.len(), "placeholder rebuilt");
            }
            Err(e) => {
                warn!(error = %e, "placeholder rebuild failed");
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(completed),
    }
}
