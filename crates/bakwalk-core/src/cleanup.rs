//! Teardown of views opened while walking a backup set

use crate::display::{DisplayLayer, ResourceHandle};
use std::path::PathBuf;

/// Outcome of [`cleanup`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Views whose path starts with the backup prefix
    pub matched: usize,
    pub destroyed: usize,
    pub failed: usize,
    /// Whether the user agreed to close them (false when nothing matched)
    pub confirmed: bool,
}

/// Open views backed by a path starting with `prefix`.
///
/// Plain string prefix match, so `/a/foo.txt.~` also owns `/a/foo.txt.~3~.orig`.
pub fn owned_resources(
    display: &dyn DisplayLayer,
    prefix: &str,
) -> Vec<(PathBuf, ResourceHandle)> {
    display
        .list_open_resources()
        .into_iter()
        .filter(|(path, _)| path.to_string_lossy().starts_with(prefix))
        .collect()
}

/// Offer to close every view belonging to `prefix`.
///
/// A view that cannot be destroyed is logged and skipped.
pub fn cleanup(display: &mut dyn DisplayLayer, prefix: &str) -> CleanupReport {
    let owned = owned_resources(display, prefix);
    let mut report = CleanupReport {
        matched: owned.len(),
        ..CleanupReport::default()
    };
    if owned.is_empty() {
        return report;
    }

    let noun = if owned.len() == 1 { "view" } else { "views" };
    let prompt = format!("Close {} open backup {}?", owned.len(), noun);
    if !display.confirm(&prompt) {
        tracing::debug!(count = owned.len(), "leaving backup views open");
        return report;
    }
    report.confirmed = true;

    for (path, handle) in owned {
        match display.destroy(handle) {
            Ok(()) => report.destroyed += 1,
            Err(err) => {
                tracing::warn!(path = %path.display(), %handle, error = %err, "failed to close view");
                report.failed += 1;
            }
        }
    }
    report
}
