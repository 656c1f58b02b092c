//! Instrumentation hook for path resolution and assignment.

use crate::value::LeafValue;

/// Called by the engine while it resolves and assigns a line.
///
/// All methods default to doing nothing, so an implementation only overrides
/// what it cares about. `path` is the canonical path walked so far, or the
/// raw segment appended to it when the lookup missed.
pub trait PatchObserver {
    fn child_lookup(&self, path: &str, found: bool) {
        let _ = (path, found);
    }

    fn leaf_lookup(&self, path: &str, found: bool) {
        let _ = (path, found);
    }

    /// `value` is `None` when the leaf was reset to absent.
    fn assigned(&self, path: &str, value: Option<&LeafValue>) {
        let _ = (path, value);
    }
}

/// The default observer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PatchObserver for NoopObserver {}

/// Emits every lookup and assignment as a `trace` event, giving a full
/// read/write audit trail when `RUST_LOG=confpatch=trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PatchObserver for TracingObserver {
    fn child_lookup(&self, path: &str, found: bool) {
        tracing::trace!(path, found, "section lookup");
    }

    fn leaf_lookup(&self, path: &str, found: bool) {
        tracing::trace!(path, found, "leaf lookup");
    }

    fn assigned(&self, path: &str, value: Option<&LeafValue>) {
        match value {
            Some(v) => tracing::trace!(path, value = %v, "leaf assigned"),
            None => tracing::trace!(path, "leaf unset"),
        }
    }
}
