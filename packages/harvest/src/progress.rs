//! Progress reporting for a store run.
//!
//! The orchestrator reports one unit per download attempt through a
//! [`ProgressCallback`], so the CLI can render a bar while library users and
//! tests stay silent with [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a running harvest.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
