//! Sync progress events.
//!
//! The orchestrator emits a [`SyncProgressEvent`] while reading the catalog
//! and after every book's chapter batch has settled, so events are totally
//! ordered and percentages never decrease within a run.

/// A single progress event for sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncProgressEvent {
    /// Reading the book catalog of a version (total not known yet).
    Cataloging { version: String },
    /// `done` of `total` chapters settled. `book` is `None` for an empty run.
    Progress {
        version: String,
        book: Option<String>,
        done: u64,
        total: u64,
        percent: u8,
    },
}

impl SyncProgressEvent {
    pub fn percent(&self) -> Option<u8> {
        match self {
            SyncProgressEvent::Cataloging { .. } => None,
            SyncProgressEvent::Progress { percent, .. } => Some(*percent),
        }
    }
}

/// Receives progress events from a sync run.
pub trait SyncProgressReporter: Send + Sync {
    fn report(&self, event: SyncProgressEvent);
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}

/// Adapts a plain `percent -> ()` callback.
pub struct FnProgress<F>(pub F);

impl<F> SyncProgressReporter for FnProgress<F>
where
    F: Fn(u8) + Send + Sync,
{
    fn report(&self, event: SyncProgressEvent) {
        if let Some(percent) = event.percent() {
            (self.0)(percent);
        }
    }
}

/// `floor(done / total * 100)`, with an empty run counting as complete.
pub fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
