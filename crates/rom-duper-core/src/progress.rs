use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Trait for reporting duplicate-search progress.
///
/// CLI implements with indicatif, library callers can use [`CallbackReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_parse_start(&self, _entries: usize) {}
    fn on_parse_complete(&self, _items: usize, _excluded: usize, _duration_secs: f64) {}
    fn on_compare_start(&self, _total: usize) {}
    fn on_compare_progress(&self, _compared: usize, _total: usize) {}
    fn on_compare_complete(&self, _edges: usize, _duration_secs: f64) {}
    fn on_group_start(&self, _total: usize) {}
    fn on_group_progress(&self, _visited: usize, _total: usize) {}
    fn on_group_complete(&self, _groups: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Forwards every progress hook to a single `(current, total, message)` callback.
pub struct CallbackReporter<F>
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackReporter<F>
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }

    fn fire(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }
}

impl<F> ProgressReporter for CallbackReporter<F>
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn on_parse_start(&self, entries: usize) {
        self.fire(0, entries, "Parsing entries...");
    }

    fn on_parse_complete(&self, items: usize, _excluded: usize, _duration_secs: f64) {
        self.fire(items, items, "Parsing complete");
    }

    fn on_compare_start(&self, total: usize) {
        self.fire(0, total, "Comparing files...");
    }

    fn on_compare_progress(&self, compared: usize, total: usize) {
        self.fire(
            compared,
            total,
            &format!("Comparing files... ({} / {})", compared, total),
        );
    }

    fn on_compare_complete(&self, edges: usize, _duration_secs: f64) {
        self.fire(edges, edges, "Comparison complete");
    }

    fn on_group_start(&self, total: usize) {
        self.fire(0, total, "Grouping duplicates...");
    }

    fn on_group_progress(&self, visited: usize, total: usize) {
        self.fire(visited, total, "Grouping duplicates...");
    }

    fn on_group_complete(&self, groups: usize, _duration_secs: f64) {
        self.fire(groups, groups, "Grouping complete");
    }
}

/// Shared cancellation flag, checked at coarse granularity by long-running phases.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of an operation that may stop early on request.
///
/// A cancelled run is a normal exit; whatever was computed so far must be discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}
