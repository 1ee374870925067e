pub mod analysis;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod platform;
pub mod progress;

pub use config::{AppConfig, ComparisonSettings, GroupingSettings};
pub use engine::{DuplicateEngine, DuplicateReport, RunStats};
pub use error::Error;
pub use progress::{CallbackReporter, CancelToken, Outcome, ProgressReporter, SilentReporter};
