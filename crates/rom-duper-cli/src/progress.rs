use indicatif::{ProgressBar, ProgressStyle};
use rom_duper_core::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Parse phase: spinner
/// - Compare and group phases: progress bars (totals known up front)
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn start_bar(&self, label: &str, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(&format!(
            "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} ({{eta}} remaining)",
            label
        )) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }
}

impl Drop for CliReporter {
    fn drop(&mut self) {
        self.finish_bar();
    }
}

impl ProgressReporter for CliReporter {
    fn on_parse_start(&self, entries: usize) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message(format!("Parsing {} catalog entries...", entries));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_parse_complete(&self, items: usize, excluded: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Parse complete: {} files in {:.2}s ({} unresolvable)",
            items, duration_secs, excluded
        );
    }

    fn on_compare_start(&self, total: usize) {
        self.start_bar("Comparing", total);
    }

    fn on_compare_progress(&self, compared: usize, total: usize) {
        self.with_bar(|pb| {
            if pb.length() != Some(total as u64) {
                pb.set_length(total as u64);
            }
            pb.set_position(compared as u64);
        });
    }

    fn on_compare_complete(&self, edges: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Compare complete: {} similar pairs in {:.2}s",
            edges, duration_secs
        );
    }

    fn on_group_start(&self, total: usize) {
        self.start_bar("Grouping", total);
    }

    fn on_group_progress(&self, visited: usize, _total: usize) {
        self.with_bar(|pb| pb.set_position(visited as u64));
    }

    fn on_group_complete(&self, groups: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Grouping complete: {} duplicate groups in {:.2}s",
            groups, duration_secs
        );
    }
}
