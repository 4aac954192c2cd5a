//! Progress reporting: an injected observer, not process-wide state.
//!
//! The driver calls `on_progress` once per processed index and `on_pause`/
//! `on_resume` around autosave snapshots. A `false` return from
//! `on_progress` requests a cooperative abort at the next index boundary.

pub trait ProgressReporter {
    /// `pos` is the count of indices completed so far (out of `total`).
    /// Returns `false` to request abort.
    fn on_progress(&mut self, pos: u64, total: u64) -> bool
    {
        let _ = (pos, total);
        true
    }

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}
}

/// Reports nothing and never requests abort. Used by tests and by
/// callers that don't want progress output.
#[derive(Default)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {}

/// Prints a terse one-line counter to stderr every time it is polled.
pub struct ConsoleProgress {
    label: String,
}

impl ConsoleProgress {
    pub fn new(label: impl Into<String>) -> Self
    {
        Self { label: label.into() }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn on_progress(&mut self, pos: u64, total: u64) -> bool
    {
        if total > 0 {
            eprint!("\r{}: {}/{}", self.label, pos, total);
        }
        true
    }

    fn on_pause(&mut self)
    {
        eprintln!();
        eprintln!("{}: autosave...", self.label);
    }

    fn on_resume(&mut self)
    {
        eprintln!("{}: resuming", self.label);
    }
}
