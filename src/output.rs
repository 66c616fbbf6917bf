//! Build event reporting.
//!
//! The orchestrator never prints: it reports what it did (and what went
//! wrong) to a [`BuildOutput`]. The CLI uses [`ConsoleOutput`], which logs
//! each event and counts errors for the exit status.

use crate::log;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Something the build did to a destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Destination directory did not exist and was created
    Created,
    /// Destination directory existed and was emptied
    Emptied,
    /// File copied unchanged
    Copied,
    /// File compiled (or bundle concatenated)
    Compiled,
    /// File produced by the tool itself or as a compiler side effect
    Generated,
}

impl Action {
    /// Past-tense verb used in log lines.
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Emptied => "emptied",
            Self::Copied => "copied",
            Self::Compiled => "compiled",
            Self::Generated => "generated",
        }
    }
}

/// Sink for build events.
pub trait BuildOutput {
    /// An action was performed on `path` (relative to the project root).
    fn report(&self, action: Action, path: &str, notes: &str);

    /// A file (or the whole build) failed.
    fn error(&self, path: &str, label: Option<&str>, message: &str);

    /// Something looked wrong but the file was still built.
    fn warning(&self, path: &str, label: Option<&str>, message: &str);
}

/// Logs events to the terminal and counts problems.
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl ConsoleOutput {
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
}

impl BuildOutput for ConsoleOutput {
    fn report(&self, action: Action, path: &str, notes: &str) {
        if notes.is_empty() {
            log!(action.verb(); "{path}");
        } else {
            log!(action.verb(); "{path} {notes}");
        }
    }

    fn error(&self, path: &str, label: Option<&str>, message: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        log!("error"; "{}", format_problem(path, label, message));
    }

    fn warning(&self, path: &str, label: Option<&str>, message: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        log!("warning"; "{}", format_problem(path, label, message));
    }
}

/// `path (label)` on the first line, the message below it when it spans
/// several lines.
fn format_problem(path: &str, label: Option<&str>, message: &str) -> String {
    let head = match label {
        Some(label) => format!("{path} ({label})"),
        None => path.to_owned(),
    };

    let message = message.trim_end();
    match (message.is_empty(), message.contains('\n')) {
        (true, _) => head,
        (false, true) => format!("{head}\n{message}"),
        (false, false) => format!("{head}: {message}"),
    }
}

// ============================================================================
// Test Support
// ============================================================================

/// Records every event for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub events: std::sync::Mutex<Vec<Event>>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Report(Action, String, String),
    Error(String, Option<String>, String),
    Warning(String, Option<String>, String),
}

#[cfg(test)]
impl RecordingOutput {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<(Action, String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Report(action, path, notes) => Some((action, path, notes)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, Option<String>, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error(path, label, message) => Some((path, label, message)),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Warning(..)))
            .count()
    }
}

#[cfg(test)]
impl BuildOutput for RecordingOutput {
    fn report(&self, action: Action, path: &str, notes: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Report(action, path.into(), notes.into()));
    }

    fn error(&self, path: &str, label: Option<&str>, message: &str) {
        self.events.lock().unwrap().push(Event::Error(
            path.into(),
            label.map(Into::into),
            message.into(),
        ));
    }

    fn warning(&self, path: &str, label: Option<&str>, message: &str) {
        self.events.lock().unwrap().push(Event::Warning(
            path.into(),
            label.map(Into::into),
            message.into(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_verbs() {
        assert_eq!(Action::Created.verb(), "created");
        assert_eq!(Action::Emptied.verb(), "emptied");
        assert_eq!(Action::Copied.verb(), "copied");
        assert_eq!(Action::Compiled.verb(), "compiled");
        assert_eq!(Action::Generated.verb(), "generated");
    }

    #[test]
    fn test_format_problem_single_line() {
        assert_eq!(
            format_problem("src/", None, "Source directory doesn't exist"),
            "src/: Source directory doesn't exist"
        );
    }

    #[test]
    fn test_format_problem_multi_line() {
        assert_eq!(
            format_problem("src/app.coffee", Some("CoffeeScript"), "line 1\nline 2\n"),
            "src/app.coffee (CoffeeScript)\nline 1\nline 2"
        );
    }

    #[test]
    fn test_console_output_counts() {
        let output = ConsoleOutput::default();
        output.error("src/a.scss", Some("Sass/Compass (exit 1)"), "boom");
        output.warning("src/b.scss", None, "hmm");
        output.error("src/c.coffee", None, "");

        assert_eq!(output.errors(), 2);
        assert_eq!(output.warnings(), 1);
    }
}
