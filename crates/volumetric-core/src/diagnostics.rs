//! Diagnostic reporting.
//!
//! Volumes and resource caches report notable events (allocation failures,
//! missing representations, leaked resources) through a [`DiagnosticSink`]
//! handed to them at construction. The default [`LogSink`] forwards to the
//! `log` facade using the category as the log target.

use std::cell::RefCell;
use std::rc::Rc;

use log::Level;

/// Receiver for leveled, categorized diagnostic messages.
pub trait DiagnosticSink {
    /// Reports a message at `level` under `category`.
    fn report(&self, level: Level, category: &str, message: &str);
}

/// Forwards every report to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, level: Level, category: &str, message: &str) {
        log::log!(target: category, level, "{message}");
    }
}

/// A single captured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub category: String,
    pub message: String,
}

/// Sink that keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: RefCell<Vec<Diagnostic>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything reported so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    /// Returns the number of reports at `level` or more severe.
    pub fn count_at_least(&self, level: Level) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|d| d.level <= level)
            .count()
    }

    /// Returns true if any report message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|d| d.message.contains(needle))
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, level: Level, category: &str, message: &str) {
        self.records.borrow_mut().push(Diagnostic {
            level,
            category: category.to_string(),
            message: message.to_string(),
        });
    }
}

/// Shared handle to a sink, as stored by volumes and caches.
pub type SharedSink = Rc<dyn DiagnosticSink>;

/// Returns the default sink.
pub fn default_sink() -> SharedSink {
    Rc::new(LogSink)
}
