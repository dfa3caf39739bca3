//! # Progress Output
//!
//! Human-readable lines a run prints while it works. The pipeline and the
//! run orchestration never print directly; they hand a [`ProgressEvent`] to a
//! [`ProgressObserver`]. The CLI uses [`ConsoleProgress`], tests and other
//! front ends can collect the lines instead.

use crate::summary::SizeSummary;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

/// Something worth telling the user about
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The listing came back empty
    NoFiles,
    /// The listing is larger than the daily upload quota
    QuotaExceeded { limit: usize },
    /// Number of items about to be migrated
    TotalItems(usize),
    /// A chunk of `name` landed on disk
    Downloading { name: String, percent: u8 },
    /// A scratch file was removed
    ScratchDeleted { path: PathBuf },
    /// Final size line
    TotalSize(SizeSummary),
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::NoFiles => write!(f, "No files found."),
            ProgressEvent::QuotaExceeded { limit } => write!(
                f,
                "Unable to run, total files exceed API limit of {} / day. \
                 Contact your developer for making the necessary modifications",
                group_thousands(*limit)
            ),
            ProgressEvent::TotalItems(count) => write!(f, "Total images & videos: {}", count),
            ProgressEvent::Downloading { name, percent } => {
                write!(f, "Downloading {} {}%.", name, percent)
            }
            ProgressEvent::ScratchDeleted { path } => {
                write!(f, "Deleted temporary file: {}", path.display())
            }
            ProgressEvent::TotalSize(summary) => write!(f, "{}", summary),
        }
    }
}

/// Receives progress events in the order they happen
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Prints each event as one line on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_event(&self, event: &ProgressEvent) {
        println!("{}", event);
    }
}

/// Keeps the rendered lines in memory
#[derive(Debug, Default)]
pub struct CollectingProgress {
    lines: Mutex<Vec<String>>,
}

impl CollectingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines rendered so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProgressObserver for CollectingProgress {
    fn on_event(&self, event: &ProgressEvent) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.to_string());
    }
}

/// `10000` -> `10.000`
fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}
