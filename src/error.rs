use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use log::info;
use strum_macros::Display;
use thiserror::Error;

/// Coarse classification of everything that can go wrong in a stage.
///
/// Row and file level kinds are recovered locally and counted in a [`RunReport`];
/// only [`ErrorKind::MissingInput`] and [`ErrorKind::InvalidConfig`] abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum ErrorKind {
    #[strum(serialize = "missing-input")]
    MissingInput,
    #[strum(serialize = "unmapped-label")]
    UnmappedLabel,
    #[strum(serialize = "malformed-row")]
    MalformedRow,
    #[strum(serialize = "computation")]
    Computation,
    #[strum(serialize = "missing-column")]
    MissingColumn,
    #[strum(serialize = "invalid-config")]
    InvalidConfig,
    #[strum(serialize = "io")]
    Io,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("label folder '{0}' is not mapped")]
    UnmappedLabel(String),

    #[error("malformed field '{field}': {reason}")]
    MalformedRow { field: String, reason: String },

    #[error("computation failed: {0}")]
    Computation(String),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingInput(_) => ErrorKind::MissingInput,
            PipelineError::UnmappedLabel(_) => ErrorKind::UnmappedLabel,
            PipelineError::MalformedRow { .. } => ErrorKind::MalformedRow,
            PipelineError::Computation(_) => ErrorKind::Computation,
            PipelineError::MissingColumn(_) => ErrorKind::MissingColumn,
            PipelineError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            PipelineError::Io(_) | PipelineError::Csv(_) | PipelineError::Pcap(_) => ErrorKind::Io,
        }
    }

    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        PipelineError::MalformedRow {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Per-run tally of processed items and skips by error kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    /// What the counts refer to, e.g. "rows" or "files".
    pub unit: &'static str,
    pub processed: usize,
    /// Items skipped because their output already existed.
    pub already_done: usize,
    pub skipped: BTreeMap<ErrorKind, usize>,
}

impl RunReport {
    pub fn new(unit: &'static str) -> Self {
        RunReport {
            unit,
            ..Default::default()
        }
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_skip(&mut self, kind: ErrorKind) {
        *self.skipped.entry(kind).or_insert(0) += 1;
    }

    pub fn record_error(&mut self, error: &PipelineError) {
        self.record_skip(error.kind());
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_of(&self, kind: ErrorKind) -> usize {
        self.skipped.get(&kind).copied().unwrap_or(0)
    }

    /// Folds another report's counts into this one.
    pub fn absorb(&mut self, other: &RunReport) {
        self.processed += other.processed;
        self.already_done += other.already_done;
        for (kind, count) in &other.skipped {
            *self.skipped.entry(*kind).or_insert(0) += count;
        }
    }

    pub fn log_summary(&self, stage: &str) {
        info!("{}: {}", stage, self);
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} processed, {} skipped",
            self.processed,
            self.unit,
            self.skipped_total()
        )?;
        if self.already_done > 0 {
            write!(f, ", {} already present", self.already_done)?;
        }
        if !self.skipped.is_empty() {
            let detail: Vec<String> = self
                .skipped
                .iter()
                .map(|(kind, count)| format!("{}={}", kind, count))
                .collect();
            write!(f, " ({})", detail.join(", "))?;
        }
        Ok(())
    }
}
