//! One backup run: gate, copy, sweep.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};

use crate::control::ControlSignals;
use crate::copy::{copy_with_progress, CopyOutcome};
use crate::errors::{categorize_report, ErrorCategory};
use crate::freshness::{check_freshness_on, FileRef, Freshness};
use crate::progress::ProgressSink;
use crate::retention::{sweep_older_than, SweepReport};
use crate::CopyConfig;

/// Summary of a successful backup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackupSummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes_copied: u64,
    pub duration: Duration,
    pub sweep: SweepReport,
}

/// The single terminal result of a backup run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The source directory held nothing to copy.
    NoCandidateFound,
    /// The newest source file was not modified today; nothing was touched.
    NotFreshEnough { candidate: FileRef },
    Cancelled,
    Failed {
        reason: String,
        category: ErrorCategory,
    },
    Succeeded(BackupSummary),
}

impl BackupOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BackupOutcome::Succeeded(_))
    }

    /// Only `Failed` counts as an error; the other outcomes are informational.
    pub fn is_terminal_error(&self) -> bool {
        matches!(self, BackupOutcome::Failed { .. })
    }
}

/// Copy the newest file of `source_dir` into `dest_dir`, then drop every
/// older file from `dest_dir`.
#[derive(Clone, Debug)]
pub struct BackupJob {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub config: CopyConfig,
}

impl BackupJob {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            config: CopyConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CopyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn run(&self, signals: &ControlSignals, progress: &dyn ProgressSink) -> BackupOutcome {
        self.run_on(Local::now().date_naive(), signals, progress)
    }

    /// Run with `today` standing in for the current local date.
    pub fn run_on(
        &self,
        today: NaiveDate,
        signals: &ControlSignals,
        progress: &dyn ProgressSink,
    ) -> BackupOutcome {
        let started = Instant::now();

        let candidate = match check_freshness_on(&self.source_dir, today) {
            Freshness::NoCandidate => return BackupOutcome::NoCandidateFound,
            Freshness::Stale(candidate) => return BackupOutcome::NotFreshEnough { candidate },
            Freshness::Fresh(candidate) => candidate,
        };

        let Some(file_name) = candidate.file_name() else {
            return BackupOutcome::Failed {
                reason: format!("{} has no file name", candidate.path.display()),
                category: ErrorCategory::Fatal,
            };
        };
        let destination = self.dest_dir.join(file_name);

        let stats = match copy_with_progress(
            &candidate.path,
            &destination,
            signals,
            progress,
            &self.config,
        ) {
            Ok(CopyOutcome::Completed(stats)) => stats,
            Ok(CopyOutcome::Cancelled) => return BackupOutcome::Cancelled,
            Err(err) => {
                log::error!("backup of {} failed: {err:#}", candidate.path.display());
                return BackupOutcome::Failed {
                    reason: format!("{err:#}"),
                    category: categorize_report(&err),
                };
            }
        };

        let sweep = sweep_after(&self.dest_dir, &destination);

        BackupOutcome::Succeeded(BackupSummary {
            source: candidate.path,
            destination,
            bytes_copied: stats.bytes_copied,
            duration: started.elapsed(),
            sweep,
        })
    }
}

/// Sweep `dest_dir` using the fresh copy's own timestamp as the reference.
fn sweep_after(dest_dir: &Path, destination: &Path) -> SweepReport {
    match FileRef::from_path(destination) {
        Ok(copied) => sweep_older_than(dest_dir, copied.modified),
        Err(err) => {
            log::warn!("skipping retention sweep: {err:#}");
            SweepReport::default()
        }
    }
}
