use eyre::{bail, Context, Result};
use same_file::is_same_file;
use std::fs;
use std::path::{Path, PathBuf};

use crate::control::ControlSignals;
use crate::freshness::FileRef;
use crate::progress::{percent_of, ProgressSink};

/// Bookkeeping for one end-to-end copy of one file.
///
/// The total is fixed when the session opens; `transferred` only grows and
/// never passes it.
pub struct TransferSession<'a> {
    source: FileRef,
    dest: PathBuf,
    total_bytes: u64,
    transferred: u64,
    last_percent: Option<u8>,
    signals: &'a ControlSignals,
}

impl<'a> TransferSession<'a> {
    /// Read the source's size and timestamp and validate the pair of paths.
    pub fn open(source: &Path, dest: &Path, signals: &'a ControlSignals) -> Result<Self> {
        let metadata = fs::metadata(source)
            .with_context(|| format!("reading source metadata: {}", source.display()))?;
        if metadata.is_dir() {
            bail!("source {} is a directory", source.display());
        }
        let modified = metadata
            .modified()
            .with_context(|| format!("reading modification time: {}", source.display()))?;

        // Compares file identity, so hard links and symlinks to the source
        // are caught too. A destination that does not exist yet cannot match.
        if is_same_file(source, dest).unwrap_or(false) {
            bail!("refusing to copy {} onto itself", source.display());
        }

        Ok(Self {
            source: FileRef {
                path: source.to_path_buf(),
                modified,
            },
            dest: dest.to_path_buf(),
            total_bytes: metadata.len(),
            transferred: 0,
            last_percent: None,
            signals,
        })
    }

    pub fn source(&self) -> &FileRef {
        &self.source
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn signals(&self) -> &ControlSignals {
        self.signals
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    pub fn remaining(&self) -> u64 {
        self.total_bytes - self.transferred
    }

    pub fn is_complete(&self) -> bool {
        self.transferred == self.total_bytes
    }

    /// Account for a written chunk and publish the new percentage.
    ///
    /// 100 is held back until [`finish`](Self::finish): the last chunk can
    /// still be followed by a cancel or a failed sync.
    pub fn record_chunk(&mut self, bytes: u64, progress: &dyn ProgressSink) {
        debug_assert!(bytes <= self.remaining(), "chunk overruns source size");
        self.transferred = self.transferred.saturating_add(bytes).min(self.total_bytes);
        if !self.is_complete() {
            self.publish(progress);
        }
    }

    /// Publish 100 once the destination is committed.
    pub fn finish(&mut self, progress: &dyn ProgressSink) {
        debug_assert!(self.is_complete(), "finishing an incomplete session");
        self.publish(progress);
    }

    /// Publish the current percentage unless it was already reported.
    pub fn publish(&mut self, progress: &dyn ProgressSink) {
        let percent = percent_of(self.transferred, self.total_bytes);
        if self.last_percent.map_or(true, |last| percent > last) {
            self.last_percent = Some(percent);
            progress.report(percent);
        }
    }
}
