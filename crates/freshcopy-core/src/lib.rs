//! Pausable, cancellable single-file backup engine.
//!
//! The pieces compose leaves-first: [`freshness`] decides whether the newest
//! file in a source directory is worth copying, [`copy`] moves it in chunks
//! while honoring [`control::ControlSignals`], and [`retention`] prunes the
//! destination afterwards. [`backup::BackupJob`] strings them together and
//! [`worker::BackupWorker`] runs jobs one at a time off the caller's thread.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod backup;
pub mod buffer;
pub mod control;
pub mod copy;
pub mod errors;
pub mod freshness;
pub mod progress;
pub mod retention;
pub mod worker;

pub use backup::{BackupJob, BackupOutcome, BackupSummary};
pub use control::ControlSignals;
pub use copy::{copy_with_progress, CopyOutcome, CopyStats};
pub use freshness::{check_freshness, find_latest_file, FileRef, Freshness};
pub use progress::ProgressSink;
pub use retention::{sweep_older_than, SweepReport};
pub use worker::{BackupHandle, BackupWorker};

/// Tunables for one transfer session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Requested bytes per read/write round. Clamped by [`buffer::ChunkSizer`].
    pub chunk_size: usize,
    /// Upper bound on how long a paused session sleeps before re-checking.
    #[serde(rename = "pause_poll_ms", with = "duration_millis")]
    pub pause_poll_interval: Duration,
    /// Copy the source mtime onto the destination after a successful copy.
    pub preserve_times: bool,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            chunk_size: buffer::DEFAULT_CHUNK_SIZE,
            pause_poll_interval: Duration::from_millis(100),
            preserve_times: false,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
