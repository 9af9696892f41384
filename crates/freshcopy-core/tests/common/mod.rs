#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local, NaiveDate};
use crossbeam_channel::{Receiver, Sender};
use filetime::{set_file_mtime, FileTime};
use freshcopy_core::ProgressSink;
use parking_lot::Mutex;

/// Deterministic, non-repeating-per-chunk payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + i / 251) % 256) as u8).collect()
}

pub fn write_with_mtime(path: &Path, data: &[u8], when: SystemTime) {
    fs::write(path, data).expect("write fixture");
    set_file_mtime(path, FileTime::from_system_time(when)).expect("set fixture mtime");
}

pub fn hours_ago(hours: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(hours * 3600)
}

pub fn local_day_of(path: &Path) -> NaiveDate {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .expect("fixture mtime");
    DateTime::<Local>::from(modified).date_naive()
}

/// Records every reported percentage.
#[derive(Default)]
pub struct RecordingProgress {
    pub seen: Mutex<Vec<u8>>,
}

impl RecordingProgress {
    pub fn values(&self) -> Vec<u8> {
        self.seen.lock().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, percent: u8) {
        self.seen.lock().push(percent);
    }
}

/// Blocks the reporting thread on its first non-zero update until released.
pub struct GateProgress {
    entered: Sender<()>,
    release: Receiver<()>,
    tripped: AtomicBool,
}

pub struct GateControl {
    pub entered: Receiver<()>,
    pub release: Sender<()>,
}

pub fn gate() -> (GateProgress, GateControl) {
    let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
    let (release_tx, release_rx) = crossbeam_channel::bounded(1);
    (
        GateProgress {
            entered: entered_tx,
            release: release_rx,
            tripped: AtomicBool::new(false),
        },
        GateControl {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

impl ProgressSink for GateProgress {
    fn report(&self, percent: u8) {
        if percent == 0 || self.tripped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.entered.send(());
        let _ = self.release.recv();
    }
}

pub fn assert_non_decreasing(values: &[u8]) {
    for pair in values.windows(2) {
        assert!(pair[0] <= pair[1], "progress went backwards: {values:?}");
    }
}
