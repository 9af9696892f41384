//! Selection of the backup candidate and the "modified today" gate.
//!
//! Only direct entries of the source directory are considered. The newest
//! file wins; when two files carry the same timestamp the one with the
//! greater file name wins, so the pick never depends on enumeration order.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate};
use eyre::{Context, Result};
use walkdir::WalkDir;

/// A path together with the modification time read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl FileRef {
    /// Re-read the modification time of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata =
            fs::metadata(path).with_context(|| format!("reading metadata: {}", path.display()))?;
        let modified = metadata
            .modified()
            .with_context(|| format!("reading modification time: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            modified,
        })
    }

    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }

    fn sort_key(&self) -> (SystemTime, OsString) {
        (
            self.modified,
            self.path.file_name().map(OsString::from).unwrap_or_default(),
        )
    }
}

/// Verdict of the freshness gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The directory holds no files (or could not be read).
    NoCandidate,
    /// The newest file was last modified on an earlier (or later) day.
    Stale(FileRef),
    /// The newest file was modified today and may be copied.
    Fresh(FileRef),
}

/// Return the most recently modified non-directory entry of `dir`.
///
/// Unreadable directories and entries are skipped, never reported as errors:
/// "nothing to back up" is an ordinary answer here.
pub fn find_latest_file(dir: &Path) -> Option<FileRef> {
    let mut latest: Option<FileRef> = None;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry under {}: {err}", dir.display());
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let modified = entry
            .metadata()
            .map_err(std::io::Error::from)
            .and_then(|metadata| metadata.modified());
        let modified = match modified {
            Ok(modified) => modified,
            Err(err) => {
                log::warn!("no modification time for {}: {err}", entry.path().display());
                continue;
            }
        };

        let candidate = FileRef {
            path: entry.into_path(),
            modified,
        };
        let newer = latest
            .as_ref()
            .map_or(true, |current| candidate.sort_key() > current.sort_key());
        if newer {
            log::debug!("newest so far: {}", candidate.path.display());
            latest = Some(candidate);
        }
    }

    latest
}

/// True when `file` was last modified on `day`, judged in local time.
pub fn is_modified_on(file: &FileRef, day: NaiveDate) -> bool {
    DateTime::<Local>::from(file.modified).date_naive() == day
}

/// Run the gate against the current local date.
pub fn check_freshness(dir: &Path) -> Freshness {
    check_freshness_on(dir, Local::now().date_naive())
}

/// Run the gate as if today were `today`.
pub fn check_freshness_on(dir: &Path, today: NaiveDate) -> Freshness {
    match find_latest_file(dir) {
        None => {
            log::info!("no backup candidate in {}", dir.display());
            Freshness::NoCandidate
        }
        Some(file) if is_modified_on(&file, today) => Freshness::Fresh(file),
        Some(file) => {
            log::warn!(
                "newest file {} was not modified on {today}",
                file.path.display()
            );
            Freshness::Stale(file)
        }
    }
}
