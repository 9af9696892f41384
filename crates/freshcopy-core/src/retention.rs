use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Files in one directory that predate a reference timestamp.
#[derive(Debug, Default, Clone)]
pub struct SweepPlan {
    pub files: Vec<PathBuf>,
    pub retained: usize,
}

/// What a sweep actually did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub retained: usize,
}

/// List the direct, non-directory entries of `dir` modified strictly before
/// `reference`. Files stamped exactly `reference` or later are retained.
pub fn plan_sweep(dir: &Path, reference: SystemTime) -> Result<SweepPlan> {
    let mut plan = SweepPlan::default();
    let entries =
        fs::read_dir(dir).with_context(|| format!("listing directory {}", dir.display()))?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("skipping {}: {err}", path.display());
                continue;
            }
        };
        if metadata.is_dir() {
            continue;
        }
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(err) => {
                log::warn!("no modification time for {}: {err}", path.display());
                continue;
            }
        };
        if modified < reference {
            plan.files.push(path);
        } else {
            plan.retained += 1;
        }
    }

    plan.files.sort();
    Ok(plan)
}

/// Delete every planned file. Failures are recorded and the sweep goes on.
pub fn execute_sweep(plan: SweepPlan) -> SweepReport {
    let mut report = SweepReport {
        retained: plan.retained,
        ..SweepReport::default()
    };
    for path in plan.files {
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("removed old backup {}", path.display());
                report.deleted.push(path);
            }
            Err(err) => {
                log::warn!("could not remove {}: {err}", path.display());
                report.failed.push((path, err.to_string()));
            }
        }
    }
    report
}

/// Keep only what is at least as new as `reference` in `dir`.
///
/// Never fails: an unreadable directory yields an empty report.
pub fn sweep_older_than(dir: &Path, reference: SystemTime) -> SweepReport {
    match plan_sweep(dir, reference) {
        Ok(plan) => execute_sweep(plan),
        Err(err) => {
            log::warn!("retention sweep skipped: {err:#}");
            SweepReport::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::time::Duration;
    use tempfile::tempdir;

    fn stamp(path: &Path, when: SystemTime) {
        fs::write(path, b"x").unwrap();
        set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
    }

    #[test]
    fn removes_only_strictly_older_files() {
        let tmp = tempdir().unwrap();
        let reference = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        stamp(&tmp.path().join("old-1"), reference - Duration::from_secs(86_400));
        stamp(&tmp.path().join("old-2"), reference - Duration::from_secs(1));
        stamp(&tmp.path().join("same"), reference);
        stamp(&tmp.path().join("newer"), reference + Duration::from_secs(5));

        let report = sweep_older_than(tmp.path(), reference);
        assert_eq!(
            report.deleted,
            vec![tmp.path().join("old-1"), tmp.path().join("old-2")]
        );
        assert!(report.failed.is_empty());
        assert_eq!(report.retained, 2);
        assert!(tmp.path().join("same").exists());
        assert!(tmp.path().join("newer").exists());
        assert!(!tmp.path().join("old-1").exists());
    }

    #[test]
    fn directories_are_left_alone() {
        let tmp = tempdir().unwrap();
        let reference = SystemTime::now();
        let sub = tmp.path().join("archive");
        fs::create_dir(&sub).unwrap();
        stamp(&sub.join("ancient"), reference - Duration::from_secs(999_999));
        let long_ago = reference - Duration::from_secs(999_999);
        set_file_mtime(&sub, FileTime::from_system_time(long_ago)).unwrap();

        let report = sweep_older_than(tmp.path(), reference);
        assert!(report.deleted.is_empty());
        assert!(sub.join("ancient").exists());
    }

    #[test]
    fn missing_directory_yields_empty_report() {
        let tmp = tempdir().unwrap();
        let report = sweep_older_than(&tmp.path().join("gone"), SystemTime::now());
        assert_eq!(report, SweepReport::default());
        assert!(plan_sweep(&tmp.path().join("gone"), SystemTime::now()).is_err());
    }

    #[test]
    fn vanished_file_is_reported_not_fatal() {
        let tmp = tempdir().unwrap();
        let reference = SystemTime::now();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        stamp(&a, reference - Duration::from_secs(60));
        stamp(&b, reference - Duration::from_secs(60));

        let plan = plan_sweep(tmp.path(), reference).unwrap();
        fs::remove_file(&a).unwrap();
        let report = execute_sweep(plan);

        assert_eq!(report.deleted, vec![b.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, a);
        assert!(!b.exists());
    }
}
