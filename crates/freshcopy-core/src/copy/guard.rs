use eyre::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Owns the destination file while a transfer is in flight.
/// Closes and deletes the file on drop unless `commit()` is called, so a
/// cancelled or failed transfer never leaves a truncated copy behind.
pub(crate) struct DestinationGuard {
    path: PathBuf,
    file: File,
    committed: bool,
}

impl DestinationGuard {
    /// Create (or truncate) `path` and take ownership of it.
    pub(crate) fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating destination {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            committed: false,
        })
    }

    pub(crate) fn file(&mut self) -> &mut File {
        &mut self.file
    }

    /// Flush and sync the destination, then keep it.
    pub(crate) fn commit(mut self) -> Result<()> {
        self.file
            .flush()
            .with_context(|| format!("flushing {}", self.path.display()))?;
        self.file
            .sync_all()
            .with_context(|| format!("syncing {}", self.path.display()))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for DestinationGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("removed partial {}", self.path.display()),
            Err(err) => log::warn!(
                "could not remove partial {}: {err}",
                self.path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn uncommitted_destination_is_removed() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out.bin");
        {
            let mut guard = DestinationGuard::create(&path).unwrap();
            guard.file().write_all(b"half").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn committed_destination_survives() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out.bin");
        let mut guard = DestinationGuard::create(&path).unwrap();
        guard.file().write_all(b"whole").unwrap();
        guard.commit().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"whole");
    }

    #[test]
    fn create_truncates_existing_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out.bin");
        fs::write(&path, b"previous contents").unwrap();
        let guard = DestinationGuard::create(&path).unwrap();
        guard.commit().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
