use eyre::{Context, Result};
use filetime::{set_file_mtime, FileTime};
use std::path::Path;

use crate::freshness::FileRef;

/// Stamp the source's modification time onto the copied file.
pub(crate) fn preserve_mtime(source: &FileRef, dst: &Path) -> Result<()> {
    set_file_mtime(dst, FileTime::from_system_time(source.modified))
        .with_context(|| format!("setting modification time on {}", dst.display()))?;
    log::debug!("preserved mtime of {} on {}", source.path.display(), dst.display());
    Ok(())
}
