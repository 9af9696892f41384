use eyre::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use super::guard::DestinationGuard;
use super::metadata::preserve_mtime;
use super::session::TransferSession;
use super::stats::CopyStats;
use crate::buffer::ChunkSizer;
use crate::control::{Checkpoint, ControlSignals};
use crate::progress::ProgressSink;
use crate::CopyConfig;

/// How a transfer that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Completed(CopyStats),
    /// Stopped on request; the destination has been removed.
    Cancelled,
}

/// Copy `source` to `dest` in chunks, reporting percentages to `progress`.
///
/// The destination is created fresh. Between chunks the transfer honors
/// `signals`: a pause blocks here until resumed, a cancel (even one arriving
/// during a pause) stops the copy and deletes the destination. Any read or
/// write error is returned as-is after the same cleanup; nothing is retried.
pub fn copy_with_progress(
    source: &Path,
    dest: &Path,
    signals: &ControlSignals,
    progress: &dyn ProgressSink,
    config: &CopyConfig,
) -> Result<CopyOutcome> {
    let started = Instant::now();
    let mut session = TransferSession::open(source, dest, signals)?;
    let mut src_file =
        File::open(source).with_context(|| format!("opening source: {}", source.display()))?;
    let mut guard = DestinationGuard::create(session.dest())?;

    let total = session.total_bytes();
    log::info!(
        "copying {} -> {} ({total} bytes)",
        source.display(),
        session.dest().display()
    );

    let mut stats = CopyStats::default();

    if total == 0 {
        guard.commit()?;
        session.finish(progress);
        stats.elapsed = started.elapsed();
        return Ok(CopyOutcome::Completed(stats));
    }

    session.publish(progress);
    if session.signals().checkpoint(config.pause_poll_interval) == Checkpoint::Cancel {
        log::info!("copy of {} cancelled before start", source.display());
        return Ok(CopyOutcome::Cancelled);
    }

    let chunk_size = ChunkSizer::new().chunk_size_for(config.chunk_size, total);
    log::debug!("chunk size {chunk_size} for {}", source.display());
    stats.chunk_size = chunk_size;
    let mut buffer = vec![0u8; chunk_size];

    while session.remaining() > 0 {
        let len = session.remaining().min(chunk_size as u64) as usize;
        let offset = session.transferred();

        src_file.read_exact(&mut buffer[..len]).with_context(|| {
            format!(
                "reading {} bytes at offset {offset} from {}",
                len,
                source.display()
            )
        })?;
        guard.file().write_all(&buffer[..len]).with_context(|| {
            format!(
                "writing {} bytes at offset {offset} to {}",
                len,
                dest.display()
            )
        })?;

        session.record_chunk(len as u64, progress);
        stats.add_chunk(len as u64);

        if session.signals().checkpoint(config.pause_poll_interval) == Checkpoint::Cancel {
            log::info!(
                "copy of {} cancelled after {} of {total} bytes",
                source.display(),
                session.transferred()
            );
            return Ok(CopyOutcome::Cancelled);
        }
    }

    if config.preserve_times {
        preserve_mtime(session.source(), dest)?;
    }
    guard.commit()?;
    session.finish(progress);

    stats.elapsed = started.elapsed();
    log::info!(
        "copied {} bytes to {} in {:?} ({} B/s)",
        stats.bytes_copied,
        dest.display(),
        stats.elapsed,
        stats.bytes_per_second().unwrap_or(0)
    );
    Ok(CopyOutcome::Completed(stats))
}
