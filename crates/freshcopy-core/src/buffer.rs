//! Chunk sizing for the copy loop.
//!
//! The configured chunk size is honored but kept inside sane bounds: never
//! below a few pages, never above 64 MiB, and never more than a tenth of the
//! memory the machine reports as available.

use once_cell::sync::OnceCell;

const KB: usize = 1024;
const MB: usize = 1024 * KB;

/// One megabyte per round trip.
pub const DEFAULT_CHUNK_SIZE: usize = MB;
pub const MIN_CHUNK_SIZE: usize = 8 * KB;
pub const MAX_CHUNK_SIZE: usize = 64 * MB;

pub struct ChunkSizer {
    cached_available_memory: OnceCell<u64>,
}

impl ChunkSizer {
    pub fn new() -> Self {
        ChunkSizer {
            cached_available_memory: OnceCell::new(),
        }
    }

    /// Get available memory using sysinfo
    fn get_available_memory() -> u64 {
        use sysinfo::System;
        let mut sys = System::new();
        sys.refresh_memory();
        let avail_bytes = sys.available_memory();
        if avail_bytes == 0 {
            512_u64 * 1024 * 1024
        } else {
            avail_bytes
        }
    }

    /// Resolve the chunk size for a file of `file_size` bytes.
    ///
    /// A file smaller than the requested chunk gets a buffer of its own size
    /// (rounded up to the minimum) so tiny copies don't allocate megabytes.
    pub fn chunk_size_for(&self, requested: usize, file_size: u64) -> usize {
        let available_memory = *self
            .cached_available_memory
            .get_or_init(Self::get_available_memory);
        let memory_limit = (available_memory / 10).min(usize::MAX as u64) as usize;

        let requested = if requested == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            requested
        };
        let bounded = requested
            .min(MAX_CHUNK_SIZE)
            .min(memory_limit)
            .max(MIN_CHUNK_SIZE);

        if file_size < bounded as u64 {
            (file_size as usize).max(MIN_CHUNK_SIZE)
        } else {
            bounded
        }
    }
}

impl Default for ChunkSizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ChunkSizer {
        fn new_with_memory(mock_bytes: u64) -> Self {
            let s = ChunkSizer::new();
            let _ = s.cached_available_memory.set(mock_bytes);
            s
        }
    }

    #[test]
    fn requested_size_is_kept_when_reasonable() {
        let sizer = ChunkSizer::new_with_memory(8_u64 * 1024 * 1024 * 1024);
        assert_eq!(sizer.chunk_size_for(MB, 100 * MB as u64), MB);
        assert_eq!(sizer.chunk_size_for(0, 100 * MB as u64), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn extremes_are_clamped() {
        let sizer = ChunkSizer::new_with_memory(8_u64 * 1024 * 1024 * 1024);
        assert_eq!(sizer.chunk_size_for(1, 100 * MB as u64), MIN_CHUNK_SIZE);
        assert_eq!(
            sizer.chunk_size_for(512 * MB, 4 * 1024 * MB as u64),
            MAX_CHUNK_SIZE
        );
    }

    #[test]
    fn low_memory_caps_the_chunk() {
        let sizer = ChunkSizer::new_with_memory(40 * MB as u64);
        assert_eq!(sizer.chunk_size_for(16 * MB, 1024 * MB as u64), 4 * MB);
    }

    #[test]
    fn small_files_get_small_buffers() {
        let sizer = ChunkSizer::new_with_memory(8_u64 * 1024 * 1024 * 1024);
        assert_eq!(sizer.chunk_size_for(MB, 100 * KB as u64), 100 * KB);
        assert_eq!(sizer.chunk_size_for(MB, 10), MIN_CHUNK_SIZE);
    }
}
