use std::time::Duration;

/// Totals for one completed transfer session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyStats {
    pub bytes_copied: u64,
    pub chunks: u64,
    pub chunk_size: usize,
    pub elapsed: Duration,
}

impl CopyStats {
    pub fn add_chunk(&mut self, bytes: u64) {
        self.chunks += 1;
        self.bytes_copied += bytes;
    }

    /// Throughput in bytes per second, `None` when too fast to measure.
    pub fn bytes_per_second(&self) -> Option<u64> {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            None
        } else {
            Some((self.bytes_copied as f64 / secs) as u64)
        }
    }
}
