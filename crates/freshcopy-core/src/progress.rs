//! Progress sinks receiving whole-number percentages from the copy loop.

use crossbeam_channel::Sender;

/// Receives percentages in `0..=100` from the worker thread.
///
/// Values arrive non-decreasing within one session. 100 is sent only once the
/// destination is committed, so a cancelled or failed copy never reports it.
/// Implementations must tolerate the same value more than once.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8) {}
}

/// Forwards updates over a channel so a UI thread can drain them.
#[derive(Clone, Debug)]
pub struct ChannelProgress {
    sender: Sender<u8>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<u8>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, percent: u8) {
        // A receiver that hung up just stops listening.
        let _ = self.sender.send(percent);
    }
}

/// Drives a bar whose length is 100.
impl ProgressSink for indicatif::ProgressBar {
    fn report(&self, percent: u8) {
        self.set_position(u64::from(percent));
    }
}

/// Integer percentage of `done` out of `total`; an empty total counts as done.
pub fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (u128::from(done) * 100) / u128::from(total);
    pct.min(100) as u8
}
