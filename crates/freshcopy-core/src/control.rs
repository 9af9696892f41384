//! Pause and cancel signals shared between a controller and a running copy.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Shortest wait between re-checks while paused.
const MIN_PAUSE_POLL: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
struct SignalState {
    paused: bool,
    cancelled: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<SignalState>,
    changed: Condvar,
}

/// What a transfer should do after a chunk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Continue,
    Cancel,
}

/// Handle to one session's pause/cancel state. Clones observe the same state.
///
/// `cancel` latches: once set it is never cleared for this handle. Pausing is
/// a plain toggle. Every mutation wakes a transfer blocked in
/// [`ControlSignals::checkpoint`].
#[derive(Clone, Debug, Default)]
pub struct ControlSignals {
    shared: Arc<Shared>,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.set_paused(true);
    }

    pub fn resume(&self) {
        self.set_paused(false);
    }

    /// Flip the pause flag, returning the new value.
    pub fn toggle_pause(&self) -> bool {
        let mut state = self.shared.state.lock();
        state.paused = !state.paused;
        let paused = state.paused;
        drop(state);
        self.shared.changed.notify_all();
        paused
    }

    pub fn cancel(&self) {
        self.shared.state.lock().cancelled = true;
        self.shared.changed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state.lock().cancelled
    }

    fn set_paused(&self, paused: bool) {
        self.shared.state.lock().paused = paused;
        self.shared.changed.notify_all();
    }

    /// Observe the signals at a chunk boundary.
    ///
    /// Returns immediately unless paused. While paused the caller blocks,
    /// re-checking at least every `poll`, until resumed or cancelled.
    pub fn checkpoint(&self, poll: Duration) -> Checkpoint {
        let poll = pause_poll(poll);
        let mut state = self.shared.state.lock();
        if state.paused && !state.cancelled {
            log::debug!("transfer paused");
            while state.paused && !state.cancelled {
                self.shared.changed.wait_for(&mut state, poll);
            }
            if !state.cancelled {
                log::debug!("transfer resumed");
            }
        }
        if state.cancelled {
            Checkpoint::Cancel
        } else {
            Checkpoint::Continue
        }
    }
}

fn pause_poll(requested: Duration) -> Duration {
    requested.max(MIN_PAUSE_POLL)
}
