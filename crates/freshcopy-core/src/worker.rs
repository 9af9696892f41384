//! Single-thread execution context for backup jobs.
//!
//! One dedicated thread receives jobs over a channel and runs them one at a
//! time. Submitting while a job is in flight is refused, so a UI can wire its
//! "start" control straight to [`BackupWorker::submit`]. Every accepted job
//! produces exactly one [`BackupOutcome`] on its [`BackupHandle`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{self as channel, Receiver, Sender, TryRecvError};
use eyre::{bail, eyre, Context, Result};
use parking_lot::Mutex;

use crate::backup::{BackupJob, BackupOutcome};
use crate::control::ControlSignals;
use crate::errors::ErrorCategory;
use crate::progress::ProgressSink;

struct Submission {
    job: BackupJob,
    signals: ControlSignals,
    progress: Arc<dyn ProgressSink>,
    reply: Sender<BackupOutcome>,
}

/// Signals of the session currently in flight, if any.
type ActiveSession = Arc<Mutex<Option<ControlSignals>>>;

pub struct BackupWorker {
    sender: Option<Sender<Submission>>,
    active: ActiveSession,
    thread: Option<JoinHandle<()>>,
}

impl BackupWorker {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = channel::unbounded::<Submission>();
        let active: ActiveSession = Arc::new(Mutex::new(None));
        let worker_active = Arc::clone(&active);

        let thread = thread::Builder::new()
            .name("freshcopy-worker".into())
            .spawn(move || worker_loop(rx, worker_active))
            .wrap_err("spawning backup worker thread")?;

        Ok(Self {
            sender: Some(tx),
            active,
            thread: Some(thread),
        })
    }

    /// Queue `job` with a fresh set of control signals.
    ///
    /// Fails if a previous job has not finished yet.
    pub fn submit(&self, job: BackupJob, progress: Arc<dyn ProgressSink>) -> Result<BackupHandle> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| eyre!("backup worker has shut down"))?;

        let mut active = self.active.lock();
        if active.is_some() {
            bail!("a backup is already running");
        }

        let signals = ControlSignals::new();
        let (reply, outcome) = channel::bounded(1);
        let submission = Submission {
            job,
            signals: signals.clone(),
            progress,
            reply,
        };
        if sender.send(submission).is_err() {
            bail!("backup worker thread has exited");
        }
        *active = Some(signals.clone());

        Ok(BackupHandle {
            signals,
            outcome,
            finished: None,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.active.lock().is_some()
    }
}

impl Drop for BackupWorker {
    fn drop(&mut self) {
        if let Some(signals) = self.active.lock().as_ref() {
            log::info!("backup worker shutting down; cancelling running backup");
            signals.cancel();
        }
        drop(self.sender.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("backup worker thread panicked");
            }
        }
    }
}

fn worker_loop(rx: Receiver<Submission>, active: ActiveSession) {
    for submission in rx.iter() {
        let Submission {
            job,
            signals,
            progress,
            reply,
        } = submission;

        log::info!(
            "backup started: {} -> {}",
            job.source_dir.display(),
            job.dest_dir.display()
        );
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.run(&signals, progress.as_ref())))
            .unwrap_or_else(|_| BackupOutcome::Failed {
                reason: "backup panicked".to_string(),
                category: ErrorCategory::Fatal,
            });
        log::info!("backup finished: {outcome:?}");

        // Free the slot before notifying so the caller may resubmit at once.
        active.lock().take();
        let _ = reply.send(outcome);
    }
}

/// Caller's side of one submitted backup.
pub struct BackupHandle {
    signals: ControlSignals,
    outcome: Receiver<BackupOutcome>,
    finished: Option<BackupOutcome>,
}

impl BackupHandle {
    pub fn signals(&self) -> &ControlSignals {
        &self.signals
    }

    pub fn pause(&self) {
        self.signals.pause();
    }

    pub fn resume(&self) {
        self.signals.resume();
    }

    /// Returns the new pause state.
    pub fn toggle_pause(&self) -> bool {
        self.signals.toggle_pause()
    }

    pub fn cancel(&self) {
        self.signals.cancel();
    }

    /// Non-blocking poll for the outcome.
    pub fn try_outcome(&mut self) -> Option<&BackupOutcome> {
        if self.finished.is_none() {
            match self.outcome.try_recv() {
                Ok(outcome) => self.finished = Some(outcome),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }
        }
        self.finished.as_ref()
    }

    pub fn is_finished(&mut self) -> bool {
        self.try_outcome().is_some()
    }

    /// Block until the backup ends.
    pub fn wait(self) -> Result<BackupOutcome> {
        if let Some(outcome) = self.finished {
            return Ok(outcome);
        }
        self.outcome
            .recv()
            .map_err(|_| eyre!("backup worker exited without reporting an outcome"))
    }
}
