use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::prelude::*;

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    /// A child is about to be launched. A stop requested now is delivered
    /// as soon as it attaches.
    Armed { stop_requested: bool },
    Running(oneshot::Sender<()>),
}

/// Shared handle to the Locust child process.
///
/// The executor attaches to it while the child is alive; the interrupt
/// listener holds a clone and asks the child to stop through it.
#[derive(Debug, Clone, Default)]
pub struct ProcessHandle {
    state: Arc<Mutex<State>>,
}

impl ProcessHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Announces an upcoming launch. Stop requests made between this call and
    /// [`attach`](Self::attach) are kept instead of dropped.
    pub fn arm(&self) {
        *self.lock() = State::Armed {
            stop_requested: false,
        };
    }

    /// Marks a child as running. The returned receiver fires once a stop is
    /// requested, immediately if one arrived while armed.
    pub fn attach(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.lock();
        if matches!(
            *state,
            State::Armed {
                stop_requested: true
            }
        ) {
            let _ = tx.send(());
            *state = State::Idle;
        } else {
            *state = State::Running(tx);
        }
        rx
    }

    pub fn detach(&self) {
        *self.lock() = State::Idle;
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock(), State::Running(_))
    }

    /// Requests termination of the running or armed child. Returns `false`
    /// without doing anything when neither is the case.
    pub fn interrupt(&self) -> bool {
        let mut state = self.lock();
        match std::mem::take(&mut *state) {
            State::Running(tx) => tx.send(()).is_ok(),
            State::Armed { .. } => {
                *state = State::Armed {
                    stop_requested: true,
                };
                true
            }
            State::Idle => false,
        }
    }
}

/// Forwards Ctrl+C to a [`ProcessHandle`] until dropped.
pub struct InterruptListener {
    task: JoinHandle<()>,
}

impl InterruptListener {
    pub fn spawn(handle: ProcessHandle) -> Self {
        let task = tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for interrupt signal: {}", e);
                    break;
                }
                if handle.interrupt() {
                    info!("Interrupt received, stopping Locust...");
                } else {
                    debug!("Interrupt received while no process is running");
                }
            }
        });
        Self { task }
    }
}

impl Drop for InterruptListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}
