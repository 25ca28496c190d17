use crate::error::{PeerPayError, Result};
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Lifecycle of a background loop. `Running -> Stopped` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Handle to a long-running loop on its own OS thread
///
/// Loops have no cancellation: they stop only when their body returns,
/// which happens on the first socket error.
pub struct LoopHandle {
    name: &'static str,
    stopped: Arc<AtomicBool>,
    handle: JoinHandle<Result<()>>,
}

impl LoopHandle {
    /// Spawn `body` on a named thread. The terminal error is logged when the loop exits.
    pub fn spawn<F>(name: &'static str, body: F) -> Result<LoopHandle>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                info!("Starting {name} loop");
                let result = body();
                if let Err(e) = &result {
                    error!("{name} loop stopped: {e}");
                }
                flag.store(true, Ordering::SeqCst);
                result
            })
            .map_err(|e| PeerPayError::Io(format!("Failed to spawn {name} thread: {e}")))?;

        Ok(LoopHandle {
            name,
            stopped,
            handle,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> LoopState {
        if self.stopped.load(Ordering::SeqCst) {
            LoopState::Stopped
        } else {
            LoopState::Running
        }
    }

    /// Block until the loop exits and return its terminal error
    pub fn join(self) -> Result<()> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(PeerPayError::Network(format!(
                "{} loop panicked",
                self.name
            ))),
        }
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
