//! Background level construction
//!
//! Content generation can take a while, so it may run on a worker thread.
//! The worker owns everything it builds and hands the finished levels back
//! by value through `join`; nothing is visible to the scheduler until the
//! host registers the returned levels with the world.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::core::error::{DelveError, Result};
use crate::world::level::Level;

pub type BuiltLevels = Vec<Box<dyn Level>>;

/// Cooperative cancellation flag shared with a build job
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Convenience for build jobs: bail out with `DelveError::Build`
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DelveError::Build("cancelled".into()))
        } else {
            Ok(())
        }
    }
}

pub struct LevelBuilder {
    handle: JoinHandle<Result<BuiltLevels>>,
    cancel: CancelFlag,
}

impl LevelBuilder {
    /// Run `job` on a worker thread
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce(&CancelFlag) -> Result<BuiltLevels> + Send + 'static,
    {
        let cancel = CancelFlag::new();
        let flag = cancel.clone();
        let handle = std::thread::spawn(move || job(&flag));
        Self { handle, cancel }
    }

    /// Ask the job to stop at its next cancellation check
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job and take ownership of the levels it built
    pub fn join(self) -> Result<BuiltLevels> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(DelveError::Build("level builder thread panicked".into())),
        }
    }
}
