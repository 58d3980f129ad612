//! Window Manager Module
//!
//! The lifecycle every manager shares (start/stop flags, the `run` entry
//! point) and the backends built on it: [`XDisplayManager`] for X11 and
//! [`NullManager`] for platforms without one.

pub mod display;
pub mod events;
pub mod placement;
pub mod screen;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

pub use events::XDisplayManager;

/// Run flag owned by a manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerState {
    pub running: bool,
}

/// Why a manager's `run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The run flag was cleared, or was never set
    Stopped,
    /// The display connection went away
    ConnectionClosed,
    /// An operator interrupt arrived while waiting for events
    Interrupted,
}

/// Common manager contract. `start` and `stop` only flip the run flag; `run`
/// is the backend's event loop and observes the flag between iterations.
pub trait Manager {
    fn state(&self) -> &ManagerState;

    fn state_mut(&mut self) -> &mut ManagerState;

    /// Mark the manager as running. Calling it again is a no-op.
    fn start(&mut self) {
        self.state_mut().running = true;
    }

    /// Ask the loop to stop at the top of its next iteration
    fn stop(&mut self) {
        self.state_mut().running = false;
    }

    fn is_running(&self) -> bool {
        self.state().running
    }

    /// Process events until stopped
    fn run(&mut self) -> LoopExit;
}

/// Manager for platforms with no backend; `run` returns immediately
#[derive(Debug, Default)]
#[cfg_attr(unix, allow(dead_code))]
pub struct NullManager {
    state: ManagerState,
}

#[cfg_attr(unix, allow(dead_code))]
impl NullManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Manager for NullManager {
    fn state(&self) -> &ManagerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ManagerState {
        &mut self.state
    }

    fn run(&mut self) -> LoopExit {
        debug!("No window management backend on this platform");
        LoopExit::Stopped
    }
}

/// Operator interrupt flag, raised from the signal handler and polled by
/// the display connection while it waits for events.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_starts_stopped() {
        let manager = NullManager::new();
        assert!(!manager.is_running());
        assert_eq!(*manager.state(), ManagerState { running: false });
    }

    #[test]
    fn start_is_idempotent() {
        let mut once = NullManager::new();
        once.start();

        let mut twice = NullManager::new();
        twice.start();
        twice.start();

        assert_eq!(once.state(), twice.state());
        assert!(twice.is_running());
    }

    #[test]
    fn stop_clears_running() {
        let mut manager = NullManager::new();
        manager.start();
        manager.stop();
        assert!(!manager.is_running());
    }

    #[test]
    fn null_manager_run_returns_immediately() {
        let mut manager = NullManager::new();
        manager.start();
        assert_eq!(manager.run(), LoopExit::Stopped);
    }

    #[test]
    fn interrupt_is_shared_between_clones() {
        let interrupt = Interrupt::new();
        let observer = interrupt.clone();
        assert!(!observer.is_raised());

        interrupt.raise();
        assert!(observer.is_raised());
    }
}
