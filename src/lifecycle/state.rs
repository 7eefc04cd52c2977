//! Worker lifecycle state machine.
//!
//! # States
//! ```text
//! Created → Initialized → Serving → Terminating → Terminated
//!    └──────────┴──────────────────────────────────┘
//!          terminate before run: straight to Terminated
//! ```
//!
//! # Design Decisions
//! - Stored in a single atomic; every transition is a compare-and-swap
//! - A transition that does not apply returns the state actually observed

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a worker.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created = 0,
    Initialized = 1,
    Serving = 2,
    Terminating = 3,
    Terminated = 4,
}

impl From<u8> for WorkerState {
    fn from(val: u8) -> Self {
        match val {
            0 => WorkerState::Created,
            1 => WorkerState::Initialized,
            2 => WorkerState::Serving,
            3 => WorkerState::Terminating,
            _ => WorkerState::Terminated,
        }
    }
}

impl WorkerState {
    /// True once a terminate has started or finished.
    pub fn is_stopping(self) -> bool {
        matches!(self, WorkerState::Terminating | WorkerState::Terminated)
    }
}

/// Atomic holder of a [`WorkerState`].
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Created as u8))
    }

    /// Current state.
    pub fn get(&self) -> WorkerState {
        self.0.load(Ordering::SeqCst).into()
    }

    /// Unconditionally move to `state`.
    pub fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Apply `next` atomically.
    ///
    /// Returns `Ok(previous)` when `next` produced a new state, or
    /// `Err(current)` when it declined.
    pub fn advance(
        &self,
        mut next: impl FnMut(WorkerState) -> Option<WorkerState>,
    ) -> Result<WorkerState, WorkerState> {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |raw| {
                next(raw.into()).map(|state| state as u8)
            })
            .map(WorkerState::from)
            .map_err(WorkerState::from)
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
