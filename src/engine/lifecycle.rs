//! Engine lifecycle: which phase a run is in, and the once-only shutdown.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::EngineError;

/// The phase the engine is currently in.
///
/// A run moves `Idle → Parsing → Resolving → Emitting → Idle`; an aborted
/// run returns to `Idle` from wherever it stopped. `Shutdown` is reachable
/// from every phase and is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Parsing,
    Resolving,
    Emitting,
    Shutdown,
}

impl Phase {
    /// Lowercase phase name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Parsing => "parsing",
            Phase::Resolving => "resolving",
            Phase::Emitting => "emitting",
            Phase::Shutdown => "shutdown",
        }
    }

    /// Whether `next` may follow this phase.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (Shutdown, _) => false,
            (_, Shutdown) => true,
            (Idle, Parsing) | (Parsing, Resolving) | (Resolving, Emitting) => true,
            (Parsing | Resolving | Emitting, Idle) => true,
            _ => false,
        }
    }

    /// Whether a run is in progress.
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Parsing | Phase::Resolving | Phase::Emitting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checked phase transitions plus the shutdown once-flag.
#[derive(Debug)]
pub struct Lifecycle {
    phase: Mutex<Phase>,
    released: AtomicBool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Lifecycle in `Idle`.
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Idle),
            released: AtomicBool::new(false),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Move to `next`, or fail if the current phase does not allow it.
    pub fn advance(&self, next: Phase) -> Result<Phase, EngineError> {
        let mut phase = self.phase.lock();
        let from = *phase;
        if from == Phase::Shutdown {
            return Err(EngineError::ShutDown);
        }
        if !from.can_transition_to(next) {
            return Err(EngineError::InvalidTransition { from, to: next });
        }
        *phase = next;
        Ok(from)
    }

    /// Return to `Idle` at the end of a run. No-op once shut down.
    pub fn finish(&self) {
        let mut phase = self.phase.lock();
        if *phase != Phase::Shutdown {
            *phase = Phase::Idle;
        }
    }

    /// Enter `Shutdown`. Returns `true` only for the first call, the one that
    /// must release resources.
    pub fn shutdown(&self) -> bool {
        *self.phase.lock() = Phase::Shutdown;
        !self.released.swap(true, Ordering::AcqRel)
    }

    /// True once resources were released.
    pub fn is_shut_down(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

/// Resets the lifecycle to `Idle` when a run ends, however it ends.
pub(crate) struct RunGuard<'a>(pub(crate) &'a Lifecycle);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}
