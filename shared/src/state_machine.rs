//! Readiness State Machine
//!
//! Tracks the progress of a bounded status poll: `Polling(n)` until a sample is
//! true (`Confirmed`) or the attempt budget runs out (`Exhausted`).

/// Current state of a readiness poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// Waiting for the result of sample `n` (1-based)
    Polling(u32),
    /// Sample `n` reported ready
    Confirmed(u32),
    /// All `n` samples reported not ready
    Exhausted(u32),
}

impl ReadinessState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReadinessState::Polling(_))
    }
}

/// State machine for one readiness poll
#[derive(Debug)]
pub struct ReadinessStateMachine {
    state: ReadinessState,
    max_attempts: u32,
}

impl ReadinessStateMachine {
    /// Create a new state machine in `Polling(1)`.
    ///
    /// A zero budget starts out `Exhausted(0)`.
    pub fn new(max_attempts: u32) -> Self {
        let state = if max_attempts == 0 {
            ReadinessState::Exhausted(0)
        } else {
            ReadinessState::Polling(1)
        };
        Self {
            state,
            max_attempts,
        }
    }

    /// Get current state
    pub fn state(&self) -> ReadinessState {
        self.state
    }

    /// Sample budget this machine was created with
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Feed the outcome of the current sample and return the new state.
    ///
    /// Terminal states ignore further samples.
    pub fn observe(&mut self, ready: bool) -> ReadinessState {
        self.state = match self.state {
            ReadinessState::Polling(n) if ready => ReadinessState::Confirmed(n),
            ReadinessState::Polling(n) if n < self.max_attempts => ReadinessState::Polling(n + 1),
            ReadinessState::Polling(n) => ReadinessState::Exhausted(n),
            terminal => terminal,
        };
        self.state
    }
}
