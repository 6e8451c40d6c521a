//! Lock state machine.
//!
//! This module tracks the lock-access state of the lockbox, validates every
//! transition against the allowed flow, and keeps a bounded history for
//! diagnostics. It does not decide *when* to transition; that is the job of
//! the [`Lockbox`](crate::Lockbox) controller.
//!
//! Time is passed in explicitly as scan time (the total settle delay the
//! scanner has waited through), so the machine behaves identically against
//! a real clock and a recording delay.
//!
//! # States
//!
//! - `Idle`: no secret set, waiting for the submit key
//! - `AwaitingNewPin`: collecting the new PIN until the entry window elapses
//! - `Locked`: secret set, actuator released
//! - `AwaitingAttempt`: collecting an unlock attempt
//! - `Verifying`: comparing the attempt against the secret
//! - `Unlocked`: actuator asserted until the unlock window elapses
//! - `Lockout`: too many failures, keys ignored until the lockout window elapses
//!
//! # Valid Transitions
//!
//! - Idle → AwaitingNewPin → Locked
//! - Locked → AwaitingAttempt → Verifying → Unlocked/Locked
//! - Locked → Lockout → Locked
//! - Unlocked → Locked
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use lockbox_emulator::{LockState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), &LockState::Idle);
//!
//! machine
//!     .transition_to(LockState::AwaitingNewPin, Duration::from_millis(40))
//!     .unwrap();
//! machine.set_timeout(Duration::from_secs(8));
//!
//! assert!(!machine.has_timed_out(Duration::from_secs(5)));
//! assert!(machine.has_timed_out(Duration::from_millis(8_040)));
//!
//! // Invalid transition
//! assert!(machine.transition_to(LockState::Unlocked, Duration::ZERO).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use lockbox_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of state transitions to keep in history.
///
/// A full unlock cycle is four transitions, so this covers the last 25
/// unlock cycles.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Lock-access states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// No secret set; the display shows `0000`.
    Idle,

    /// Collecting the new PIN.
    AwaitingNewPin,

    /// Secret set and actuator released.
    Locked,

    /// Collecting an unlock attempt.
    AwaitingAttempt,

    /// Comparing the attempt against the secret.
    Verifying,

    /// Actuator asserted.
    Unlocked,

    /// Too many failed attempts.
    Lockout,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            LockState::Idle => "Idle",
            LockState::AwaitingNewPin => "AwaitingNewPin",
            LockState::Locked => "Locked",
            LockState::AwaitingAttempt => "AwaitingAttempt",
            LockState::Verifying => "Verifying",
            LockState::Unlocked => "Unlocked",
            LockState::Lockout => "Lockout",
        };
        write!(f, "{}", state_str)
    }
}

impl LockState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use lockbox_emulator::LockState;
    ///
    /// assert!(LockState::Locked.can_transition_to(&LockState::Lockout));
    /// assert!(!LockState::Idle.can_transition_to(&LockState::Unlocked));
    /// ```
    pub fn can_transition_to(&self, target: &LockState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (LockState::Idle, LockState::AwaitingNewPin)
            // From AwaitingNewPin
            | (LockState::AwaitingNewPin, LockState::Locked)
            // From Locked
            | (LockState::Locked, LockState::AwaitingAttempt | LockState::Lockout)
            // From AwaitingAttempt
            | (LockState::AwaitingAttempt, LockState::Verifying)
            // From Verifying
            | (LockState::Verifying, LockState::Unlocked | LockState::Locked)
            // From Unlocked
            | (LockState::Unlocked, LockState::Locked)
            // From Lockout
            | (LockState::Lockout, LockState::Locked)
        )
    }

    /// Check if confirmed digits are written to the entry buffer in this state.
    pub fn accepts_digits(&self) -> bool {
        matches!(self, LockState::AwaitingNewPin | LockState::AwaitingAttempt)
    }

    /// Check if the secret is protecting the box (locked indicator lit).
    pub fn is_secured(&self) -> bool {
        matches!(
            self,
            LockState::Locked
                | LockState::AwaitingAttempt
                | LockState::Verifying
                | LockState::Lockout
        )
    }
}

/// A single state transition, stamped with scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: LockState,

    /// The state transitioned to.
    pub to: LockState,

    /// Scan time at which the transition happened.
    pub at: Duration,
}

impl StateTransition {
    /// Create a new state transition record.
    pub fn new(from: LockState, to: LockState, at: Duration) -> Self {
        Self { from, to, at }
    }
}

/// State machine for the lock-access flow.
///
/// # Thread Safety
///
/// This struct is not thread-safe. It is owned by the controller and only
/// mutated from the control loop.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current state.
    current_state: LockState,

    /// Scan time at which the current state was entered.
    state_entered_at: Duration,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,

    /// Window for the current state, if any.
    current_timeout: Option<Duration>,
}

impl StateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self {
            current_state: LockState::Idle,
            state_entered_at: Duration::ZERO,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            current_timeout: None,
        }
    }

    /// Create a builder for constructing a state machine with custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use lockbox_emulator::{LockState, StateMachine};
    ///
    /// let machine = StateMachine::builder()
    ///     .with_initial_state(LockState::Locked)
    ///     .build();
    ///
    /// assert_eq!(machine.current_state(), &LockState::Locked);
    /// ```
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    /// Get the current state of the machine.
    pub fn current_state(&self) -> &LockState {
        &self.current_state
    }

    /// Scan time spent in the current state.
    pub fn time_in_current_state(&self, now: Duration) -> Duration {
        now.saturating_sub(self.state_entered_at)
    }

    /// Check if the current state's window has elapsed.
    ///
    /// Always `false` when no window is set.
    pub fn has_timed_out(&self, now: Duration) -> bool {
        self.current_timeout
            .is_some_and(|timeout| self.time_in_current_state(now) >= timeout)
    }

    /// Remaining time in the current window, if one is set and still running.
    pub fn time_remaining(&self, now: Duration) -> Option<Duration> {
        self.current_timeout.and_then(|timeout| {
            let elapsed = self.time_in_current_state(now);
            timeout.checked_sub(elapsed).filter(|left| !left.is_zero())
        })
    }

    /// Set the window for the current state.
    ///
    /// Cleared automatically on the next transition.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.current_timeout = Some(timeout);
    }

    /// Recent state transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state at scan time `now`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not
    /// allowed from the current state. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: LockState, now: Duration) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state, now);

        self.current_state = new_state;
        self.state_entered_at = now;
        self.current_timeout = None;
        self.add_to_history(transition);

        Ok(transition)
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing `StateMachine` instances.
///
/// Used to start the controller directly in `Locked` when a secret is
/// restored at start-up.
#[derive(Debug)]
pub struct StateMachineBuilder {
    initial_state: LockState,
}

impl StateMachineBuilder {
    /// Set the initial state for the machine.
    pub fn with_initial_state(mut self, state: LockState) -> Self {
        self.initial_state = state;
        self
    }

    /// Build the state machine, entered at scan time zero with no window.
    pub fn build(self) -> StateMachine {
        StateMachine {
            current_state: self.initial_state,
            ..StateMachine::new()
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: LockState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const T0: Duration = Duration::ZERO;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn locked_machine() -> StateMachine {
        let mut machine = StateMachine::new();
        machine.transition_to(LockState::AwaitingNewPin, T0).unwrap();
        machine.transition_to(LockState::Locked, T0).unwrap();
        machine
    }

    #[test]
    fn test_new_machine_starts_idle() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), &LockState::Idle);
        assert_eq!(machine.history().len(), 0);
        assert_eq!(machine.time_remaining(T0), None);
    }

    #[test]
    fn test_valid_transition_idle_to_awaiting_new_pin() {
        let mut machine = StateMachine::new();
        let transition = machine
            .transition_to(LockState::AwaitingNewPin, ms(5))
            .unwrap();

        assert_eq!(transition.from, LockState::Idle);
        assert_eq!(transition.to, LockState::AwaitingNewPin);
        assert_eq!(transition.at, ms(5));
        assert_eq!(machine.current_state(), &LockState::AwaitingNewPin);
    }

    #[test]
    fn test_unlock_cycle() {
        let mut machine = locked_machine();

        machine.transition_to(LockState::AwaitingAttempt, T0).unwrap();
        machine.transition_to(LockState::Verifying, T0).unwrap();
        machine.transition_to(LockState::Unlocked, T0).unwrap();
        machine.transition_to(LockState::Locked, T0).unwrap();

        assert_eq!(machine.current_state(), &LockState::Locked);
        assert_eq!(machine.history().len(), 6);
    }

    #[test]
    fn test_failed_attempt_cycle() {
        let mut machine = locked_machine();

        machine.transition_to(LockState::AwaitingAttempt, T0).unwrap();
        machine.transition_to(LockState::Verifying, T0).unwrap();
        machine.transition_to(LockState::Locked, T0).unwrap();

        assert_eq!(machine.current_state(), &LockState::Locked);
    }

    #[test]
    fn test_lockout_cycle() {
        let mut machine = locked_machine();

        machine.transition_to(LockState::Lockout, T0).unwrap();
        machine.transition_to(LockState::Locked, T0).unwrap();

        assert_eq!(machine.current_state(), &LockState::Locked);
    }

    #[rstest]
    #[case(LockState::Idle, LockState::Locked)]
    #[case(LockState::Idle, LockState::Unlocked)]
    #[case(LockState::AwaitingNewPin, LockState::Idle)]
    #[case(LockState::Locked, LockState::Unlocked)]
    #[case(LockState::Locked, LockState::Idle)]
    #[case(LockState::AwaitingAttempt, LockState::Unlocked)]
    #[case(LockState::Verifying, LockState::Lockout)]
    #[case(LockState::Unlocked, LockState::AwaitingAttempt)]
    #[case(LockState::Lockout, LockState::AwaitingAttempt)]
    #[case(LockState::Lockout, LockState::Idle)]
    fn test_invalid_transitions(#[case] from: LockState, #[case] to: LockState) {
        let mut machine = StateMachine::builder().with_initial_state(from).build();
        let result = machine.transition_to(to, T0);

        assert!(matches!(
            result,
            Err(Error::InvalidStateTransition { .. })
        ));
        assert_eq!(machine.current_state(), &from);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_no_self_transitions() {
        for state in [
            LockState::Idle,
            LockState::AwaitingNewPin,
            LockState::Locked,
            LockState::AwaitingAttempt,
            LockState::Verifying,
            LockState::Unlocked,
            LockState::Lockout,
        ] {
            assert!(!state.can_transition_to(&state), "{state} -> {state}");
        }
    }

    #[test]
    fn test_invalid_transition_error_names_states() {
        let mut machine = StateMachine::new();
        let err = machine.transition_to(LockState::Unlocked, T0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from Idle to Unlocked"
        );
    }

    #[test]
    fn test_timeout_tracking() {
        let mut machine = StateMachine::new();
        machine.transition_to(LockState::AwaitingNewPin, ms(10)).unwrap();
        machine.set_timeout(ms(100));

        assert!(!machine.has_timed_out(ms(50)));
        assert_eq!(machine.time_remaining(ms(50)), Some(ms(60)));

        assert!(machine.has_timed_out(ms(110)));
        assert_eq!(machine.time_remaining(ms(110)), None);
    }

    #[test]
    fn test_no_timeout_never_times_out() {
        let machine = StateMachine::new();
        assert!(!machine.has_timed_out(Duration::from_secs(3600)));
        assert_eq!(machine.time_remaining(ms(1)), None);
    }

    #[test]
    fn test_timeout_cleared_on_transition() {
        let mut machine = StateMachine::new();
        machine.transition_to(LockState::AwaitingNewPin, T0).unwrap();
        machine.set_timeout(ms(100));

        machine.transition_to(LockState::Locked, ms(100)).unwrap();

        assert_eq!(machine.time_remaining(ms(100)), None);
        assert!(!machine.has_timed_out(ms(500)));
    }

    #[test]
    fn test_time_in_current_state() {
        let mut machine = StateMachine::new();
        machine.transition_to(LockState::AwaitingNewPin, ms(20)).unwrap();

        assert_eq!(machine.time_in_current_state(ms(70)), ms(50));
        assert_eq!(machine.time_in_current_state(ms(5)), T0);
    }

    #[test]
    fn test_transition_history_is_recorded() {
        let mut machine = StateMachine::new();
        machine.transition_to(LockState::AwaitingNewPin, ms(1)).unwrap();
        machine.transition_to(LockState::Locked, ms(2)).unwrap();
        machine.transition_to(LockState::Lockout, ms(3)).unwrap();

        let history: Vec<_> = machine.history().iter().collect();
        assert_eq!(history[0].from, LockState::Idle);
        assert_eq!(history[1].to, LockState::Locked);
        assert_eq!(history[2].to, LockState::Lockout);
        assert_eq!(history[2].at, ms(3));
    }

    #[test]
    fn test_history_size_limit() {
        let mut machine = locked_machine();

        for _ in 0..150 {
            machine.transition_to(LockState::Lockout, T0).unwrap();
            machine.transition_to(LockState::Locked, T0).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_history_keeps_most_recent() {
        let mut machine = locked_machine();

        for n in 0..(MAX_HISTORY_SIZE as u64) {
            machine.transition_to(LockState::Lockout, ms(2 * n)).unwrap();
            machine.transition_to(LockState::Locked, ms(2 * n + 1)).unwrap();
        }

        let oldest = machine.history()[0];
        assert_eq!(oldest.from, LockState::Locked);
        assert_eq!(oldest.at, ms(MAX_HISTORY_SIZE as u64));
    }

    #[test]
    fn test_builder_starts_without_window() {
        let machine = StateMachine::builder()
            .with_initial_state(LockState::Locked)
            .build();

        assert_eq!(machine.current_state(), &LockState::Locked);
        assert!(machine.history().is_empty());
        assert!(!machine.has_timed_out(Duration::from_secs(3600)));
    }

    #[rstest]
    #[case(LockState::Idle, false, false)]
    #[case(LockState::AwaitingNewPin, true, false)]
    #[case(LockState::Locked, false, true)]
    #[case(LockState::AwaitingAttempt, true, true)]
    #[case(LockState::Verifying, false, true)]
    #[case(LockState::Unlocked, false, false)]
    #[case(LockState::Lockout, false, true)]
    fn test_state_properties(
        #[case] state: LockState,
        #[case] accepts_digits: bool,
        #[case] secured: bool,
    ) {
        assert_eq!(state.accepts_digits(), accepts_digits);
        assert_eq!(state.is_secured(), secured);
    }

    #[test]
    fn test_state_display_formatting() {
        assert_eq!(LockState::Idle.to_string(), "Idle");
        assert_eq!(LockState::AwaitingNewPin.to_string(), "AwaitingNewPin");
        assert_eq!(LockState::AwaitingAttempt.to_string(), "AwaitingAttempt");
        assert_eq!(LockState::Lockout.to_string(), "Lockout");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&LockState::AwaitingNewPin).unwrap();
        assert_eq!(json, "\"awaiting_new_pin\"");

        let transition = StateTransition::new(LockState::Locked, LockState::Lockout, ms(3));
        let json = serde_json::to_string(&transition).unwrap();
        let back: StateTransition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, transition);
    }
}
