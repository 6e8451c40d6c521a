//! Common test utilities for lockbox integration tests.
//!
//! Every test drives a real [`Lockbox`] against a [`MockPanel`] with a
//! [`RecordingDelay`], so windows elapse in scan time without sleeping.
//! The configuration is shortened to keep the tests fast:
//!
//! | Setting            | Value  |
//! |--------------------|--------|
//! | scan period        | 1 ms   |
//! | debounce threshold | 3      |
//! | max tries          | 3      |
//! | PIN entry window   | 200 ms |
//! | unlock window      | 300 ms |
//! | lockout window     | 1 s    |

#![allow(dead_code)]

use std::time::Duration;

use lockbox_core::{Code, LockboxConfig};
use lockbox_emulator::{
    LockState, Lockbox, LockboxBuilder, StateTransition, Typist, describe,
};
use lockbox_hardware::mock::{MockPanel, MockPanelHandle, RecordingDelay};

pub const PIN_ENTRY_WINDOW: Duration = Duration::from_millis(200);
pub const UNLOCK_WINDOW: Duration = Duration::from_millis(300);
pub const LOCKOUT_WINDOW: Duration = Duration::from_secs(1);
pub const MAX_TRIES: u32 = 3;

/// Shortened configuration used by every integration test.
pub fn test_config() -> LockboxConfig {
    LockboxConfig {
        scan_settle_us: 250,
        debounce_threshold: 3,
        max_tries: MAX_TRIES,
        pin_entry_window_ms: PIN_ENTRY_WINDOW.as_millis() as u64,
        unlock_window_ms: UNLOCK_WINDOW.as_millis() as u64,
        lockout_window_ms: LOCKOUT_WINDOW.as_millis() as u64,
    }
}

/// A controller wired to a mock panel, plus the means to press its keys.
pub struct Rig {
    pub lockbox: Lockbox<MockPanel, RecordingDelay>,
    pub handle: MockPanelHandle,
    pub typist: Typist,
}

impl Rig {
    /// Fresh controller in `Idle`.
    pub fn new() -> Self {
        Self::build(LockboxBuilder::new())
    }

    /// Controller restored with `secret` (typed order), starting in `Locked`.
    pub fn with_secret(secret: &[u8]) -> Self {
        let code = Code::from_typed(secret).expect("valid digits");
        Self::build(LockboxBuilder::new().with_secret(code))
    }

    fn build(builder: LockboxBuilder) -> Self {
        let config = test_config();
        let (panel, handle) = MockPanel::new();
        let typist = Typist::new(handle.clone(), &config);
        let lockbox = builder
            .with_config(config)
            .build(panel, RecordingDelay::new())
            .expect("valid test configuration");
        Self {
            lockbox,
            handle,
            typist,
        }
    }

    /// Press the keys in `script`, one after another.
    pub async fn type_str(&mut self, script: &str) {
        self.typist
            .type_str(&mut self.lockbox, script)
            .await
            .expect("typing succeeds");
    }

    /// Run until the controller waits for the user again.
    pub async fn settle(&mut self) {
        self.typist
            .settle(&mut self.lockbox)
            .await
            .expect("controller settles");
    }

    /// Run one scan cycle.
    pub async fn tick(&mut self) {
        self.lockbox.tick().await.expect("tick succeeds");
    }

    /// Set a new PIN from `Idle` and wait until the box is ready for attempts.
    pub async fn set_pin(&mut self, pin: &str) {
        assert_state(self, LockState::Idle);
        self.type_str(&format!("A{pin}")).await;
        self.settle().await;
        assert_state(self, LockState::AwaitingAttempt);
    }

    /// Text the controller is about to show on the panel.
    pub fn shown(&self) -> String {
        describe(self.lockbox.frame().raw())
    }

    /// Text latched on the panel by the last scan cycle.
    pub fn panel_text(&self) -> String {
        describe(self.handle.display())
    }

    pub fn state(&self) -> LockState {
        self.lockbox.state()
    }

    /// Time spent in `state` the last time it was left.
    pub fn time_spent_in(&self, state: LockState) -> Option<Duration> {
        let history: Vec<&StateTransition> = self.lockbox.history().iter().collect();
        history.windows(2).rev().find_map(|pair| {
            (pair[0].to == state && pair[1].from == state).then(|| pair[1].at - pair[0].at)
        })
    }

    /// Sequence of states entered, oldest first.
    pub fn states_entered(&self) -> Vec<LockState> {
        self.lockbox.history().iter().map(|t| t.to).collect()
    }
}

/// Assert the controller is in `expected`.
pub fn assert_state(rig: &Rig, expected: LockState) {
    assert_eq!(
        rig.state(),
        expected,
        "expected {expected}, history: {:?}",
        rig.states_entered()
    );
}

/// Assert the actuator and both indicator LEDs.
pub fn assert_outputs(rig: &Rig, actuator: bool, ready_led: bool, locked_led: bool) {
    assert_eq!(rig.handle.is_actuator_asserted(), actuator, "actuator");
    assert_eq!(rig.handle.is_ready_led_on(), ready_led, "ready LED");
    assert_eq!(rig.handle.is_locked_led_on(), locked_led, "locked LED");
}
