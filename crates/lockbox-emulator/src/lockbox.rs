//! Lockbox controller.
//!
//! The controller owns the whole control loop. One [`tick`](Lockbox::tick)
//! is one scanner cycle followed by at most one lock-state transition:
//!
//! ```text
//! frame  = render(state, buffer, secret)
//! report = scanner.scan(frame)          // refresh display, sample keypad
//! key    = debouncer.step(report.key)   // at most one confirmed key
//! step lock FSM with key                // at most one transition
//! ```
//!
//! Windows (PIN entry, unlock, lockout) are measured in scan time, the sum
//! of settle delays the scanner has waited through. They always run to
//! completion.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::time::Duration;

use lockbox_core::{Code, Frame, KeyCode, LockboxConfig, Result};
use lockbox_hardware::{Delay, LineId, LineIo};
use lockbox_keypad::{DebounceState, Debouncer, EntryBuffer, Scanner};
use tracing::{debug, info, warn};

use crate::display::{Screen, render, render_over, render_screen};
use crate::state_machine::{LockState, StateMachine, StateTransition};

/// Outcome of one control-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Scanner cycle number.
    pub cycle: u64,

    /// Raw key seen by the scanner this cycle.
    pub scanned: Option<KeyCode>,

    /// Key confirmed by the debouncer this cycle.
    pub key: Option<KeyCode>,

    /// Lock-state transition taken this cycle, if any.
    pub transition: Option<StateTransition>,
}

/// Keypad lockbox controller.
///
/// Generic over the line driver and the delay so the same loop runs on the
/// target, against [`MockPanel`](lockbox_hardware::mock::MockPanel), or in
/// a benchmark.
///
/// # Examples
///
/// ```
/// use lockbox_core::LockboxConfig;
/// use lockbox_emulator::{LockState, Lockbox};
/// use lockbox_hardware::mock::{MockPanel, RecordingDelay};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> lockbox_core::Result<()> {
/// let (panel, handle) = MockPanel::new();
/// let mut lockbox = Lockbox::new(LockboxConfig::default(), panel, RecordingDelay::new())?;
///
/// let tick = lockbox.tick().await?;
/// assert_eq!(tick.cycle, 1);
/// assert_eq!(lockbox.state(), LockState::Idle);
/// assert_eq!(handle.display(), [0x40; 4]); // "0000"
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Lockbox<L, D> {
    config: LockboxConfig,
    io: L,
    delay: D,
    scanner: Scanner,
    debouncer: Debouncer,
    buffer: EntryBuffer,
    machine: StateMachine,
    secret: Option<Code>,
    attempt: Option<Code>,
    tries: u32,
    uptime: Duration,
}

impl<L: LineIo, D: Delay> Lockbox<L, D> {
    /// Create a controller in `Idle` with no secret.
    ///
    /// Configures every panel line and leaves the actuator deasserted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid (`Error::Config`)
    /// - A line cannot be configured (`Error::Hardware`)
    pub fn new(config: LockboxConfig, io: L, delay: D) -> Result<Self> {
        Self::assemble(config, io, delay, None)
    }

    fn assemble(
        config: LockboxConfig,
        mut io: L,
        delay: D,
        secret: Option<Code>,
    ) -> Result<Self> {
        config.validate()?;
        Scanner::configure(&mut io)?;

        let initial = if secret.is_some() {
            LockState::Locked
        } else {
            LockState::Idle
        };

        let mut lockbox = Self {
            scanner: Scanner::new(config.scan_settle()),
            debouncer: Debouncer::new(config.debounce_threshold),
            buffer: EntryBuffer::new(),
            machine: StateMachine::builder().with_initial_state(initial).build(),
            secret,
            attempt: None,
            tries: 0,
            uptime: Duration::ZERO,
            config,
            io,
            delay,
        };
        lockbox.drive_indicators()?;

        info!(state = %initial, "lockbox started");
        Ok(lockbox)
    }

    /// Run one scan cycle and one lock-state step.
    ///
    /// # Errors
    ///
    /// Returns an error if a line operation fails. A failed scan leaves the
    /// lock state untouched; a failed indicator write keeps the transition
    /// and is retried on the next tick.
    pub async fn tick(&mut self) -> Result<Tick> {
        let frame = self.frame();
        let report = self
            .scanner
            .scan(&mut self.io, &mut self.delay, &frame)
            .await?;
        self.uptime = self.uptime.saturating_add(report.elapsed);

        let key = self.debouncer.step(report.key);
        let transition = self.step(key)?;
        self.drive_indicators()?;

        Ok(Tick {
            cycle: report.cycle,
            scanned: report.key,
            key,
            transition,
        })
    }

    /// Tick until `done` holds, for at most `max_ticks` cycles.
    ///
    /// Returns `true` if the condition was met.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`tick`](Self::tick).
    pub async fn tick_until<F>(&mut self, max_ticks: u64, mut done: F) -> Result<bool>
    where
        F: FnMut(&Self) -> bool,
    {
        for _ in 0..max_ticks {
            if done(self) {
                return Ok(true);
            }
            self.tick().await?;
        }
        Ok(done(self))
    }

    /// Run the control loop forever.
    ///
    /// # Errors
    ///
    /// Only returns on a line failure.
    pub async fn run(&mut self) -> Result<Infallible> {
        loop {
            self.tick().await?;
        }
    }

    /// Segment patterns for the current state.
    pub fn frame(&self) -> Frame {
        match self.state() {
            LockState::Idle => render_screen(Screen::Zeros),
            LockState::AwaitingNewPin => render(&self.buffer),
            LockState::Locked => render_screen(Screen::Locked),
            LockState::AwaitingAttempt | LockState::Verifying => {
                render_over(&self.buffer.to_code(), Screen::Locked)
            }
            LockState::Unlocked => render_over(&self.secret.unwrap_or_default(), Screen::Blank),
            LockState::Lockout => render_screen(Screen::LockedOut),
        }
    }

    /// Current lock state.
    pub fn state(&self) -> LockState {
        *self.machine.current_state()
    }

    /// Failed attempts since the last unlock or lockout.
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Stored secret, once set.
    pub fn secret(&self) -> Option<&Code> {
        self.secret.as_ref()
    }

    /// Current entry buffer.
    pub fn buffer(&self) -> &EntryBuffer {
        &self.buffer
    }

    /// Debouncer state.
    pub fn debounce_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    /// Total scan time since start-up.
    pub fn uptime(&self) -> Duration {
        self.uptime
    }

    /// Completed scan cycles.
    pub fn cycles(&self) -> u64 {
        self.scanner.cycles()
    }

    /// Time left in the current window, if one is running.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.machine.time_remaining(self.uptime)
    }

    /// Recent lock-state transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// Active configuration.
    pub fn config(&self) -> &LockboxConfig {
        &self.config
    }

    /// Line driver.
    pub fn io(&self) -> &L {
        &self.io
    }

    /// Delay provider.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    fn step(&mut self, key: Option<KeyCode>) -> Result<Option<StateTransition>> {
        let state = self.state();
        if let Some(key) = key.filter(|_| state.accepts_digits()) {
            self.accept(key);
        }

        let next = match state {
            LockState::Idle => {
                (key == Some(KeyCode::Submit)).then_some(LockState::AwaitingNewPin)
            }
            LockState::AwaitingNewPin => {
                if self.machine.has_timed_out(self.uptime) {
                    self.secret = Some(self.buffer.to_code());
                    info!(complete = self.buffer.to_code().is_complete(), "secret stored");
                    Some(LockState::Locked)
                } else {
                    None
                }
            }
            LockState::Locked => {
                if self.tries >= self.config.max_tries {
                    Some(LockState::Lockout)
                } else {
                    Some(LockState::AwaitingAttempt)
                }
            }
            LockState::AwaitingAttempt => (key == Some(KeyCode::UnlockSubmit)).then(|| {
                self.attempt = Some(self.buffer.to_code());
                LockState::Verifying
            }),
            LockState::Verifying => Some(self.verify()),
            LockState::Unlocked | LockState::Lockout => self
                .machine
                .has_timed_out(self.uptime)
                .then_some(LockState::Locked),
        };

        next.map(|state| self.enter(state)).transpose()
    }

    fn accept(&mut self, key: KeyCode) {
        if self.buffer.accept(key) {
            debug!(key = %key, "digit entered");
        }
    }

    /// Compare the captured attempt with the secret and update the try count.
    fn verify(&mut self) -> LockState {
        let attempt = self.attempt.take();
        let granted = matches!(
            (attempt, self.secret),
            (Some(attempt), Some(secret)) if attempt == secret
        );

        if granted {
            self.tries = 0;
            info!("access granted");
            LockState::Unlocked
        } else {
            self.tries += 1;
            warn!(
                tries = self.tries,
                max_tries = self.config.max_tries,
                "access denied"
            );
            LockState::Locked
        }
    }

    fn enter(&mut self, state: LockState) -> Result<StateTransition> {
        let transition = self.machine.transition_to(state, self.uptime)?;

        match state {
            LockState::AwaitingNewPin => {
                self.buffer.clear();
                self.start_window(self.config.pin_entry_window());
            }
            LockState::AwaitingAttempt => self.buffer.clear(),
            LockState::Unlocked => self.start_window(self.config.unlock_window()),
            LockState::Lockout => {
                warn!(tries = self.tries, "too many failed attempts, locking out");
                self.tries = 0;
                self.start_window(self.config.lockout_window());
            }
            LockState::Idle | LockState::Locked | LockState::Verifying => {}
        }

        info!(from = %transition.from, to = %transition.to, "lock state changed");
        Ok(transition)
    }

    fn start_window(&mut self, window: Duration) {
        self.machine.set_timeout(window);
        debug!(window_ms = window.as_millis() as u64, state = %self.state(), "window started");
    }

    /// Set the actuator and indicator LEDs for the current state.
    ///
    /// Runs every tick, so a failed write is retried on the next one.
    fn drive_indicators(&mut self) -> Result<()> {
        let state = self.state();
        self.io.write_line(LineId::Actuator, state == LockState::Unlocked)?;
        self.io
            .write_line(LineId::ReadyLed, state == LockState::AwaitingNewPin)?;
        self.io.write_line(LineId::LockedLed, state.is_secured())?;
        Ok(())
    }
}

/// Builder for a [`Lockbox`] with custom configuration or a preset secret.
///
/// # Examples
///
/// ```
/// use lockbox_core::Code;
/// use lockbox_emulator::{LockState, LockboxBuilder};
/// use lockbox_hardware::mock::{MockPanel, RecordingDelay};
///
/// let (panel, handle) = MockPanel::new();
/// let lockbox = LockboxBuilder::new()
///     .with_secret(Code::from_typed(&[1, 2, 3, 4]).unwrap())
///     .build(panel, RecordingDelay::new())
///     .unwrap();
///
/// assert_eq!(lockbox.state(), LockState::Locked);
/// assert!(handle.is_locked_led_on());
/// ```
#[derive(Debug, Default)]
pub struct LockboxBuilder {
    config: LockboxConfig,
    secret: Option<Code>,
}

impl LockboxBuilder {
    /// Create a builder with the default configuration and no secret.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: LockboxConfig) -> Self {
        self.config = config;
        self
    }

    /// Start in `Locked` with this secret instead of `Idle`.
    ///
    /// Skips the PIN setup phase, which is otherwise the only place a secret
    /// is captured. Meant for tests, benchmarks and bring-up rigs that need
    /// a locked box without typing a PIN first; the device itself never
    /// persists a secret across restarts.
    pub fn with_secret(mut self, secret: Code) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Same as [`Lockbox::new`].
    pub fn build<L: LineIo, D: Delay>(self, io: L, delay: D) -> Result<Lockbox<L, D>> {
        Lockbox::assemble(self.config, io, delay, self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_core::Error;
    use lockbox_hardware::mock::{MockPanel, MockPanelHandle, RecordingDelay};

    fn fast_config() -> LockboxConfig {
        LockboxConfig {
            scan_settle_us: 250,
            debounce_threshold: 2,
            max_tries: 2,
            pin_entry_window_ms: 20,
            unlock_window_ms: 30,
            lockout_window_ms: 50,
        }
    }

    fn lockbox(secret: Option<&[u8]>) -> (Lockbox<MockPanel, RecordingDelay>, MockPanelHandle) {
        let (panel, handle) = MockPanel::new();
        let mut builder = LockboxBuilder::new().with_config(fast_config());
        if let Some(typed) = secret {
            builder = builder.with_secret(Code::from_typed(typed).unwrap());
        }
        (builder.build(panel, RecordingDelay::new()).unwrap(), handle)
    }

    /// Hold `key` until the debouncer fires, then release it.
    async fn press(
        lockbox: &mut Lockbox<MockPanel, RecordingDelay>,
        handle: &MockPanelHandle,
        key: KeyCode,
    ) {
        handle.press(key);
        for _ in 0..3 {
            lockbox.tick().await.unwrap();
        }
        handle.release();
        lockbox.tick().await.unwrap();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let (panel, _handle) = MockPanel::new();
        let config = LockboxConfig {
            max_tries: 0,
            ..fast_config()
        };

        let result = Lockbox::new(config, panel, RecordingDelay::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_new_starts_idle_with_outputs_off() {
        let (lockbox, handle) = lockbox(None);

        assert_eq!(lockbox.state(), LockState::Idle);
        assert_eq!(lockbox.secret(), None);
        assert!(!handle.is_actuator_asserted());
        assert!(!handle.is_ready_led_on());
        assert!(!handle.is_locked_led_on());
    }

    #[tokio::test]
    async fn test_uptime_advances_by_scan_period() {
        let (mut lockbox, _handle) = lockbox(None);

        for _ in 0..4 {
            lockbox.tick().await.unwrap();
        }

        assert_eq!(lockbox.uptime(), Duration::from_millis(4));
        assert_eq!(lockbox.delay().total(), lockbox.uptime());
        assert_eq!(lockbox.cycles(), 4);
    }

    #[tokio::test]
    async fn test_idle_ignores_digits() {
        let (mut lockbox, handle) = lockbox(None);

        press(&mut lockbox, &handle, KeyCode::try_from('5').unwrap()).await;
        press(&mut lockbox, &handle, KeyCode::UnlockSubmit).await;

        assert_eq!(lockbox.state(), LockState::Idle);
        assert!(lockbox.buffer().is_empty());
        assert!(lockbox.history().is_empty());
    }

    #[tokio::test]
    async fn test_submit_starts_pin_entry() {
        let (mut lockbox, handle) = lockbox(None);

        press(&mut lockbox, &handle, KeyCode::Submit).await;

        assert_eq!(lockbox.state(), LockState::AwaitingNewPin);
        assert!(handle.is_ready_led_on());
        assert!(lockbox.time_remaining().is_some());
    }

    #[tokio::test]
    async fn test_locked_moves_to_attempt_on_next_tick() {
        let (mut lockbox, handle) = lockbox(Some(&[1, 2, 3, 4]));
        assert!(handle.is_locked_led_on());

        let tick = lockbox.tick().await.unwrap();

        let transition = tick.transition.unwrap();
        assert_eq!(transition.from, LockState::Locked);
        assert_eq!(transition.to, LockState::AwaitingAttempt);
        assert!(handle.is_locked_led_on());
    }

    #[tokio::test]
    async fn test_one_transition_per_tick() {
        let (mut lockbox, handle) = lockbox(Some(&[7]));
        lockbox.tick().await.unwrap();

        handle.press(KeyCode::UnlockSubmit);
        let mut transitions = 0;
        for _ in 0..10 {
            let tick = lockbox.tick().await.unwrap();
            transitions += u32::from(tick.transition.is_some());
            assert!(transitions <= 3);
        }
        // AwaitingAttempt -> Verifying -> Locked -> AwaitingAttempt
        assert_eq!(transitions, 3);
        assert_eq!(lockbox.tries(), 1);
    }

    #[tokio::test]
    async fn test_digits_only_reach_buffer_while_collecting() {
        let (mut lockbox, handle) = lockbox(Some(&[7]));
        lockbox.tick().await.unwrap();

        press(&mut lockbox, &handle, KeyCode::try_from('7').unwrap()).await;
        press(&mut lockbox, &handle, KeyCode::UnlockSubmit).await;
        assert_eq!(lockbox.state(), LockState::Unlocked);

        press(&mut lockbox, &handle, KeyCode::try_from('5').unwrap()).await;

        assert_eq!(lockbox.state(), LockState::Unlocked);
        assert_eq!(lockbox.buffer().to_code().to_string(), "___7");
    }

    #[tokio::test]
    async fn test_scan_fault_leaves_state_untouched() {
        let (mut lockbox, handle) = lockbox(Some(&[1, 2, 3, 4]));
        handle.inject_fault("column input floating");

        let result = lockbox.tick().await;

        assert!(matches!(result, Err(Error::Hardware(_))));
        assert_eq!(lockbox.state(), LockState::Locked);
        assert_eq!(lockbox.uptime(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_failed_indicator_write_is_retried_next_tick() {
        let (mut lockbox, handle) = lockbox(Some(&[7]));
        lockbox.tick().await.unwrap();
        press(&mut lockbox, &handle, KeyCode::try_from('7').unwrap()).await;

        // Hold the unlock key until the attempt is submitted
        handle.press(KeyCode::UnlockSubmit);
        while lockbox.state() != LockState::Verifying {
            lockbox.tick().await.unwrap();
        }
        handle.release();

        handle.inject_line_fault(LineId::Actuator, "solenoid driver open");
        let result = lockbox.tick().await;

        assert!(matches!(result, Err(Error::Hardware(_))));
        assert_eq!(lockbox.state(), LockState::Unlocked);
        assert!(!handle.is_actuator_asserted());

        lockbox.tick().await.unwrap();

        assert_eq!(lockbox.state(), LockState::Unlocked);
        assert!(handle.is_actuator_asserted());
        assert!(!handle.is_locked_led_on());
    }

    #[tokio::test]
    async fn test_tick_until_reports_timeout() {
        let (mut lockbox, _handle) = lockbox(None);

        let reached = lockbox
            .tick_until(5, |lb| lb.state() == LockState::Locked)
            .await
            .unwrap();

        assert!(!reached);
        assert_eq!(lockbox.cycles(), 5);
    }
}
