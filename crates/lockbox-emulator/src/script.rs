//! Scripted key presses against the mock panel.
//!
//! A [`Typist`] drives a [`MockPanelHandle`] in step with the controller:
//! it holds each key long enough for the debouncer to confirm it, releases
//! it, and lets the controller run in between. Scripts are written with the
//! labels printed on the keypad (`0`-`9`, `A`-`D`, `*`, `#`).
//!
//! # Examples
//!
//! ```
//! use lockbox_core::LockboxConfig;
//! use lockbox_emulator::{LockState, Lockbox, Typist};
//! use lockbox_hardware::mock::{MockPanel, RecordingDelay};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lockbox_core::Result<()> {
//! let config = LockboxConfig::default();
//! let (panel, handle) = MockPanel::new();
//! let typist = Typist::new(handle, &config);
//! let mut lockbox = Lockbox::new(config, panel, RecordingDelay::new())?;
//!
//! typist.type_str(&mut lockbox, "A1234").await?;
//! assert_eq!(lockbox.state(), LockState::AwaitingNewPin);
//!
//! typist.settle(&mut lockbox).await?;
//! assert_eq!(lockbox.state(), LockState::AwaitingAttempt);
//! assert_eq!(lockbox.secret().unwrap().to_string(), "1234");
//! # Ok(())
//! # }
//! ```

use lockbox_core::{Error, KeyCode, LockboxConfig, Result};
use lockbox_hardware::mock::MockPanelHandle;
use lockbox_hardware::{Delay, LineIo};

use crate::lockbox::Lockbox;
use crate::state_machine::LockState;

/// Scan cycles a key stays released between presses.
const RELEASE_TICKS: u32 = 2;

/// Extra cycles allowed on top of the longest window when settling.
const SETTLE_MARGIN: u64 = 16;

/// Parse a key script such as `"1234A"`.
///
/// Whitespace is ignored.
///
/// # Errors
///
/// Returns `Error::InvalidKeyLabel` for any character that is not a key label.
pub fn parse_keys(script: &str) -> Result<Vec<KeyCode>> {
    script
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(KeyCode::try_from)
        .collect()
}

/// Presses keys on a mock panel while ticking the controller.
#[derive(Debug, Clone)]
pub struct Typist {
    handle: MockPanelHandle,
    hold_ticks: u32,
}

impl Typist {
    /// Create a typist that holds each key just long enough to be confirmed
    /// under `config`.
    pub fn new(handle: MockPanelHandle, config: &LockboxConfig) -> Self {
        // The debouncer fires on the cycle after the threshold is reached
        Self {
            handle,
            hold_ticks: config.debounce_threshold.max(1) + 1,
        }
    }

    /// Panel handle used for the presses.
    pub fn handle(&self) -> &MockPanelHandle {
        &self.handle
    }

    /// Scan cycles each key is held down.
    pub fn hold_ticks(&self) -> u32 {
        self.hold_ticks
    }

    /// Press and release one key.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`Lockbox::tick`]. The key is released
    /// even on error.
    pub async fn press<L: LineIo, D: Delay>(
        &self,
        lockbox: &mut Lockbox<L, D>,
        key: KeyCode,
    ) -> Result<()> {
        self.handle.press(key);
        let held = self.run(lockbox, self.hold_ticks).await;
        self.handle.release();
        held?;
        self.run(lockbox, RELEASE_TICKS).await
    }

    /// Press a sequence of keys.
    ///
    /// # Errors
    ///
    /// Stops at the first failing press.
    pub async fn type_keys<L: LineIo, D: Delay>(
        &self,
        lockbox: &mut Lockbox<L, D>,
        keys: &[KeyCode],
    ) -> Result<()> {
        for &key in keys {
            self.press(lockbox, key).await?;
        }
        Ok(())
    }

    /// Parse and press a key script.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKeyLabel` before pressing anything if the
    /// script contains an unknown label.
    pub async fn type_str<L: LineIo, D: Delay>(
        &self,
        lockbox: &mut Lockbox<L, D>,
        script: &str,
    ) -> Result<()> {
        let keys = parse_keys(script)?;
        self.type_keys(lockbox, &keys).await
    }

    /// Let the controller run until it is waiting for the user again.
    ///
    /// Waiting means `Idle` or `AwaitingAttempt`; every window in between
    /// runs to completion.
    ///
    /// # Errors
    ///
    /// Returns `Error::Timeout` if the controller does not settle within the
    /// longest possible window sequence, or the first tick error.
    pub async fn settle<L: LineIo, D: Delay>(&self, lockbox: &mut Lockbox<L, D>) -> Result<()> {
        let max_ticks = settle_budget(lockbox.config())?;
        let settled = lockbox
            .tick_until(max_ticks, |lb| {
                matches!(lb.state(), LockState::Idle | LockState::AwaitingAttempt)
            })
            .await?;

        if settled {
            Ok(())
        } else {
            Err(Error::Timeout {
                cycles: max_ticks,
                state: lockbox.state().to_string(),
            })
        }
    }

    async fn run<L: LineIo, D: Delay>(
        &self,
        lockbox: &mut Lockbox<L, D>,
        ticks: u32,
    ) -> Result<()> {
        for _ in 0..ticks {
            lockbox.tick().await?;
        }
        Ok(())
    }
}

/// Cycles needed to sit through every window back to back.
fn settle_budget(config: &LockboxConfig) -> Result<u64> {
    let windows = config
        .pin_entry_window()
        .saturating_add(config.unlock_window())
        .saturating_add(config.lockout_window());
    let period = config.scan_period()?.as_nanos().max(1);
    let cycles = u64::try_from(windows.as_nanos() / period).unwrap_or(u64::MAX);
    Ok(cycles.saturating_add(SETTLE_MARGIN))
}
