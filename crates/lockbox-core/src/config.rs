//! Runtime configuration for the lockbox controller.
//!
//! All timing values are expressed as durations rather than loop iteration
//! counts. Windows are measured in scan time: the sum of the settle delays
//! the scanner has waited through.
//!
//! # Examples
//!
//! ```
//! use lockbox_core::LockboxConfig;
//! use std::time::Duration;
//!
//! let config = LockboxConfig::default();
//! config.validate().unwrap();
//!
//! assert_eq!(config.scan_period().unwrap(), Duration::from_millis(1));
//! assert_eq!(config.lockout_window(), Duration::from_secs(180));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    constants::{
        DEFAULT_DEBOUNCE_THRESHOLD, DEFAULT_LOCKOUT_WINDOW_MS, DEFAULT_MAX_TRIES,
        DEFAULT_PIN_ENTRY_WINDOW_MS, DEFAULT_SCAN_SETTLE_US, DEFAULT_UNLOCK_WINDOW_MS,
        DIGIT_COUNT,
    },
};

/// Lockbox timing and policy configuration.
///
/// Missing fields fall back to their defaults when deserializing.
///
/// # Invariants
///
/// Checked by [`validate`](LockboxConfig::validate):
/// - every value is non-zero
/// - lockout window > unlock window > PIN entry window > debounce time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockboxConfig {
    /// Settle delay after driving each display digit, in microseconds.
    pub scan_settle_us: u64,

    /// Consecutive identical scans required to confirm a key press.
    pub debounce_threshold: u32,

    /// Failed attempts that trigger a lockout.
    pub max_tries: u32,

    /// Time allowed to type a new PIN, in milliseconds.
    pub pin_entry_window_ms: u64,

    /// Time the actuator stays asserted after a successful unlock, in milliseconds.
    pub unlock_window_ms: u64,

    /// Lockout duration, in milliseconds.
    pub lockout_window_ms: u64,
}

impl Default for LockboxConfig {
    fn default() -> Self {
        Self {
            scan_settle_us: DEFAULT_SCAN_SETTLE_US,
            debounce_threshold: DEFAULT_DEBOUNCE_THRESHOLD,
            max_tries: DEFAULT_MAX_TRIES,
            pin_entry_window_ms: DEFAULT_PIN_ENTRY_WINDOW_MS,
            unlock_window_ms: DEFAULT_UNLOCK_WINDOW_MS,
            lockout_window_ms: DEFAULT_LOCKOUT_WINDOW_MS,
        }
    }
}

impl LockboxConfig {
    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if:
    /// - any value is zero
    /// - the windows are not strictly ordered
    ///   (lockout > unlock > PIN entry > debounce time)
    /// - the scan period or debounce time does not fit in a `Duration`
    pub fn validate(&self) -> Result<()> {
        let non_zero = [
            ("scan_settle_us", self.scan_settle_us),
            ("debounce_threshold", u64::from(self.debounce_threshold)),
            ("max_tries", u64::from(self.max_tries)),
            ("pin_entry_window_ms", self.pin_entry_window_ms),
            ("unlock_window_ms", self.unlock_window_ms),
            ("lockout_window_ms", self.lockout_window_ms),
        ];
        if let Some((name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }

        if self.lockout_window() <= self.unlock_window() {
            return Err(Error::Config(format!(
                "lockout window ({}ms) must be longer than unlock window ({}ms)",
                self.lockout_window_ms, self.unlock_window_ms
            )));
        }
        if self.unlock_window() <= self.pin_entry_window() {
            return Err(Error::Config(format!(
                "unlock window ({}ms) must be longer than PIN entry window ({}ms)",
                self.unlock_window_ms, self.pin_entry_window_ms
            )));
        }
        let debounce_time = self.debounce_time()?;
        if self.pin_entry_window() <= debounce_time {
            return Err(Error::Config(format!(
                "PIN entry window ({}ms) must be longer than debounce time ({}us)",
                self.pin_entry_window_ms,
                debounce_time.as_micros()
            )));
        }

        Ok(())
    }

    /// Settle delay after each display digit.
    pub fn scan_settle(&self) -> Duration {
        Duration::from_micros(self.scan_settle_us)
    }

    /// Duration of one full scan cycle (all four digits).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the period overflows a `Duration`.
    pub fn scan_period(&self) -> Result<Duration> {
        self.scan_settle()
            .checked_mul(DIGIT_COUNT as u32)
            .ok_or_else(|| Error::Config("scan period overflows".to_string()))
    }

    /// Minimum hold time before a key press is confirmed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the debounce time overflows a `Duration`.
    pub fn debounce_time(&self) -> Result<Duration> {
        self.scan_period()?
            .checked_mul(self.debounce_threshold)
            .ok_or_else(|| {
                Error::Config(format!(
                    "debounce time overflows ({} scans of {}us settle)",
                    self.debounce_threshold, self.scan_settle_us
                ))
            })
    }

    /// Time allowed to type a new PIN.
    pub fn pin_entry_window(&self) -> Duration {
        Duration::from_millis(self.pin_entry_window_ms)
    }

    /// Time the actuator stays asserted after an unlock.
    pub fn unlock_window(&self) -> Duration {
        Duration::from_millis(self.unlock_window_ms)
    }

    /// Lockout duration.
    pub fn lockout_window(&self) -> Duration {
        Duration::from_millis(self.lockout_window_ms)
    }
}
