//! Recording delay for deterministic tests.

use std::time::Duration;

use crate::traits::Delay;

/// [`Delay`] that returns immediately and records the requested time.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lockbox_hardware::Delay;
/// use lockbox_hardware::mock::RecordingDelay;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let mut delay = RecordingDelay::new();
///     delay.wait(Duration::from_micros(250)).await;
///     delay.wait(Duration::from_micros(250)).await;
///
///     assert_eq!(delay.total(), Duration::from_micros(500));
///     assert_eq!(delay.calls(), 2);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingDelay {
    total: Duration,
    calls: u64,
}

impl RecordingDelay {
    /// Create a new recording delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all requested waits.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of waits requested.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Delay for RecordingDelay {
    async fn wait(&mut self, duration: Duration) {
        self.total += duration;
        self.calls += 1;
    }
}
