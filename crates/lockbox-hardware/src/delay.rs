//! Tokio-backed delay.

use std::time::Duration;

use tokio::time::Instant;

use crate::traits::Delay;

/// Furthest the schedule may fall behind the clock before it restarts from now.
pub const MAX_LAG: Duration = Duration::from_millis(50);

/// [`Delay`] implementation that sleeps on the Tokio timer.
///
/// The Tokio timer has millisecond resolution, so a single sub-millisecond
/// sleep overshoots. Waits are therefore scheduled against a running
/// deadline: each call adds the requested duration to the previous deadline
/// and sleeps until it, so rounding on one wait is absorbed by the next and
/// real time tracks the requested total. If the caller stalls for longer
/// than [`MAX_LAG`] the schedule restarts from the current instant instead
/// of bursting through the backlog.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lockbox_hardware::{Delay, TokioDelay};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let mut delay = TokioDelay::new();
///     delay.wait(Duration::from_millis(1)).await;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokioDelay {
    deadline: Option<Instant>,
}

impl TokioDelay {
    /// Create a new Tokio delay.
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Instant the last wait was scheduled to end at.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn next_deadline(&self, now: Instant, duration: Duration) -> Instant {
        let base = match self.deadline {
            Some(deadline) if deadline + MAX_LAG >= now => deadline,
            _ => now,
        };
        base.checked_add(duration).unwrap_or(base)
    }
}

impl Delay for TokioDelay {
    async fn wait(&mut self, duration: Duration) {
        let deadline = self.next_deadline(Instant::now(), duration);
        self.deadline = Some(deadline);
        tokio::time::sleep_until(deadline).await;
    }
}
