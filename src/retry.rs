//! Explicit retry policy with exponential backoff.
//!
//! Applied at each network call site of the Spotify client (token refresh,
//! search, playlist create, each add-tracks chunk) rather than baked into
//! the HTTP layer, so every site carries its own budget.

use std::thread;
use std::time::Duration;

use log::warn;

use crate::error::{Error, Result};

/// Retries an operation on transient errors, sleeping between attempts
/// with a doubling delay capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    name: String,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy.
    ///
    /// * `name` — label for log messages (e.g. "search", "token")
    /// * `max_attempts` — total attempts including the first (min 1)
    /// * `base_delay` — sleep after the first failure
    /// * `max_delay` — upper bound for the doubling delay
    pub fn new(name: &str, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        RetryPolicy {
            name: name.to_string(),
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// The budget used against the Spotify Web API:
    /// 3 attempts, 1 s base delay, 10 s cap.
    pub fn api_default(name: &str) -> Self {
        Self::new(name, 3, Duration::from_secs(1), Duration::from_secs(10))
    }

    /// Run `op`, retrying while it fails with a transient error and the
    /// attempt budget lasts. The final error propagates unchanged.
    pub fn run<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        "[{}] attempt {}/{} failed ({}), retrying in {:.1}s",
                        self.name,
                        attempt,
                        self.max_attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    thread::sleep(delay);
                    delay = (delay * 2).min(self.max_delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
