//! Bounded retry schedule for polling loops

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter and a hard cap on attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Total number of attempts, including the first one
    pub max_retries: u32,
}

impl Backoff {
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            max_retries: max_retries.max(1),
        }
    }

    /// Schedule used while waiting for services to accept connections
    pub fn readiness() -> Self {
        Self::new(Duration::from_millis(300), Duration::from_millis(600), 100)
    }

    /// Schedule used while waiting on metric thresholds
    pub fn metrics() -> Self {
        Self::new(Duration::from_millis(300), Duration::from_millis(600), 50)
    }

    /// No sleeping between attempts
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, max_retries)
    }

    /// Delay before retry number `attempt` (0-based), jittered and capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let base = self.min_delay.saturating_mul(factor).min(self.max_delay);
        let spread = base.as_millis() as u64 / 2;
        if spread == 0 {
            return base;
        }
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=spread));
        (base + jitter).min(self.max_delay)
    }

    pub fn start(&self) -> Attempts {
        Attempts {
            backoff: *self,
            attempt: 0,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::readiness()
    }
}

/// Progress through one [`Backoff`] schedule
#[derive(Debug)]
pub struct Attempts {
    backoff: Backoff,
    attempt: u32,
}

impl Attempts {
    /// Attempts made so far, counting the one in progress
    pub fn made(&self) -> u32 {
        self.attempt + 1
    }

    /// Sleep before the next attempt. Returns `false` once the budget is spent.
    pub async fn wait(&mut self) -> bool {
        if self.made() >= self.backoff.max_retries {
            return false;
        }
        let delay = self.backoff.delay_for(self.attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.attempt += 1;
        true
    }
}
