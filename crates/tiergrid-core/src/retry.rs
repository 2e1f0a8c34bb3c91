//! Retry scheduling with exponential backoff.

use std::time::Duration;

/// Backoff strategy for retrying failed requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Fixed delay between retries.
    Fixed { delay: Duration },
    /// Exponential delay: `base * (factor ^ attempt)`, optionally capped
    /// at `max` and widened with +/- 50% jitter.
    Exponential {
        base: Duration,
        factor: f64,
        max: Option<Duration>,
        jitter: bool,
    },
}

impl Default for Backoff {
    /// 1s, 2s, 4s, ... with no cap and no jitter. Bounded in practice by the
    /// retry budget, not by the backoff itself.
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            factor: 2.0,
            max: None,
            jitter: false,
        }
    }
}

impl Backoff {
    /// Delay before the retry following failed attempt `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let mut seconds = base.as_secs_f64() * scale;
                if let Some(max) = max {
                    seconds = seconds.min(max.as_secs_f64());
                }

                let mut delay = Duration::from_secs_f64(seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Retry budget for one logical fetch.
///
/// Total attempts = `max_retries + 1`. Whether a particular failure is
/// eligible for retry is decided by its `retryable` classification, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Single attempt, no waits. Used for local static assets.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}
