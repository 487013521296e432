//! 重试与退避策略：纯函数，便于注入随机源进行测试。
//!
//! Retry / backoff policy.
//!
//! Everything here is pure apart from the random value callers pass in, so
//! the schedule is testable with a fixed `unit_random`.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Partial retry configuration as supplied by callers or settings files.
///
/// Missing fields are filled by [`RetryPolicy::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicyConfig {
    /// Total attempts including the first one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_elapsed_ms: Option<u64>,
    /// Fraction of the exponential term added as random jitter, `0..=1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
}

impl RetryPolicyConfig {
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    pub fn base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = Some(ms);
        self
    }

    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = Some(ms);
        self
    }

    pub fn max_elapsed_ms(mut self, ms: u64) -> Self {
        self.max_elapsed_ms = Some(ms);
        self
    }

    pub fn jitter(mut self, j: f64) -> Self {
        self.jitter = Some(j);
        self
    }
}

/// Normalized, immutable retry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    max_elapsed_ms: u64,
    jitter: f64,
}

/// Decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    Fail,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 250;
    pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
    pub const DEFAULT_MAX_ELAPSED_MS: u64 = 20_000;
    pub const DEFAULT_JITTER: f64 = 0.2;

    /// Fill every missing field with a default and clamp the rest into range.
    pub fn normalize(cfg: &RetryPolicyConfig) -> Self {
        let jitter = cfg.jitter.unwrap_or(Self::DEFAULT_JITTER);
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 1.0)
        } else {
            Self::DEFAULT_JITTER
        };
        Self {
            max_attempts: cfg.max_attempts.unwrap_or(Self::DEFAULT_MAX_ATTEMPTS).max(1),
            base_delay_ms: cfg.base_delay_ms.unwrap_or(Self::DEFAULT_BASE_DELAY_MS).max(1),
            max_delay_ms: cfg.max_delay_ms.unwrap_or(Self::DEFAULT_MAX_DELAY_MS),
            max_elapsed_ms: cfg.max_elapsed_ms.unwrap_or(Self::DEFAULT_MAX_ELAPSED_MS).max(1),
            jitter,
        }
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::normalize(&RetryPolicyConfig::default().max_attempts(1))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    pub fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Capped delay before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn delay_for_attempt(&self, attempt: u32, unit_random: f64) -> Duration {
        let raw = backoff_delay(self.base_delay_ms, attempt, self.jitter, unit_random);
        raw.min(Duration::from_millis(self.max_delay_ms))
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed.
    ///
    /// A `Retry-After` hint on a rate-limit error replaces the computed delay,
    /// still capped at `max_delay_ms`.
    pub fn decide(&self, err: &Error, attempt: u32, elapsed: Duration, unit_random: f64) -> Decision {
        if !is_retryable(err) || attempt >= self.max_attempts || elapsed >= self.max_elapsed() {
            return Decision::Fail;
        }
        let cap = Duration::from_millis(self.max_delay_ms);
        let delay = match err {
            Error::RateLimited {
                retry_after_sec: Some(secs),
                ..
            } => Duration::from_secs(*secs).min(cap),
            _ => self.delay_for_attempt(attempt, unit_random),
        };
        Decision::Retry { delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::normalize(&RetryPolicyConfig::default())
    }
}

/// Uncapped exponential backoff with additive jitter.
///
/// `base * 2^(attempt-1) + unit_random * base * 2^(attempt-1) * jitter`,
/// with `unit_random` in `[0, 1)`.
pub fn backoff_delay(base_ms: u64, attempt: u32, jitter: f64, unit_random: f64) -> Duration {
    let factor = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    let exp = base_ms.saturating_mul(factor);
    let spread = (exp as f64) * jitter.clamp(0.0, 1.0) * unit_random.clamp(0.0, 1.0);
    let extra = if spread.is_finite() { spread.floor() as u64 } else { 0 };
    Duration::from_millis(exp.saturating_add(extra))
}

/// Whether a classified error may be retried at all (budget aside).
///
/// Only 5xx server errors are retried; cancellation never is.
pub fn is_retryable(err: &Error) -> bool {
    match err {
        Error::Timeout { context } => !context.cancelled,
        Error::Network { .. } => true,
        Error::RateLimited { .. } => true,
        Error::ServerError { status, .. } => *status >= 500,
        Error::Unauthorized { .. } => false,
        Error::Validation { .. } => false,
    }
}
