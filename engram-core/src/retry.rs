//! Retry scheduling for transient upstream failures.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter. Adapters own the sleeping; this type
/// only computes the schedule.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based: the delay taken after
    /// the first failure is `delay_for(1)`). Doubles per attempt, capped,
    /// with up to 25% random jitter added.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(self.max_delay);
        let jitter = rand::thread_rng().gen_range(0.0..0.25);
        capped.mul_f64(1.0 + jitter).min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        let d1 = policy.delay_for(1);
        let d2 = policy.delay_for(2);
        assert!(d1 >= Duration::from_secs(1));
        assert!(d2 >= Duration::from_secs(2));
        // Far beyond the cap, delay stays at max_delay.
        assert!(policy.delay_for(30) <= Duration::from_secs(10));
    }

    #[test]
    fn three_attempts_by_default() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
