//! Per-user request budget, fixed one-minute windows. Optional and
//! fail-open: when disabled (or on any internal oddity) every request is
//! allowed.

use std::time::Instant;

use dashmap::DashMap;
use uuid::Uuid;

pub struct RateLimiter {
    enabled: bool,
    per_minute: u32,
    windows: DashMap<Uuid, (Instant, u32)>,
}

impl RateLimiter {
    pub fn new(enabled: bool, per_minute: u32) -> Self {
        Self {
            enabled,
            per_minute,
            windows: DashMap::new(),
        }
    }

    /// Whether this request fits the user's current window.
    pub fn allow(&self, user_id: Uuid) -> bool {
        if !self.enabled || self.per_minute == 0 {
            return true;
        }

        let now = Instant::now();
        let mut entry = self.windows.entry(user_id).or_insert((now, 0));
        let (window_start, count) = *entry;

        if now.duration_since(window_start).as_secs() >= 60 {
            *entry = (now, 1);
            return true;
        }
        if count < self.per_minute {
            *entry = (window_start, count + 1);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(false, 1);
        let user = Uuid::new_v4();
        for _ in 0..100 {
            assert!(limiter.allow(user));
        }
    }

    #[test]
    fn budget_exhausts_within_a_window() {
        let limiter = RateLimiter::new(true, 3);
        let user = Uuid::new_v4();
        assert!(limiter.allow(user));
        assert!(limiter.allow(user));
        assert!(limiter.allow(user));
        assert!(!limiter.allow(user));
    }

    #[test]
    fn users_have_independent_budgets() {
        let limiter = RateLimiter::new(true, 1);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        assert!(limiter.allow(alice));
        assert!(!limiter.allow(alice));
        assert!(limiter.allow(bob));
    }
}
