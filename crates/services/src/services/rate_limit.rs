//! Per-user sliding-window rate limiting.

use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct RateLimiter {
    hits: Arc<DashMap<Uuid, VecDeque<Instant>>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            hits: Arc::new(DashMap::new()),
            limit: limit.max(1) as usize,
            window,
        }
    }

    /// Record a hit for `key`, or return how long until the next one is allowed.
    pub fn check(&self, key: Uuid) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: Uuid, now: Instant) -> Result<(), Duration> {
        let mut hits = self.hits.entry(key).or_default();
        while let Some(&oldest) = hits.front() {
            if now.duration_since(oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= self.limit {
            let oldest = hits.front().copied().unwrap_or(now);
            return Err(self.window.saturating_sub(now.duration_since(oldest)));
        }
        hits.push_back(now);
        Ok(())
    }

    /// Drop keys with no hits inside the window.
    pub fn prune(&self) {
        let now = Instant::now();
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|&last| now.duration_since(last) < self.window)
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_reports_wait() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let user = Uuid::new_v4();
        let start = Instant::now();

        assert!(limiter.check_at(user, start).is_ok());
        assert!(limiter.check_at(user, start + Duration::from_secs(10)).is_ok());

        let wait = limiter
            .check_at(user, start + Duration::from_secs(20))
            .unwrap_err();
        assert_eq!(wait, Duration::from_secs(40));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let user = Uuid::new_v4();
        let start = Instant::now();

        assert!(limiter.check_at(user, start).is_ok());
        assert!(limiter.check_at(user, start + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at(user, start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn users_are_limited_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check(Uuid::new_v4()).is_ok());
        assert!(limiter.check(Uuid::new_v4()).is_ok());
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn prune_forgets_idle_keys() {
        let limiter = RateLimiter::new(5, Duration::from_millis(0));
        limiter.check(Uuid::new_v4()).unwrap();
        limiter.prune();
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
