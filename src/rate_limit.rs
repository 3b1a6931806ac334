use std::hash::Hash;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::FormKind;

/// Fixed-size window counter keyed by `K`. A window opens on the first hit and resets
/// once it is older than `window`.
pub struct WindowCounter<K: Eq + Hash> {
    entries: DashMap<K, (u32, Instant)>,
}

impl<K: Eq + Hash> Default for WindowCounter<K> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash> WindowCounter<K> {
    /// Count a hit and report whether it is within `limit`. Err carries retry-after seconds.
    pub fn hit(&self, key: K, limit: u32, window: Duration) -> Result<(), u64> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= limit {
            return Err(retry_after(*start, now, window));
        }

        *count += 1;
        Ok(())
    }

    /// Report whether `key` is over `limit` without counting.
    pub fn peek(&self, key: &K, limit: u32, window: Duration) -> Result<(), u64> {
        let now = Instant::now();
        let Some(entry) = self.entries.get(key) else {
            return Ok(());
        };
        let (count, start) = *entry.value();

        if now.duration_since(start) > window || count < limit {
            Ok(())
        } else {
            Err(retry_after(start, now, window))
        }
    }

    pub fn clear(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop entries whose window opened more than `max_age` ago.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
        before - self.entries.len()
    }
}

fn retry_after(start: Instant, now: Instant, window: Duration) -> u64 {
    window
        .as_secs()
        .saturating_sub(now.duration_since(start).as_secs())
        .max(1)
}

/// Per-IP, per-form limiter for public submissions.
#[derive(Default)]
pub struct SubmissionRateLimiter {
    counter: WindowCounter<(FormKind, IpAddr)>,
}

impl SubmissionRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, kind: FormKind, ip: IpAddr, limit: u32, window_secs: u64) -> Result<(), u64> {
        self.counter
            .hit((kind, ip), limit, Duration::from_secs(window_secs))
    }

    pub fn cleanup(&self, max_age: Duration) -> usize {
        self.counter.cleanup(max_age)
    }
}

const LOGIN_MAX_FAILURES: u32 = 5;
const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-email brute force guard: 5 failed sign-ins per 15 minutes.
#[derive(Default)]
pub struct LoginRateLimiter {
    failures: WindowCounter<String>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Does not count the attempt. Call [`record_failure`](Self::record_failure) on a bad password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        self.failures
            .peek(&email.to_lowercase(), LOGIN_MAX_FAILURES, LOGIN_WINDOW)
    }

    pub fn record_failure(&self, email: &str) {
        // The limit only matters for `check`; here we just need the count to grow.
        let _ = self
            .failures
            .hit(email.to_lowercase(), u32::MAX, LOGIN_WINDOW);
    }

    pub fn record_success(&self, email: &str) {
        self.failures.clear(&email.to_lowercase());
    }

    pub fn cleanup(&self, max_age: Duration) -> usize {
        self.failures.cleanup(max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_limit_is_per_form_and_ip() {
        let limiter = SubmissionRateLimiter::new();
        let ip: IpAddr = "192.0.2.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(FormKind::Contact, ip, 3, 60).is_ok());
        }
        let retry = limiter.check(FormKind::Contact, ip, 3, 60).unwrap_err();
        assert!(retry >= 1 && retry <= 60);

        // Different form, same visitor
        assert!(limiter.check(FormKind::Donation, ip, 3, 60).is_ok());
        // Same form, different visitor
        assert!(limiter.check(FormKind::Contact, "192.0.2.2".parse().unwrap(), 3, 60).is_ok());
    }

    #[test]
    fn login_locks_after_five_failures_case_insensitively() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("Priest@Parish.org");
        }
        assert!(limiter.check("priest@parish.org").is_ok());

        limiter.record_failure("priest@parish.org");
        assert!(limiter.check("PRIEST@parish.org").is_err());

        limiter.record_success("priest@parish.org");
        assert!(limiter.check("priest@parish.org").is_ok());
    }

    #[test]
    fn cleanup_removes_stale_windows() {
        let counter: WindowCounter<u8> = WindowCounter::default();
        counter.hit(1, 10, Duration::from_secs(60)).unwrap();
        assert_eq!(counter.cleanup(Duration::ZERO), 1);
        assert_eq!(counter.cleanup(Duration::ZERO), 0);
    }
}
