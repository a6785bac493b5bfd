use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token-bucket tunables (spec.md §9's dynamic config list).
#[derive(Clone, Copy, Debug)]
pub struct RateLimiterConfig {
    pub capacity: f64,
    pub refill_per_second: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { capacity: 60.0, refill_per_second: 1.0 }
    }
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A per-key token bucket, returning the `Retry-After` seconds spec.md
/// §6 names when a request is rejected.
pub struct RateLimiter<K> {
    buckets: Mutex<HashMap<K, Bucket>>,
    config: RateLimiterConfig,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self { buckets: Mutex::new(HashMap::new()), config }
    }

    /// `Ok(())` if the request is allowed; `Err(retry_after)` otherwise.
    pub fn check(&self, key: K) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();
        let bucket = buckets.entry(key).or_insert_with(|| Bucket { tokens: self.config.capacity, last_refill: now });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.config.refill_per_second).min(self.config.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - bucket.tokens;
            let seconds = deficit / self.config.refill_per_second;
            Err(Duration::from_secs_f64(seconds.max(0.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_capacity_then_rejects() {
        let limiter = RateLimiter::new(RateLimiterConfig { capacity: 3.0, refill_per_second: 0.0001 });
        for _ in 0..3 {
            assert!(limiter.check("user-1").is_ok());
        }
        assert!(limiter.check("user-1").is_err());
    }

    #[test]
    fn rejection_carries_a_retry_after() {
        let limiter = RateLimiter::new(RateLimiterConfig { capacity: 1.0, refill_per_second: 1.0 });
        limiter.check("user-1").unwrap();
        let retry_after = limiter.check("user-1").unwrap_err();
        assert!(retry_after.as_secs_f64() > 0.0);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(RateLimiterConfig { capacity: 1.0, refill_per_second: 0.0001 });
        assert!(limiter.check("user-1").is_ok());
        assert!(limiter.check("user-2").is_ok());
    }
}
