//! Token-bucket rate limiter with fractional refill accumulation.
//!
//! No teacher module does this directly; built in the teacher's idiom — a
//! plain struct behind a single `parking_lot::Mutex`, with clamped setters
//! for dynamic reconfiguration, the same shape as `utils::performance`'s
//! `PerformanceConfig`.

use parking_lot::Mutex;
use std::time::Instant;

struct State {
    tokens: f64,
    last_refill: Instant,
    rate_per_sec: f64,
    burst: f64,
    enabled: bool,
}

/// A token bucket: `rate_per_sec` tokens accumulate continuously (fractional
/// remainders carried across calls so a low rate isn't rounded to zero),
/// capped at `burst`. `try_acquire` consumes one token if available.
pub struct RateLimiter {
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn new(rate_per_sec: f64, burst: f64) -> Self {
        RateLimiter {
            state: Mutex::new(State {
                tokens: burst,
                last_refill: Instant::now(),
                rate_per_sec,
                burst,
                enabled: true,
            }),
        }
    }

    fn refill(state: &mut State) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.last_refill = now;
        state.tokens = (state.tokens + elapsed * state.rate_per_sec).min(state.burst);
    }

    /// Returns `true` if a token was available and consumed.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if !state.enabled {
            return true;
        }
        Self::refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn set_rate(&self, rate_per_sec: f64) {
        let mut state = self.state.lock();
        Self::refill(&mut state);
        state.rate_per_sec = rate_per_sec.max(0.0);
    }

    pub fn set_burst(&self, burst: f64) {
        let mut state = self.state.lock();
        let burst = burst.max(0.0);
        state.burst = burst;
        state.tokens = state.tokens.min(burst);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    /// Atomically reset capacity, refill rate, token count, and last-refill
    /// time in one lock acquisition (`spec.md` §4.8: "configure(rate, burst,
    /// enabled) atomically resets..."). Unlike `set_rate`/`set_burst`, which
    /// preserve accumulated tokens, this refills the bucket to full.
    pub fn configure(&self, rate_per_sec: f64, burst: f64, enabled: bool) {
        let mut state = self.state.lock();
        let burst = burst.max(0.0);
        state.rate_per_sec = rate_per_sec.max(0.0);
        state.burst = burst;
        state.tokens = burst;
        state.last_refill = Instant::now();
        state.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.state.lock().enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn burst_allows_immediate_consumption() {
        let limiter = RateLimiter::new(1.0, 3.0);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(0.0, 0.0);
        limiter.set_enabled(false);
        for _ in 0..10 {
            assert!(limiter.try_acquire());
        }
    }

    #[test]
    fn tokens_refill_over_time() {
        let limiter = RateLimiter::new(1000.0, 1.0);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        thread::sleep(Duration::from_millis(20));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn set_burst_clamps_current_tokens() {
        let limiter = RateLimiter::new(0.0, 10.0);
        limiter.set_burst(2.0);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn configure_refills_the_bucket_to_the_new_burst() {
        let limiter = RateLimiter::new(1.0, 1.0);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        limiter.configure(1.0, 5.0, true);
        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn configure_can_disable_the_limiter() {
        let limiter = RateLimiter::new(1.0, 1.0);
        limiter.configure(1.0, 1.0, false);
        for _ in 0..10 {
            assert!(limiter.try_acquire());
        }
    }
}
