use std::sync::Mutex;
use std::time::Instant;

/// A simple token bucket guarding calls to the LLM provider (spec §4.5).
/// Exceeding it fails fast with `LlmError::rate_limited()` rather than
/// queueing — queueing belongs to the orchestrator's remediation budget,
/// not this layer.
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<(f64, Instant)>,
}

impl RateLimiter {
    pub fn new(refill_per_sec: f64, burst: u32) -> Self {
        let capacity = (burst.max(1)) as f64;
        Self {
            capacity,
            refill_per_sec: refill_per_sec.max(0.001),
            state: Mutex::new((capacity, Instant::now())),
        }
    }

    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        let (tokens, last) = *state;
        let elapsed = last.elapsed().as_secs_f64();
        let refilled = (tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if refilled >= 1.0 {
            *state = (refilled - 1.0, Instant::now());
            true
        } else {
            *state = (refilled, Instant::now());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_burst_then_blocks() {
        let limiter = RateLimiter::new(0.001, 2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }
}
