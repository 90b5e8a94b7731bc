use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
enum State {
    Closed,
    Open(Instant),
    HalfOpen,
}

struct Inner {
    state: State,
    consecutive_failures: u32,
}

pub enum Admission {
    Allowed,
    Rejected(u32),
}

/// Closed/open/half-open circuit breaker over provider calls (spec §4.5).
/// `threshold` consecutive failures trip it open; after `cool_down` it
/// admits one probe call in the half-open state.
pub struct CircuitBreaker {
    threshold: u32,
    cool_down: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cool_down: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cool_down,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
            }),
        }
    }

    pub fn admit(&self) -> Admission {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            State::Closed | State::HalfOpen => Admission::Allowed,
            State::Open(opened_at) => {
                if opened_at.elapsed() >= self.cool_down {
                    inner.state = State::HalfOpen;
                    Admission::Allowed
                } else {
                    Admission::Rejected(inner.consecutive_failures)
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures = 0;
        inner.state = State::Closed;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures += 1;
        match inner.state {
            State::HalfOpen => inner.state = State::Open(Instant::now()),
            State::Closed if inner.consecutive_failures >= self.threshold => {
                inner.state = State::Open(Instant::now())
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_open_after_threshold_failures() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        assert!(matches!(breaker.admit(), Admission::Allowed));
        breaker.record_failure();
        assert!(matches!(breaker.admit(), Admission::Allowed));
        breaker.record_failure();
        assert!(matches!(breaker.admit(), Admission::Rejected(2)));
    }

    #[test]
    fn half_opens_after_cool_down_and_closes_on_success() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0));
        breaker.record_failure();
        assert!(matches!(breaker.admit(), Admission::Allowed));
        breaker.record_success();
        breaker.record_failure();
        assert!(matches!(breaker.admit(), Admission::Allowed));
    }
}
