use std::time::{Duration, Instant};

/// Source of elapsed time used to bound per-frame work.
pub trait Clock {
    fn now(&mut self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Measures a single operation against its time budget.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    started: Duration,
    limit: Duration,
}

impl Budget {
    pub fn start<C: Clock>(clock: &mut C, limit: Duration) -> Self {
        Self {
            started: clock.now(),
            limit,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn elapsed<C: Clock>(&self, clock: &mut C) -> Duration {
        clock.now().checked_sub(self.started).unwrap_or_default()
    }

    pub fn exceeded<C: Clock>(&self, clock: &mut C) -> bool {
        self.elapsed(clock) > self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct MockClock {
        times: RefCell<Vec<Duration>>,
    }

    impl MockClock {
        fn new(times: Vec<Duration>) -> Self {
            Self {
                times: RefCell::new(times),
            }
        }
    }

    impl Clock for MockClock {
        fn now(&mut self) -> Duration {
            let mut times = self.times.borrow_mut();
            if times.len() == 1 {
                times[0]
            } else {
                times.remove(0)
            }
        }
    }

    #[test]
    fn budget_within_limit() {
        let mut clock = MockClock::new(vec![Duration::from_millis(10), Duration::from_millis(40)]);
        let budget = Budget::start(&mut clock, Duration::from_millis(50));
        assert!(!budget.exceeded(&mut clock));
    }

    #[test]
    fn budget_exceeded_after_limit() {
        let mut clock = MockClock::new(vec![Duration::from_millis(10), Duration::from_millis(75)]);
        let budget = Budget::start(&mut clock, Duration::from_millis(50));
        assert_eq!(budget.elapsed(&mut clock), Duration::from_millis(65));
    }

    #[test]
    fn clock_regression_saturates_to_zero() {
        let mut clock = MockClock::new(vec![Duration::from_millis(30), Duration::from_millis(20)]);
        let budget = Budget::start(&mut clock, Duration::from_millis(5));
        assert!(!budget.exceeded(&mut clock));
    }
}
