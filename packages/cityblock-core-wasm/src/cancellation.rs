/// Millisecond wall clock.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// `Date.now()` in the browser, the system clock elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Cooperative deadline, polled between features.
pub struct TimeBudget<'a> {
    clock: &'a dyn Clock,
    started_ms: f64,
    budget_ms: f64,
}

impl<'a> TimeBudget<'a> {
    pub fn start(clock: &'a dyn Clock, budget_ms: f64) -> Self {
        Self {
            clock,
            started_ms: clock.now_ms(),
            budget_ms,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        (self.clock.now_ms() - self.started_ms).max(0.0)
    }

    pub fn is_exceeded(&self) -> bool {
        self.elapsed_ms() > self.budget_ms
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Advances by a fixed step every time it is read.
    pub(crate) struct SteppingClock {
        now: Cell<f64>,
        step: f64,
    }

    impl SteppingClock {
        pub(crate) fn new(step: f64) -> Self {
            Self {
                now: Cell::new(0.0),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now_ms(&self) -> f64 {
            let now = self.now.get();
            self.now.set(now + self.step);
            now
        }
    }

    #[test]
    fn budget_trips_after_enough_reads() {
        let clock = SteppingClock::new(10.0);
        let budget = TimeBudget::start(&clock, 25.0);
        assert!(!budget.is_exceeded()); // 10
        assert!(!budget.is_exceeded()); // 20
        assert!(budget.is_exceeded()); // 30
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
        assert!(a > 0.0);
    }
}
