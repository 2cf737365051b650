use std::time::Instant;

/// Source of elapsed seconds since the scene started.
pub trait TimeSource {
    fn elapsed(&mut self) -> f32;
}

/// Wall clock. Starts on the first sample, so time spent before the first
/// frame does not count.
#[derive(Debug, Default)]
pub struct Clock {
    start: Option<Instant>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for Clock {
    fn elapsed(&mut self) -> f32 {
        let start = *self.start.get_or_insert_with(Instant::now);
        start.elapsed().as_secs_f32()
    }
}

/// Clock advanced by hand, for headless runs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualClock {
    now: f32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, seconds: f32) {
        self.now += seconds;
    }

    pub fn set(&mut self, seconds: f32) {
        self.now = seconds;
    }
}

impl TimeSource for ManualClock {
    fn elapsed(&mut self) -> f32 {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_starts_near_zero_and_is_monotonic() {
        let mut clock = Clock::new();
        let first = clock.elapsed();
        assert!(first < 0.5);
        let second = clock.elapsed();
        assert!(second >= first);
    }

    #[test]
    fn manual_clock_accumulates() {
        let mut clock = ManualClock::new();
        assert_eq!(clock.elapsed(), 0.0);
        clock.advance(0.5);
        clock.advance(1.5);
        assert_eq!(clock.elapsed(), 2.0);
        clock.set(10.0);
        assert_eq!(clock.elapsed(), 10.0);
    }
}
