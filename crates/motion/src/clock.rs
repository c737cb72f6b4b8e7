use std::time::{Duration, Instant};

/// Measures elapsed time between animation frames.
///
/// Deltas are clamped to `max_delta` so a window that was hidden or stalled
/// resumes with one ordinary step instead of one huge one.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    max_delta: Duration,
    frames: u64,
}

impl FrameClock {
    pub fn new(start: Instant, max_delta: Duration) -> Self {
        Self {
            last: start,
            max_delta,
            frames: 0,
        }
    }

    /// Seconds since the previous tick, clamped to `[0, max_delta]`.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last);
        if now > self.last {
            self.last = now;
        }
        self.frames += 1;
        if elapsed > self.max_delta {
            tracing::debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                "frame delta clamped"
            );
        }
        elapsed.min(self.max_delta).as_secs_f32()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last(&self) -> Instant {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_elapsed() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0, Duration::from_millis(100));
        let dt = clock.tick(t0 + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
        let dt = clock.tick(t0 + Duration::from_millis(48));
        assert!((dt - 0.032).abs() < 1e-6);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn clamps_long_gaps() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0, Duration::from_millis(100));
        let dt = clock.tick(t0 + Duration::from_secs(5));
        assert!((dt - 0.1).abs() < 1e-6);
    }

    #[test]
    fn time_going_backwards_yields_zero() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(50);
        let mut clock = FrameClock::new(later, Duration::from_millis(100));
        assert_eq!(clock.tick(t0), 0.0);
        assert_eq!(clock.last(), later);
    }
}
