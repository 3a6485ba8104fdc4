use std::time::Duration;

/// Default update rate in ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Default cap on updates run for a single frame.
pub const DEFAULT_MAX_STEPS: u32 = 10;

/// Updates due for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedSteps {
    /// Number of fixed updates to run before rendering.
    pub count: u32,

    /// Length of one update, in seconds.
    pub dt: f32,

    /// Progress towards the next update in `[0, 1)`, for render interpolation.
    pub alpha: f32,
}

/// Fixed-rate update scheduler.
///
/// Frame time is accumulated and paid out in whole steps. At most
/// `max_steps` run per frame; a backlog beyond that is dropped so a slow
/// frame cannot snowball into ever longer update bursts.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    max_steps: u32,
    accumulator: Duration,
}

impl FixedStep {
    /// `ticks_per_second == 0` selects [`DEFAULT_TICK_RATE`].
    pub fn new(ticks_per_second: u32, max_steps: u32) -> Self {
        let rate = match ticks_per_second {
            0 => DEFAULT_TICK_RATE,
            n => n,
        };
        Self {
            step: Duration::from_secs(1) / rate,
            max_steps: max_steps.max(1),
            accumulator: Duration::ZERO,
        }
    }

    #[inline]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Adds `elapsed` frame time and returns the updates now due.
    pub fn advance(&mut self, elapsed: Duration) -> FixedSteps {
        self.accumulator += elapsed;

        let mut count = 0;
        while self.accumulator >= self.step && count < self.max_steps {
            self.accumulator -= self.step;
            count += 1;
        }

        if self.accumulator >= self.step {
            let skipped = self.accumulator.as_nanos() / self.step.as_nanos();
            log::debug!("fixed step: dropping {skipped} updates behind schedule");
            let rest = self.accumulator.as_nanos() % self.step.as_nanos();
            self.accumulator = Duration::from_nanos(rest as u64);
        }

        FixedSteps {
            count,
            dt: self.step.as_secs_f32(),
            alpha: self.accumulator.as_secs_f32() / self.step.as_secs_f32(),
        }
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE, DEFAULT_MAX_STEPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn whole_steps_leave_no_remainder() {
        let mut fixed = FixedStep::default();
        let steps = fixed.advance(fixed.step() * 3);
        assert_eq!(steps.count, 3);
        assert!(close(steps.dt, 1.0 / 60.0));
        assert_eq!(steps.alpha, 0.0);
    }

    #[test]
    fn partial_steps_accumulate() {
        let mut fixed = FixedStep::new(50, 10);
        let half = fixed.step() / 2;

        let first = fixed.advance(half);
        assert_eq!(first.count, 0);
        assert!(close(first.alpha, 0.5));

        let second = fixed.advance(half);
        assert_eq!(second.count, 1);
        assert!(close(second.alpha, 0.0));
    }

    #[test]
    fn backlog_beyond_max_steps_is_dropped() {
        let mut fixed = FixedStep::new(60, 10);
        let step = fixed.step();

        let burst = fixed.advance(step * 25 + step / 4);
        assert_eq!(burst.count, 10);
        assert!(close(burst.alpha, 0.25));

        assert_eq!(fixed.advance(Duration::ZERO).count, 0);
    }

    #[test]
    fn zero_rate_selects_default() {
        let fixed = FixedStep::new(0, 0);
        assert_eq!(fixed.step(), Duration::from_secs(1) / DEFAULT_TICK_RATE);
        assert_eq!(fixed.max_steps, 1);
    }
}
