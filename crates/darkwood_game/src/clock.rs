//! Frame clock.
//!
//! Game code reads time from a [`Clock`] instead of a global. During a fixed
//! step `time` is the fixed-step time and [`Clock::delta`] the fixed delta;
//! otherwise both describe the current frame.

/// Default fixed steps per second.
pub const DEFAULT_FIXED_RATE: f32 = 50.0;

/// Longest frame the clock accepts. Longer frames are cut to this so a
/// stall does not turn into a burst of fixed steps.
pub const MAX_FRAME_DELTA: f32 = 1.0 / 3.0;

#[derive(Debug, Clone)]
pub struct Clock {
    /// Seconds since the scene started, as seen by the running phase.
    pub time: f32,
    /// Frames started since the scene started.
    pub frame_count: u64,
    /// Duration of the current frame.
    pub dt: f32,
    /// Duration of one fixed step.
    pub fixed_dt: f32,
    frame_time: f32,
    fixed_time: f32,
    in_fixed: bool,
}

impl Clock {
    #[must_use]
    pub fn new(fixed_rate: f32) -> Self {
        Self {
            time: 0.0,
            frame_count: 0,
            dt: 0.0,
            fixed_dt: 1.0 / fixed_rate.max(1.0),
            frame_time: 0.0,
            fixed_time: 0.0,
            in_fixed: false,
        }
    }

    /// Start a new frame of length `dt`, clamped to [`MAX_FRAME_DELTA`].
    pub fn begin_frame(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_FRAME_DELTA);
        self.frame_count += 1;
        self.dt = dt;
        self.frame_time += dt;
        self.time = self.frame_time;
    }

    /// Whether another fixed step is needed to catch up with frame time.
    #[must_use]
    pub fn fixed_step_due(&self) -> bool {
        self.fixed_time + self.fixed_dt <= self.frame_time + 1e-6
    }

    pub fn begin_fixed(&mut self) {
        self.fixed_time += self.fixed_dt;
        self.in_fixed = true;
        self.time = self.fixed_time;
    }

    pub fn end_fixed(&mut self) {
        self.in_fixed = false;
        self.time = self.frame_time;
    }

    /// Delta time of the running phase.
    #[must_use]
    pub fn delta(&self) -> f32 {
        if self.in_fixed { self.fixed_dt } else { self.dt }
    }

    #[must_use]
    pub fn in_fixed_step(&self) -> bool {
        self.in_fixed
    }

    /// Restart at zero, keeping the fixed rate.
    pub fn reset(&mut self) {
        *self = Self {
            fixed_dt: self.fixed_dt,
            ..Self::new(1.0)
        };
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps_catch_up() {
        let mut clock = Clock::default();
        clock.begin_frame(0.05);
        let mut steps = 0;
        while clock.fixed_step_due() {
            clock.begin_fixed();
            assert!((clock.delta() - 0.02).abs() < 1e-6);
            clock.end_fixed();
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert!((clock.delta() - 0.05).abs() < 1e-6);
        assert!((clock.time - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_time_during_fixed_step() {
        let mut clock = Clock::default();
        clock.begin_frame(1.0 / 60.0);
        assert!(!clock.fixed_step_due());
        clock.begin_frame(1.0 / 60.0);
        assert!(clock.fixed_step_due());
        clock.begin_fixed();
        assert!((clock.time - 0.02).abs() < 1e-6);
        assert!(clock.in_fixed_step());
        clock.end_fixed();
        assert!((clock.time - 2.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = Clock::default();
        clock.begin_frame(10.0);
        assert!((clock.dt - MAX_FRAME_DELTA).abs() < 1e-6);
        let mut steps = 0;
        while clock.fixed_step_due() {
            clock.begin_fixed();
            clock.end_fixed();
            steps += 1;
        }
        assert_eq!(steps, 16);

        clock.begin_frame(-1.0);
        assert_eq!(clock.dt, 0.0);
        assert!(!clock.fixed_step_due());
    }

    #[test]
    fn test_reset_keeps_rate() {
        let mut clock = Clock::new(100.0);
        clock.begin_frame(0.5);
        clock.reset();
        assert_eq!(clock.time, 0.0);
        assert_eq!(clock.frame_count, 0);
        assert!((clock.fixed_dt - 0.01).abs() < 1e-6);
    }
}
