use crate::constants::MAX_STEPS_PER_FRAME;
use crate::geometry::distance;
use crate::types::Vec2f;

/// Drains real elapsed time into whole simulation steps.
#[derive(Clone, Debug)]
pub struct FixedTimestep {
    step_secs: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FixedTimestep {
    pub fn new(step_secs: f32) -> Self {
        Self {
            step_secs,
            accumulator: 0.0,
            max_steps: MAX_STEPS_PER_FRAME,
        }
    }

    /// Number of steps to run for a frame that took `elapsed_secs`. Time
    /// beyond `max_steps` worth of steps is dropped so a stalled frame
    /// cannot snowball.
    pub fn advance(&mut self, elapsed_secs: f32) -> u32 {
        if !(elapsed_secs.is_finite() && elapsed_secs > 0.0) || self.step_secs <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed_secs;
        let mut steps = 0;
        while self.accumulator >= self.step_secs && steps < self.max_steps {
            self.accumulator -= self.step_secs;
            steps += 1;
        }
        if steps == self.max_steps {
            self.accumulator = self.accumulator.min(self.step_secs);
        }
        steps
    }

    /// Fraction of a step left over, for render interpolation.
    pub fn alpha(&self) -> f32 {
        if self.step_secs <= 0.0 {
            return 0.0;
        }
        (self.accumulator / self.step_secs).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

pub(super) fn in_contact(a: Vec2f, b: Vec2f, radius: f32) -> bool {
    distance(a, b) < radius
}
