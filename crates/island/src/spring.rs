//! Damped spring used to ease hover scale changes.

use engine_core::sanitize_delta;

/// Largest integration step; the spring is stiff enough to blow up at 30 Hz.
const MAX_SUBSTEP: f32 = 1.0 / 240.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSpring {
    pub value: f32,
    pub velocity: f32,
    pub target: f32,
    pub tension: f32,
    pub friction: f32,
    pub mass: f32,
}

impl Default for ScaleSpring {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ScaleSpring {
    /// Spring at rest on `value` with tension 300 / friction 30.
    pub fn new(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
            target: value,
            tension: 300.0,
            friction: 30.0,
            mass: 1.0,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Integrate by `dt` seconds (semi-implicit Euler, sub-stepped).
    pub fn update(&mut self, dt: f32) {
        let mut remaining = sanitize_delta(dt);
        let mass = self.mass.max(f32::EPSILON);
        while remaining > 0.0 {
            let h = remaining.min(MAX_SUBSTEP);
            let force = -self.tension * (self.value - self.target) - self.friction * self.velocity;
            self.velocity += force / mass * h;
            self.value += self.velocity * h;
            remaining -= h;
        }
        if self.is_settled() {
            self.value = self.target;
            self.velocity = 0.0;
        }
    }

    pub fn is_settled(&self) -> bool {
        (self.value - self.target).abs() < 1e-4 && self.velocity.abs() < 1e-3
    }
}
