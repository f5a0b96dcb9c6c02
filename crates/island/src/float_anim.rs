//! Idle bob-and-sway of the whole island group.

/// Pose offset applied to the island group at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatPose {
    pub y_offset: f32,
    pub yaw: f32,
}

/// A yoyo timeline: rise with quadratic in-out easing while yawing linearly,
/// then play the same timeline backwards, forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatAnimation {
    pub rise: f32,
    pub rise_duration: f32,
    pub sway: f32,
    pub sway_duration: f32,
}

impl Default for FloatAnimation {
    fn default() -> Self {
        Self {
            rise: 0.2,
            rise_duration: 2.0,
            sway: 0.1,
            sway_duration: 3.0,
        }
    }
}

impl FloatAnimation {
    fn cycle(&self) -> f32 {
        self.rise_duration.max(self.sway_duration).max(f32::EPSILON)
    }

    pub fn sample(&self, elapsed: f32) -> FloatPose {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        let cycle = self.cycle();
        let pass = (elapsed / cycle).floor();
        let mut local = elapsed - pass * cycle;
        if pass as u64 % 2 == 1 {
            local = cycle - local;
        }

        let rise_t = (local / self.rise_duration.max(f32::EPSILON)).clamp(0.0, 1.0);
        let sway_t = (local / self.sway_duration.max(f32::EPSILON)).clamp(0.0, 1.0);
        FloatPose {
            y_offset: self.rise * ease_in_out_quad(rise_t),
            yaw: self.sway * sway_t,
        }
    }
}

pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}
