//! Frame clock for the animation loop.

/// Largest delta a single frame may report. A stalled window (minimised, debugger
/// pause) would otherwise hand the simulation one enormous step.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Tracks elapsed time and per-frame delta for the frame callback.
///
/// The loop steps it by a fixed delta, so simulation time never depends on how
/// long a frame actually took.
#[derive(Debug)]
pub struct FrameClock {
    /// Delta of the last frame in seconds, already clamped.
    delta: f32,
    /// Accumulated simulation time in seconds.
    elapsed: f64,
    /// Frames ticked since creation.
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            delta: 0.0,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Step the clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.delta = sanitize_delta(dt);
        self.elapsed += self.delta as f64;
        self.frame_count += 1;
    }

    /// Delta of the last frame in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    /// Total simulated time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Instantaneous FPS derived from the last delta.
    pub fn fps(&self) -> f32 {
        if self.delta > 0.0 {
            1.0 / self.delta
        } else {
            0.0
        }
    }
}

/// Clamp a frame delta into `[0, MAX_FRAME_DELTA]`; NaN and negative deltas become 0.
pub fn sanitize_delta(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DELTA)
    } else {
        0.0
    }
}
