//! Ambient particle field: fireflies / dust drifting in a shell around the island.
//!
//! The field owns a fixed-size structure-of-arrays buffer. Particles never die;
//! a particle that drifts past `spread_radius + RECYCLE_MARGIN` is resampled into
//! the spawn volume on the same tick.

use engine_core::{lerp_color, sanitize_delta, Transform};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Radius of the empty core the island sits in.
pub const INNER_RADIUS: f32 = 3.0;
/// Distance past `spread_radius` at which a particle gets recycled.
pub const RECYCLE_MARGIN: f32 = 5.0;
/// Per-axis drift per 60 Hz tick.
pub const DRIFT_AMPLITUDE: f32 = 0.01;
/// Field yaw added every tick (radians).
pub const FIELD_YAW_PER_TICK: f32 = 0.001;

const SPIRAL_RADIUS_JITTER: f32 = 0.2;
const MIN_BASE_SIZE: f32 = 0.05;
const BASE_SIZE_JITTER: f32 = 0.1;
const BASE_OPACITY: f32 = 0.6;
const OPACITY_JITTER: f32 = 0.3;

/// How spawn positions are distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleDistribution {
    /// Uniform azimuth and polar angle: a thick spherical shell.
    Isotropic,
    /// Height sampled from `height_range` on a slightly jittered shell.
    #[default]
    Spiral,
}

/// Tunables for spawning. Only newly spawned or recycled particles pick up changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleConfig {
    pub spread_radius: f32,
    pub height_range: f32,
    /// Gradient color at the bottom of the volume.
    pub color_a: Vec3,
    /// Gradient color at the top of the volume.
    pub color_b: Vec3,
    pub size_scale: f32,
    pub distribution: ParticleDistribution,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            spread_radius: 2.0,
            height_range: 2.0,
            color_a: Vec3::ONE,
            color_b: Vec3::ONE,
            size_scale: 1.0,
            distribution: ParticleDistribution::default(),
        }
    }
}

impl ParticleConfig {
    /// Replace non-finite or negative values so sampling math stays defined.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let non_negative = |v: f32, fallback: f32| if v.is_finite() { v.max(0.0) } else { fallback };
        let color = |c: Vec3, fallback: Vec3| {
            if c.is_finite() {
                c.clamp(Vec3::ZERO, Vec3::ONE)
            } else {
                fallback
            }
        };
        Self {
            spread_radius: non_negative(self.spread_radius, defaults.spread_radius),
            height_range: non_negative(self.height_range, defaults.height_range),
            color_a: color(self.color_a, defaults.color_a),
            color_b: color(self.color_b, defaults.color_b),
            size_scale: non_negative(self.size_scale, defaults.size_scale),
            distribution: self.distribution,
        }
    }

    /// Particles beyond this distance from the origin are recycled.
    pub fn recycle_bound(&self) -> f32 {
        self.spread_radius + RECYCLE_MARGIN
    }

    /// Outer radius of the spawn volume.
    pub fn outer_radius(&self) -> f32 {
        INNER_RADIUS + self.spread_radius
    }

    /// Gradient color for a particle spawned at `position`: `color_a` at the
    /// bottom of the volume, `color_b` at the top.
    pub fn gradient_color(&self, position: Vec3) -> Vec3 {
        let extent = match self.distribution {
            ParticleDistribution::Spiral if self.height_range > f32::EPSILON => self.height_range * 0.5,
            _ => self.outer_radius(),
        };
        lerp_color(self.color_a, self.color_b, (position.y / extent + 1.0) * 0.5)
    }

    /// Size multiplier for a particle spawned at `position`: 1 at the center,
    /// halved at the outer radius and beyond.
    pub fn size_falloff(&self, position: Vec3) -> f32 {
        let outer = self.outer_radius();
        let t = if outer > f32::EPSILON { (position.length() / outer).clamp(0.0, 1.0) } else { 1.0 };
        1.0 - 0.5 * t
    }
}

/// Snapshot of one particle, as handed to the render sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub color: Vec3,
    pub size: f32,
    pub opacity: f32,
    /// Oscillation speed multiplier.
    pub speed: f32,
}

/// Fixed-capacity particle buffer plus its evolution rule.
pub struct ParticleField {
    config: ParticleConfig,
    /// Number of particles ticked and emitted; the rest of the buffer is parked.
    active: usize,
    positions: Vec<Vec3>,
    speeds: Vec<f32>,
    colors: Vec<Vec3>,
    sizes: Vec<f32>,
    opacities: Vec<f32>,
    /// Accumulated field yaw (radians, wrapped to `[0, TAU)`).
    yaw: f32,
    recycled: u64,
    rng: StdRng,
}

impl ParticleField {
    /// Allocate and sample `count` particles, all active.
    pub fn initialize(count: usize, config: ParticleConfig, seed: u64) -> Self {
        Self::with_capacity(count, count, config, seed)
    }

    /// Allocate `capacity` slots and activate the first `active` of them.
    ///
    /// Every slot is sampled up front so activating one later never reads stale data.
    pub fn with_capacity(capacity: usize, active: usize, config: ParticleConfig, seed: u64) -> Self {
        let mut field = Self {
            config: config.sanitized(),
            active: active.min(capacity),
            positions: vec![Vec3::ZERO; capacity],
            speeds: vec![0.0; capacity],
            colors: vec![Vec3::ONE; capacity],
            sizes: vec![0.0; capacity],
            opacities: vec![0.0; capacity],
            yaw: 0.0,
            recycled: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        for i in 0..capacity {
            field.spawn(i);
        }
        field
    }

    /// Advance the field by one frame.
    ///
    /// Each active particle is nudged by a per-axis sine drift keyed on its own speed
    /// and index. Any particle outside the recycle bound (or with a non-finite
    /// position) is resampled before the tick returns.
    pub fn tick(&mut self, elapsed: f32, dt: f32) {
        let elapsed = if elapsed.is_finite() { elapsed } else { 0.0 };
        // Drift is tuned per 60 Hz frame.
        let step = sanitize_delta(dt) * 60.0;
        let bound = self.config.recycle_bound();

        for i in 0..self.active {
            let phase = i as f32;
            let t = elapsed * self.speeds[i];
            let drift = Vec3::new(
                (t + phase).sin(),
                (t * 0.8 + phase * 1.3).cos(),
                (t * 1.1 + phase * 0.7).sin(),
            );
            let p = self.positions[i] + drift * (DRIFT_AMPLITUDE * step);
            if !p.is_finite() || p.length() > bound {
                self.spawn(i);
                self.recycled += 1;
            } else {
                self.positions[i] = p;
            }
        }

        self.yaw = (self.yaw + FIELD_YAW_PER_TICK).rem_euclid(TAU);
    }

    /// Swap spawn parameters. Existing positions are kept; out-of-bound
    /// particles are recycled on the next tick.
    pub fn reconfigure(&mut self, config: ParticleConfig) {
        self.config = config.sanitized();
    }

    /// Change how many particles are live, clamped to capacity.
    ///
    /// Newly activated slots are sampled fresh with the current config.
    pub fn set_active_count(&mut self, count: usize) -> usize {
        if count > self.capacity() {
            log::warn!("Particle count {} exceeds capacity {}, clamping", count, self.capacity());
        }
        let count = count.min(self.capacity());
        for i in self.active..count {
            self.spawn(i);
        }
        self.active = count;
        count
    }

    /// Resample slot `i` from the spawn distribution.
    fn spawn(&mut self, i: usize) {
        let config = self.config;
        let position = sample_position(&mut self.rng, &config);
        let base_size = MIN_BASE_SIZE + self.rng.gen::<f32>() * BASE_SIZE_JITTER;

        self.positions[i] = position;
        self.colors[i] = config.gradient_color(position);
        self.sizes[i] = base_size * config.size_scale * config.size_falloff(position);
        self.opacities[i] = BASE_OPACITY + (self.rng.gen::<f32>() - 0.5) * OPACITY_JITTER;
        self.speeds[i] = 0.3 + self.rng.gen::<f32>() * 0.5;
    }

    /// Buffer length. Fixed for the lifetime of the field.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Positions of the active particles, in field-local space.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions[..self.active]
    }

    pub fn particle(&self, i: usize) -> Option<Particle> {
        (i < self.active).then(|| Particle {
            position: self.positions[i],
            color: self.colors[i],
            size: self.sizes[i],
            opacity: self.opacities[i],
            speed: self.speeds[i],
        })
    }

    pub fn particles(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.active).filter_map(move |i| self.particle(i))
    }

    /// Total number of recycle events since creation.
    pub fn recycled_count(&self) -> u64 {
        self.recycled
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Model transform carrying the slow whole-field rotation.
    pub fn transform(&self) -> Transform {
        Transform::from_position_yaw(Vec3::ZERO, self.yaw)
    }
}

/// Sample one spawn position. The result always lies within `config.outer_radius()`.
pub fn sample_position<R: Rng + ?Sized>(rng: &mut R, config: &ParticleConfig) -> Vec3 {
    let radius = INNER_RADIUS + rng.gen::<f32>() * config.spread_radius;
    let theta = rng.gen::<f32>() * TAU;

    match config.distribution {
        ParticleDistribution::Isotropic => {
            let phi = rng.gen::<f32>() * PI;
            Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            )
        }
        ParticleDistribution::Spiral => {
            let radius = radius * (1.0 - SPIRAL_RADIUS_JITTER * rng.gen::<f32>());
            let y = ((rng.gen::<f32>() - 0.5) * config.height_range).clamp(-radius, radius);
            // Keep |p| == radius so height never pushes a point outside the shell.
            let ring = (radius * radius - y * y).max(0.0).sqrt();
            Vec3::new(ring * theta.cos(), y, ring * theta.sin())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn config(spread: f32, height: f32, distribution: ParticleDistribution) -> ParticleConfig {
        ParticleConfig {
            spread_radius: spread,
            height_range: height,
            color_a: Vec3::new(0.2, 0.3, 0.9),
            color_b: Vec3::new(0.9, 0.6, 1.0),
            size_scale: 1.0,
            distribution,
        }
    }

    #[test]
    fn initial_positions_lie_inside_spawn_shell() {
        for distribution in [ParticleDistribution::Isotropic, ParticleDistribution::Spiral] {
            for n in [1, 2, 17, 100, 500, 1000] {
                let cfg = config(4.0, 2.5, distribution);
                let field = ParticleField::initialize(n, cfg, n as u64);
                assert_eq!(field.len(), n);
                for p in field.positions() {
                    assert!(p.length() < cfg.outer_radius() + EPS, "{:?} out of shell", p);
                }
            }
        }
    }

    #[test]
    fn spiral_heights_respect_height_range() {
        let cfg = config(4.0, 2.5, ParticleDistribution::Spiral);
        let field = ParticleField::initialize(500, cfg, 7);
        for p in field.positions() {
            assert!(p.y >= -1.25 - EPS && p.y < 1.25 + EPS);
        }
    }

    #[test]
    fn long_run_keeps_count_and_bound() {
        let cfg = config(4.0, 2.5, ParticleDistribution::Spiral);
        let mut field = ParticleField::initialize(200, cfg, 42);
        let dt = 1.0 / 60.0;
        for frame in 0..1000 {
            field.tick(frame as f32 * dt, dt);
            assert_eq!(field.len(), 200);
        }
        for p in field.positions() {
            assert!(p.is_finite());
            assert!(p.length() <= cfg.recycle_bound());
        }
    }

    #[test]
    fn breached_particle_is_recycled_same_tick() {
        let cfg = config(2.0, 2.0, ParticleDistribution::Isotropic);
        let mut field = ParticleField::initialize(10, cfg, 1);
        field.positions[3] = Vec3::splat(100.0);
        field.positions[4] = Vec3::new(f32::NAN, 0.0, 0.0);
        field.tick(0.0, 1.0 / 60.0);
        assert_eq!(field.recycled_count(), 2);
        assert!(field.positions[3].length() < cfg.outer_radius() + EPS);
        assert!(field.positions[4].is_finite());
        assert_eq!(field.len(), 10);
    }

    #[test]
    fn colors_stay_on_gradient_and_sizes_fall_off() {
        for distribution in [ParticleDistribution::Isotropic, ParticleDistribution::Spiral] {
            let cfg = ParticleConfig { size_scale: 2.0, ..config(4.0, 2.5, distribution) };
            let field = ParticleField::initialize(300, cfg, 9);
            for p in field.particles() {
                assert!((p.color - cfg.gradient_color(p.position)).length() < 1e-6);
                let base = p.size / (cfg.size_scale * cfg.size_falloff(p.position));
                assert!(base >= MIN_BASE_SIZE - 1e-5 && base <= MIN_BASE_SIZE + BASE_SIZE_JITTER + 1e-5);
                assert!(p.opacity > 0.0 && p.opacity <= 1.0);
            }
        }
    }

    #[test]
    fn size_falloff_is_clamped_at_both_ends() {
        let cfg = config(2.0, 2.0, ParticleDistribution::Isotropic);
        let outer = cfg.outer_radius();
        assert_eq!(cfg.size_falloff(Vec3::ZERO), 1.0);
        assert!((cfg.size_falloff(Vec3::X * outer * 0.5) - 0.75).abs() < 1e-6);
        assert!((cfg.size_falloff(Vec3::X * outer) - 0.5).abs() < 1e-6);
        // A drifted particle past the shell is no smaller than one on it.
        assert!((cfg.size_falloff(Vec3::new(0.0, 3.0 * outer, 0.0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn spiral_gradient_spans_the_height_range() {
        let cfg = config(4.0, 2.5, ParticleDistribution::Spiral);
        let bottom = Vec3::new(4.0, -1.25, 0.0);
        let top = Vec3::new(4.0, 1.25, 0.0);
        assert!((cfg.gradient_color(bottom) - cfg.color_a).length() < 1e-6);
        assert!((cfg.gradient_color(top) - cfg.color_b).length() < 1e-6);
        assert!((cfg.gradient_color(Vec3::X * 4.0) - cfg.color_a.lerp(cfg.color_b, 0.5)).length() < 1e-6);
        // Heights outside the range saturate instead of extrapolating.
        assert!((cfg.gradient_color(top * 3.0) - cfg.color_b).length() < 1e-6);

        let isotropic = config(4.0, 2.5, ParticleDistribution::Isotropic);
        let outer = isotropic.outer_radius();
        assert!((isotropic.gradient_color(Vec3::Y * -outer) - isotropic.color_a).length() < 1e-6);
        assert!((isotropic.gradient_color(Vec3::Y * outer) - isotropic.color_b).length() < 1e-6);
    }

    #[test]
    fn recycled_slot_takes_new_gradient_while_others_keep_theirs() {
        let cfg = config(2.0, 2.0, ParticleDistribution::Spiral);
        let mut field = ParticleField::initialize(20, cfg, 8);
        let before: Vec<Vec3> = field.particles().map(|p| p.color).collect();

        let warm = ParticleConfig {
            color_a: Vec3::new(1.0, 0.9, 0.5),
            color_b: Vec3::new(1.0, 0.7, 0.4),
            ..cfg
        };
        field.reconfigure(warm);
        field.positions[5] = Vec3::splat(100.0);
        field.tick(0.0, 1.0 / 60.0);

        assert_eq!(field.recycled_count(), 1);
        let recycled = field.particle(5).unwrap();
        assert!((recycled.color - warm.gradient_color(recycled.position)).length() < 1e-6);
        for (i, color) in before.iter().enumerate().filter(|(i, _)| *i != 5) {
            assert_eq!(field.particle(i).unwrap().color, *color);
        }
    }

    #[test]
    fn spiral_azimuth_does_not_depend_on_height() {
        let cfg = config(2.0, 4.0, ParticleDistribution::Spiral);
        let mut rng = StdRng::seed_from_u64(21);
        let mut replay = StdRng::seed_from_u64(21);
        for _ in 0..200 {
            let p = sample_position(&mut rng, &cfg);
            let _radius: f32 = replay.gen();
            let theta = replay.gen::<f32>() * TAU;
            let _jitter: f32 = replay.gen();
            let _height: f32 = replay.gen();
            let azimuth = p.z.atan2(p.x).rem_euclid(TAU);
            let diff = (azimuth - theta).abs();
            assert!(diff.min(TAU - diff) < 1e-3, "azimuth {} vs {} at y={}", azimuth, theta, p.y);
        }
    }

    #[test]
    fn same_seed_gives_same_field() {
        let cfg = config(3.0, 2.0, ParticleDistribution::Isotropic);
        let a = ParticleField::initialize(64, cfg, 1234);
        let b = ParticleField::initialize(64, cfg, 1234);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn reconfigure_keeps_positions() {
        let cfg = config(4.0, 2.5, ParticleDistribution::Spiral);
        let mut field = ParticleField::initialize(50, cfg, 3);
        let before = field.positions().to_vec();
        let mut night = cfg;
        night.color_a = Vec3::new(1.0, 0.0, 0.0);
        night.color_b = Vec3::new(1.0, 0.0, 0.0);
        field.reconfigure(night);
        assert_eq!(field.positions(), &before[..]);
        assert_eq!(field.config().color_a, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn shrinking_spread_recycles_on_next_tick() {
        let cfg = config(10.0, 2.0, ParticleDistribution::Isotropic);
        let mut field = ParticleField::initialize(200, cfg, 5);
        let small = config(0.5, 2.0, ParticleDistribution::Isotropic);
        field.reconfigure(small);
        field.tick(0.0, 1.0 / 60.0);
        for p in field.positions() {
            assert!(p.length() <= small.recycle_bound());
        }
        assert!(field.recycled_count() > 0);
    }

    #[test]
    fn active_count_changes_without_resizing_buffer() {
        let cfg = config(2.0, 2.0, ParticleDistribution::Spiral);
        let mut field = ParticleField::with_capacity(500, 150, cfg, 11);
        assert_eq!(field.active_count(), 150);
        assert_eq!(field.set_active_count(350), 350);
        assert_eq!(field.positions().len(), 350);
        assert_eq!(field.set_active_count(10_000), 500);
        assert_eq!(field.set_active_count(0), 0);
        assert_eq!(field.particles().count(), 0);
        assert_eq!(field.len(), 500);
    }

    #[test]
    fn degenerate_inputs_never_produce_nan() {
        let cfg = ParticleConfig {
            spread_radius: f32::NAN,
            height_range: 0.0,
            size_scale: f32::INFINITY,
            ..config(0.0, 0.0, ParticleDistribution::Spiral)
        };
        let mut field = ParticleField::initialize(32, cfg, 0);
        field.tick(f32::INFINITY, f32::NAN);
        field.tick(1e9, 1e9);
        for p in field.particles() {
            assert!(p.position.is_finite());
            assert!(p.size.is_finite());
            assert!(p.color.is_finite());
        }
    }

    #[test]
    fn field_rotates_a_fixed_step_per_tick() {
        let mut field = ParticleField::initialize(4, ParticleConfig::default(), 0);
        for _ in 0..10 {
            field.tick(0.0, 1.0 / 60.0);
        }
        assert!((field.yaw() - 10.0 * FIELD_YAW_PER_TICK).abs() < 1e-6);
        let rotated = field.transform().transform_point(Vec3::X);
        assert!((rotated.length() - 1.0).abs() < 1e-6);
    }
}
