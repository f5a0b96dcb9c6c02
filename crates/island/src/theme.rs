//! Day/night parameter bundles. A pure function of the night flag.

use engine_core::rgb_u32;
use glam::Vec3;

/// Everything the scene derives from the theme flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeParameters {
    /// Live particles in the ambient field.
    pub particle_count: usize,
    /// Bottom and top of the particle color gradient.
    pub particle_colors: (Vec3, Vec3),
    /// Hemisphere / ambient light intensity.
    pub ambient_intensity: f32,
    /// Key (sun or moon) light intensity.
    pub directional_intensity: f32,
    /// Shadow map edge length in texels.
    pub shadow_resolution: u32,
    /// Wireframe color shown while the dwelling loads.
    pub placeholder_color: Vec3,
    pub stars_visible: bool,
}

impl ThemeParameters {
    pub fn for_night(is_night: bool) -> Self {
        if is_night {
            Self::night()
        } else {
            Self::day()
        }
    }

    /// Denser, cool-toned fireflies under a dim moon.
    pub fn night() -> Self {
        Self {
            particle_count: 350,
            particle_colors: (rgb_u32(0x818cf8), rgb_u32(0xf0abfc)),
            ambient_intensity: 0.2,
            directional_intensity: 0.4,
            shadow_resolution: 1024,
            placeholder_color: rgb_u32(0x334155),
            stars_visible: true,
        }
    }

    /// Sparse warm dust in full sun.
    pub fn day() -> Self {
        Self {
            particle_count: 150,
            particle_colors: (rgb_u32(0xfde68a), rgb_u32(0xfdba74)),
            ambient_intensity: 0.5,
            directional_intensity: 1.0,
            shadow_resolution: 2048,
            placeholder_color: rgb_u32(0x94a3b8),
            stars_visible: false,
        }
    }
}
