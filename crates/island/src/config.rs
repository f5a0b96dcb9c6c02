//! Island configuration. Loaded from island.ron at startup.

use crate::theme::ThemeParameters;
use engine_core::parse_hex_color;
use procgen::{ParticleConfig, ParticleDistribution};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest particle count accepted from configuration.
pub const MIN_PARTICLES: usize = 100;
/// Largest particle count accepted from configuration; also the field's capacity.
pub const MAX_PARTICLES: usize = 500;

/// Persistent island settings. Loaded from `island.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandConfig {
    /// Start in the night theme.
    #[serde(default = "default_true")]
    pub night: bool,
    /// glTF/GLB model shown as the dwelling.
    #[serde(default = "default_asset_path")]
    pub asset_path: PathBuf,
    #[serde(default)]
    pub particles: ParticleSettings,
    /// Fixed RNG seed for particles and tree placement; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Length of the demo run in seconds.
    #[serde(default = "default_run_seconds")]
    pub run_seconds: f32,
    /// Flip day/night every this many seconds.
    #[serde(default)]
    pub cycle_theme_seconds: Option<f32>,
    /// Run without acquiring a GPU.
    #[serde(default)]
    pub headless: bool,
    /// Extra attempts at creating the render context before giving up.
    #[serde(default = "default_render_retries")]
    pub render_retries: u32,
}

/// Particle overrides layered on top of the theme bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    /// Replaces the theme's particle count (clamped to 100–500).
    pub count: Option<u32>,
    pub spread_radius: f32,
    pub height_range: f32,
    /// `("#rrggbb", "#rrggbb")` gradient replacing the theme colors.
    pub colors: Option<(String, String)>,
    pub size_scale: f32,
    pub distribution: ParticleDistribution,
}

fn default_true() -> bool {
    true
}
fn default_asset_path() -> PathBuf {
    PathBuf::from("assets/house.gltf")
}
fn default_run_seconds() -> f32 {
    10.0
}
fn default_render_retries() -> u32 {
    2
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            night: default_true(),
            asset_path: default_asset_path(),
            particles: ParticleSettings::default(),
            seed: None,
            run_seconds: default_run_seconds(),
            cycle_theme_seconds: None,
            headless: false,
            render_retries: default_render_retries(),
        }
    }
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            count: None,
            spread_radius: 2.0,
            height_range: 2.0,
            colors: None,
            size_scale: 1.0,
            distribution: ParticleDistribution::Spiral,
        }
    }
}

impl IslandConfig {
    /// Load config from `island.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match read_config_text(path) {
            Ok(Some(data)) => match Self::from_ron(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            },
            Ok(None) => log::info!("No config at {:?}, using defaults", path),
            Err(e) => log::warn!("Could not read config at {:?}: {}, using defaults", path, e),
        }
        Self::default()
    }

    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Demo length, with nonsense values replaced by the default.
    pub fn run_seconds(&self) -> f32 {
        if self.run_seconds.is_finite() && self.run_seconds > 0.0 {
            self.run_seconds
        } else {
            default_run_seconds()
        }
    }

    /// Theme flip period, if set to something usable.
    pub fn theme_period(&self) -> Option<f32> {
        self.cycle_theme_seconds.filter(|s| s.is_finite() && *s > 0.0)
    }
}

impl ParticleSettings {
    /// Live particle count: the override if present, otherwise the theme's.
    pub fn resolve_count(&self, theme: &ThemeParameters) -> usize {
        match self.count {
            Some(n) => {
                let clamped = (n as usize).clamp(MIN_PARTICLES, MAX_PARTICLES);
                if clamped != n as usize {
                    log::warn!("Particle count {} out of range, using {}", n, clamped);
                }
                clamped
            }
            None => theme.particle_count,
        }
    }

    /// Gradient colors: the override if both parse, otherwise the theme's.
    pub fn resolve_colors(&self, theme: &ThemeParameters) -> (glam::Vec3, glam::Vec3) {
        let Some((a, b)) = &self.colors else {
            return theme.particle_colors;
        };
        match (parse_hex_color(a), parse_hex_color(b)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Ignoring particle colors ({:?}, {:?}): {}", a, b, e);
                theme.particle_colors
            }
        }
    }

    /// Spawn config for the field under `theme`.
    pub fn to_particle_config(&self, theme: &ThemeParameters) -> ParticleConfig {
        let (color_a, color_b) = self.resolve_colors(theme);
        ParticleConfig {
            spread_radius: self.spread_radius,
            height_range: self.height_range,
            color_a,
            color_b,
            size_scale: self.size_scale,
            distribution: self.distribution,
        }
        .sanitized()
    }
}

/// Config file contents, or `None` when there is no file at `path`.
fn read_config_text(path: &Path) -> std::io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("island.ron")
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::rgb_u32;

    #[test]
    fn empty_document_gives_defaults() {
        let config = IslandConfig::from_ron("(night: true)").unwrap();
        assert_eq!(config, IslandConfig::default());
        assert!(config.night);
        assert_eq!(config.render_retries, 2);
        assert_eq!(config.particles.distribution, ParticleDistribution::Spiral);
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = IslandConfig::from_ron(
            r#"(night: false, seed: Some(7), particles: (count: Some(250), distribution: Isotropic))"#,
        )
        .unwrap();
        assert!(!config.night);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.particles.count, Some(250));
        assert_eq!(config.particles.distribution, ParticleDistribution::Isotropic);
        assert_eq!(config.particles.spread_radius, 2.0);
        assert_eq!(config.run_seconds, 10.0);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("island-config-{}.ron", std::process::id()));
        std::fs::write(&path, "(night: maybe)").unwrap();
        let config = IslandConfig::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(config, IslandConfig::default());

        let missing = IslandConfig::load_from(Path::new("/no/such/island.ron"));
        assert_eq!(missing, IslandConfig::default());
    }

    #[test]
    fn unreadable_config_is_told_apart_from_missing() {
        assert!(matches!(read_config_text(Path::new("/no/such/island.ron")), Ok(None)));

        let dir = std::env::temp_dir();
        assert!(read_config_text(&dir).is_err());
        assert_eq!(IslandConfig::load_from(&dir), IslandConfig::default());
    }

    #[test]
    fn count_override_is_clamped() {
        let night = ThemeParameters::night();
        let mut settings = ParticleSettings::default();
        assert_eq!(settings.resolve_count(&night), 350);
        settings.count = Some(20);
        assert_eq!(settings.resolve_count(&night), MIN_PARTICLES);
        settings.count = Some(9000);
        assert_eq!(settings.resolve_count(&night), MAX_PARTICLES);
        settings.count = Some(320);
        assert_eq!(settings.resolve_count(&night), 320);
    }

    #[test]
    fn bad_colors_fall_back_to_theme() {
        let day = ThemeParameters::day();
        let mut settings = ParticleSettings {
            colors: Some(("#ff0000".into(), "#00ff00".into())),
            ..Default::default()
        };
        assert_eq!(settings.resolve_colors(&day), (rgb_u32(0xff0000), rgb_u32(0x00ff00)));

        settings.colors = Some(("#ff0000".into(), "green".into()));
        assert_eq!(settings.resolve_colors(&day), day.particle_colors);
    }

    #[test]
    fn particle_config_is_sanitized() {
        let settings = ParticleSettings {
            spread_radius: f32::NAN,
            size_scale: -3.0,
            ..Default::default()
        };
        let config = settings.to_particle_config(&ThemeParameters::night());
        assert_eq!(config.spread_radius, 2.0);
        assert_eq!(config.size_scale, 0.0);
        assert_eq!(config.color_a, rgb_u32(0x818cf8));
    }

    #[test]
    fn degenerate_timings_are_ignored() {
        let config = IslandConfig {
            run_seconds: -1.0,
            cycle_theme_seconds: Some(0.0),
            ..Default::default()
        };
        assert_eq!(config.run_seconds(), 10.0);
        assert!(config.theme_period().is_none());
    }
}
