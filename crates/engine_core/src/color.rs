//! Linear RGB helpers. Colors are plain `Vec3` in `[0, 1]`.

use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color {0:?} must look like #rrggbb")]
    Format(String),
    #[error("color {0:?} contains a non-hex digit")]
    Digit(String),
}

/// Parse `#rrggbb` (leading `#` optional) into a color.
pub fn parse_hex_color(s: &str) -> Result<Vec3, ColorParseError> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(ColorParseError::Format(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| ColorParseError::Digit(s.to_string()))
    };
    Ok(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// `0xRRGGBB` to color.
pub fn rgb_u32(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Linear interpolation between two colors; `t` is clamped to `[0, 1]` and NaN maps to 0.
pub fn lerp_color(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    a.lerp(b, t)
}
