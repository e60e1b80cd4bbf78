use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Surface and background settings.
pub struct DisplayOptions {
    /// Scene background, as a `#rrggbb` hex string (sRGB).
    pub background: String,
    /// Exposure multiplier applied before output.
    pub exposure: f32,
    /// Add a flat ground plane under the model.
    pub ground_plane: bool,
    /// Edge length of the ground plane.
    pub ground_plane_size: f32,
    /// Scale the drawable by the device pixel ratio (browser host).
    pub use_device_pixel_ratio: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            background: "#f2f2f2".into(),
            exposure: 1.0,
            ground_plane: false,
            ground_plane_size: 40.0,
            use_device_pixel_ratio: true,
        }
    }
}

impl DisplayOptions {
    /// Background color as linear RGBA, for the clear color. Falls back to
    /// mid grey when the hex string does not parse.
    #[must_use]
    pub fn background_linear(&self) -> [f64; 4] {
        let [r, g, b] = parse_hex_color(&self.background).unwrap_or([0x80; 3]);
        [
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
            1.0,
        ]
    }
}

/// Parse `#rrggbb` (leading `#` optional).
#[must_use]
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn srgb_to_linear(c: u8) -> f64 {
    let c = f64::from(c) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#f2f2f2"), Some([0xf2, 0xf2, 0xf2]));
        assert_eq!(parse_hex_color("cccccc"), Some([0xcc, 0xcc, 0xcc]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn background_is_linearized() {
        let opts = DisplayOptions {
            background: "#ffffff".into(),
            ..DisplayOptions::default()
        };
        assert_eq!(opts.background_linear(), [1.0, 1.0, 1.0, 1.0]);
        let [r, ..] = DisplayOptions::default().background_linear();
        assert!(r > 0.85 && r < 0.9);
    }
}
