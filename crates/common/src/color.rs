use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB-encoded 8-bit color, as typed into a color picker (`#rrggbb`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexColor(pub [u8; 3]);

/// Errors from parsing a `#rrggbb` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have exactly 6 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

impl HexColor {
    pub const fn from_u32(rgb: u32) -> Self {
        Self([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8])
    }

    pub fn to_u32(self) -> u32 {
        let [r, g, b] = self.0;
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }
}

impl FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if digits.chars().count() != 6 {
            return Err(ColorParseError::BadLength(s.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }
        let rgb =
            u32::from_str_radix(digits, 16).map_err(|_| ColorParseError::BadDigit(s.to_string()))?;
        Ok(Self::from_u32(rgb))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_u32())
    }
}

/// Linear-space RGB color. This is what shaders and clear values receive;
/// the sRGB surface encodes it back on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decode an sRGB hex color into linear space.
    pub fn from_hex(hex: HexColor) -> Self {
        let [r, g, b] = hex.0;
        Self {
            r: srgb_to_linear(r as f32 / 255.0),
            g: srgb_to_linear(g as f32 / 255.0),
            b: srgb_to_linear(b as f32 / 255.0),
        }
    }

    /// Encode back to the nearest sRGB hex color.
    pub fn to_hex(self) -> HexColor {
        let encode = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
        HexColor([encode(self.r), encode(self.g), encode(self.b)])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<HexColor> for Color {
    fn from(hex: HexColor) -> Self {
        Self::from_hex(hex)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_hex() {
        let c: HexColor = "#e8db33".parse().unwrap();
        assert_eq!(c, HexColor([0xe8, 0xdb, 0x33]));
        assert_eq!(c.to_string(), "#e8db33");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(matches!(
            "e8db33".parse::<HexColor>(),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            "#e8db3".parse::<HexColor>(),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            "#e8dbzz".parse::<HexColor>(),
            Err(ColorParseError::BadDigit(_))
        ));
    }

    #[test]
    fn linear_conversion_endpoints() {
        let white = Color::from_hex(HexColor::from_u32(0xffffff));
        assert!((white.r - 1.0).abs() < 1e-5 && (white.b - 1.0).abs() < 1e-5);
        assert_eq!(Color::from_hex(HexColor::from_u32(0x000000)), Color::BLACK);
        // Mid grey is darker in linear space.
        let grey = Color::from_hex(HexColor::from_u32(0x808080));
        assert!(grey.r > 0.2 && grey.r < 0.23);
    }

    #[test]
    fn hex_round_trip_is_stable() {
        for hex in ["#313125", "#3c2caa", "#ffffe5"] {
            let parsed: HexColor = hex.parse().unwrap();
            assert_eq!(Color::from_hex(parsed).to_hex(), parsed);
        }
    }
}
