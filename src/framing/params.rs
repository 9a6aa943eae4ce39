//! Parameter types for framing operations.
//!
//! These types describe *what* frame to draw, not *how*. They are shared by
//! the pure [`calculations`](super::calculations), the
//! [`operations`](super::operations) that sequence them, and the
//! [`backend`](super::backend) that does the pixel work.
//!
//! ## Types
//!
//! - [`BorderSizeMode`]: whether the border value is pixels or a percentage of the longest side.
//! - [`BorderColorMode`]: solid color fill or blurred-photo fill behind the photo.
//! - [`Color`]: straight (non-premultiplied) RGBA, written as `#rrggbb` / `#rrggbbaa`.
//! - [`FrameConfig`]: the full border description shared by every image of a batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the border value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderSizeMode {
    /// The value is a thickness in pixels.
    Fixed,
    /// The value is a percentage of the source's longest side.
    #[default]
    Proportional,
}

impl BorderSizeMode {
    pub fn title(self) -> &'static str {
        match self {
            BorderSizeMode::Fixed => "Fixed",
            BorderSizeMode::Proportional => "Proportional",
        }
    }
}

/// What fills the border area behind the photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderColorMode {
    /// Flood fill with [`FrameConfig::color`].
    #[default]
    #[serde(rename = "color")]
    SolidColor,
    /// A blurred, enlarged copy of the photo itself.
    #[serde(rename = "blur")]
    BlurredPhoto,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color {0:?}: expected #rgb, #rrggbb or #rrggbbaa")]
pub struct ColorParseError(pub String);

/// Straight RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);

    pub fn rgba(self) -> image::Rgba<u8> {
        image::Rgba(self.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize, len: usize| -> Result<u8, ColorParseError> {
            let v = u8::from_str_radix(&hex[i * len..(i + 1) * len], 16).map_err(|_| err())?;
            // #rgb shorthand: 0xf -> 0xff
            Ok(if len == 1 { v * 17 } else { v })
        };
        match hex.len() {
            3 => Ok(Color([channel(0, 1)?, channel(1, 1)?, channel(2, 1)?, 255])),
            6 => Ok(Color([channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, 255])),
            8 => Ok(Color([
                channel(0, 2)?,
                channel(1, 2)?,
                channel(2, 2)?,
                channel(3, 2)?,
            ])),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

/// Border description shared by every image of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConfig {
    /// Pixels in [`BorderSizeMode::Fixed`], percent in [`BorderSizeMode::Proportional`].
    pub border_value: f64,
    pub size_mode: BorderSizeMode,
    pub color_mode: BorderColorMode,
    /// Only used with [`BorderColorMode::SolidColor`].
    pub color: Color,
}

impl FrameConfig {
    pub fn solid(border_value: f64, size_mode: BorderSizeMode, color: Color) -> Self {
        Self {
            border_value,
            size_mode,
            color_mode: BorderColorMode::SolidColor,
            color,
        }
    }

    pub fn blurred(border_value: f64, size_mode: BorderSizeMode) -> Self {
        Self {
            border_value,
            size_mode,
            color_mode: BorderColorMode::BlurredPhoto,
            color: Color::WHITE,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::solid(5.0, BorderSizeMode::Proportional, Color::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_long_hex() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color([255, 128, 0, 255]));
    }

    #[test]
    fn color_parses_short_hex() {
        assert_eq!("#0f8".parse::<Color>().unwrap(), Color([0, 255, 136, 255]));
    }

    #[test]
    fn color_parses_alpha() {
        assert_eq!("#00000080".parse::<Color>().unwrap(), Color([0, 0, 0, 128]));
    }

    #[test]
    fn color_rejects_garbage() {
        assert!("ffffff".parse::<Color>().is_err());
        assert!("#ggg".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#ééé".parse::<Color>().is_err());
    }

    #[test]
    fn color_display_omits_opaque_alpha() {
        assert_eq!(Color::WHITE.to_string(), "#ffffff");
        assert_eq!(Color([1, 2, 3, 4]).to_string(), "#01020304");
    }

    #[test]
    fn modes_use_snake_case_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            size: BorderSizeMode,
            color: BorderColorMode,
        }
        let w: Wrapper = toml::from_str("size = \"fixed\"\ncolor = \"blur\"").unwrap();
        assert_eq!(w.size, BorderSizeMode::Fixed);
        assert_eq!(w.color, BorderColorMode::BlurredPhoto);
    }

    #[test]
    fn default_config_is_white_proportional() {
        let config = FrameConfig::default();
        assert_eq!(config.border_value, 5.0);
        assert_eq!(config.size_mode, BorderSizeMode::Proportional);
        assert_eq!(config.color_mode, BorderColorMode::SolidColor);
        assert_eq!(config.color, Color::WHITE);
    }
}
