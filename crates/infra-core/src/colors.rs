//! ARGB color helpers: hex strings, HTML `#RRGGBB`, alpha merging.

use std::fmt;

use crate::error::ColorError;

/// A packed `0xAARRGGBB` color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Argb(pub u32);

impl Argb {
    /// Parse a hex color such as `FF336699` (case-insensitive, no prefix).
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        hex_digits(hex.trim())
            .map(Self)
            .ok_or_else(|| ColorError::InvalidHex(hex.to_string()))
    }

    /// Uppercase hex without leading zeros (`0` for black-transparent).
    pub fn to_hex(self) -> String {
        format!("{:X}", self.0)
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Same RGB with the alpha channel replaced.
    pub fn with_alpha(self, alpha: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | (u32::from(alpha) << 24))
    }

    /// `#RRGGBB`; the alpha channel is dropped.
    pub fn to_html(self) -> String {
        format!("#{:06X}", self.0 & 0x00FF_FFFF)
    }

    /// Parse `#RRGGBB` (the `#` is optional) as an opaque color. Blank
    /// input yields `Argb(0)`.
    pub fn from_html(html: &str) -> Result<Self, ColorError> {
        let html = html.trim();
        if html.is_empty() {
            return Ok(Self(0));
        }
        let rgb = html.strip_prefix('#').unwrap_or(html);
        if rgb.len() > 6 {
            return Err(ColorError::InvalidHex(html.to_string()));
        }
        let rgb = hex_digits(rgb).ok_or_else(|| ColorError::InvalidHex(html.to_string()))?;
        Ok(Self(rgb).with_alpha(0xFF))
    }
}

/// Hex digits only: `from_str_radix` alone would also take a leading `+`.
fn hex_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Replace the alpha of a hex color with a hex alpha value, returning hex.
pub fn merge_alpha_hex(hex_color: &str, hex_alpha: &str) -> Result<String, ColorError> {
    let alpha = hex_digits(hex_alpha.trim())
        .and_then(|value| u8::try_from(value).ok())
        .ok_or_else(|| ColorError::InvalidAlpha(hex_alpha.to_string()))?;
    Ok(Argb::from_hex(hex_color)?.with_alpha(alpha).to_hex())
}

impl From<u32> for Argb {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}
