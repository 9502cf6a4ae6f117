//! 24-bit RGB color and its text encodings.
//!
//! Three representations are supported:
//!
//! - hex text (`#ff8800`, `FF8800`)
//! - an `(r, g, b)` triple
//! - the lamp's packed wire form: four digits from a 64-symbol alphabet,
//!   most significant first. This is NOT standard base64 (no padding, no
//!   byte grouping); the digit order is what the lamp expects.

use serde::{Deserialize, Serialize};

use crate::error::{CubeError, CubeResult};

/// Digit alphabet of the packed wire encoding.
const PACKED_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Largest value representable in 24 bits.
pub const MAX_COLOR: u32 = 0xFF_FFFF;

/// The fixed palette usable by name in scripts.
pub const NAMED_COLORS: [(&str, Color); 10] = [
    ("red", Color(0xFF0000)),
    ("green", Color(0x00FF00)),
    ("blue", Color(0x0000FF)),
    ("white", Color(0xFFFFFF)),
    ("yellow", Color(0xFFFF00)),
    ("cyan", Color(0x00FFFF)),
    ("magenta", Color(0xFF00FF)),
    ("orange", Color(0xFFA500)),
    ("purple", Color(0x800080)),
    ("black", Color(0x000000)),
];

/// A 24-bit RGB color. The inner value never exceeds [`MAX_COLOR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Color(u32);

impl Color {
    /// `#000000`, the background of every frame.
    pub const BLACK: Color = Color(0x000000);
    /// `#ffffff`
    pub const WHITE: Color = Color(0xFFFFFF);
    /// `#ff0000`
    pub const RED: Color = Color(0xFF0000);

    /// Build from a raw value, rejecting anything wider than 24 bits.
    pub fn new(value: u32) -> CubeResult<Self> {
        if value > MAX_COLOR {
            return Err(CubeError::invalid_color(format!("{:#x} exceeds 24 bits", value)));
        }
        Ok(Self(value))
    }

    /// Parse hex text. Surrounding whitespace and `#` are ignored.
    pub fn from_hex(text: &str) -> CubeResult<Self> {
        let digits = text.trim_matches(|c: char| c == '#' || c.is_whitespace());
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CubeError::invalid_color(text));
        }
        // Overlong inputs overflow u32 before the 24-bit check can run.
        let value = u32::from_str_radix(digits, 16).map_err(|_| CubeError::invalid_color(text))?;
        Self::new(value).map_err(|_| CubeError::invalid_color(text))
    }

    /// Pack three channels as `r << 16 | g << 8 | b`.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }

    /// Look up one of the [`NAMED_COLORS`], ignoring case.
    pub fn named(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, color)| *color)
    }

    /// The raw 24-bit value.
    pub fn value(self) -> u32 {
        self.0
    }

    /// Lower-case, zero-padded six digit hex, without `#`.
    pub fn to_hex(self) -> String {
        format!("{:06x}", self.0)
    }

    /// Split into `(r, g, b)` channels.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    /// True for `#000000`.
    pub fn is_black(self) -> bool {
        self.0 == 0
    }

    /// Encode as four base-64 digits, most significant first.
    pub fn to_packed4(self) -> String {
        let mut out = String::with_capacity(4);
        let mut rest = self.0;
        for place in [64 * 64 * 64, 64 * 64, 64, 1] {
            out.push(char::from(PACKED_ALPHABET[(rest / place) as usize]));
            rest %= place;
        }
        out
    }

    /// Decode the output of [`Color::to_packed4`].
    pub fn from_packed4(text: &str) -> CubeResult<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 4 {
            return Err(CubeError::invalid_color(format!(
                "packed color must be 4 characters, got {:?}",
                text
            )));
        }
        let mut value = 0u32;
        for &byte in bytes {
            let digit = PACKED_ALPHABET
                .iter()
                .position(|&symbol| symbol == byte)
                .ok_or_else(|| CubeError::invalid_color(format!("bad packed digit in {:?}", text)))?;
            value = value * 64 + digit as u32;
        }
        Self::new(value)
    }

    /// Scale every channel by `factor`, truncating toward zero.
    ///
    /// Channels are treated as unsigned bytes throughout, so bright channels
    /// (>= 128) dim the same way dark ones do.
    pub fn scaled(self, factor: f64) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let (r, g, b) = self.to_rgb();
        let scale = |channel: u8| (f64::from(channel) * factor) as u8;
        Self::from_rgb(scale(r), scale(g), scale(b))
    }
}

impl TryFrom<u32> for Color {
    type Error = CubeError;

    fn try_from(value: u32) -> CubeResult<Self> {
        Self::new(value)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> u32 {
        color.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl std::str::FromStr for Color {
    type Err = CubeError;

    fn from_str(s: &str) -> CubeResult<Self> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_normalizes_case() {
        for input in ["FFA500", "#ffa500", "  #FfA500 ", "000000", "0a0B0c"] {
            let color = Color::from_hex(input).unwrap();
            assert_eq!(color.to_hex(), input.trim().trim_start_matches('#').to_lowercase());
        }
    }

    #[test]
    fn hex_rejects_garbage_and_wide_values() {
        assert!(Color::from_hex("").is_err());
        assert!(Color::from_hex("#").is_err());
        assert!(Color::from_hex("zz0000").is_err());
        assert!(Color::from_hex("-1").is_err());
        assert!(Color::from_hex("1000000").is_err());
        assert!(Color::from_hex("FFFFFFFFFFFF").is_err());
    }

    #[test]
    fn short_hex_is_accepted_as_a_number() {
        assert_eq!(Color::from_hex("ff").unwrap().value(), 0xFF);
    }

    #[test]
    fn rgb_round_trip_over_channel_extremes() {
        for r in [0u8, 1, 127, 128, 254, 255] {
            for g in [0u8, 64, 128, 255] {
                for b in [0u8, 99, 200, 255] {
                    assert_eq!(Color::from_rgb(r, g, b).to_rgb(), (r, g, b));
                }
            }
        }
    }

    #[test]
    fn packed4_known_values() {
        assert_eq!(Color::BLACK.to_packed4(), "AAAA");
        assert_eq!(Color::WHITE.to_packed4(), "////");
        assert_eq!(Color::RED.to_packed4(), "/wAA");
        assert_eq!(Color::from_rgb(0, 0, 63).to_packed4(), "AAA/");
        assert_eq!(Color::from_rgb(0, 0, 64).to_packed4(), "AABA");
    }

    #[test]
    fn packed4_inverts_across_the_range() {
        let mut value = 0u32;
        while value <= MAX_COLOR {
            let color = Color::new(value).unwrap();
            let packed = color.to_packed4();
            assert_eq!(packed.len(), 4);
            assert!(packed.bytes().all(|b| PACKED_ALPHABET.contains(&b)));
            assert_eq!(Color::from_packed4(&packed).unwrap(), color);
            value += 4099;
        }
        assert_eq!(Color::from_packed4("////").unwrap(), Color::WHITE);
    }

    #[test]
    fn packed4_rejects_bad_input() {
        assert!(Color::from_packed4("AAA").is_err());
        assert!(Color::from_packed4("AA-A").is_err());
    }

    #[test]
    fn named_lookup_ignores_case() {
        assert_eq!(Color::named("Orange").unwrap().to_hex(), "ffa500");
        assert_eq!(Color::named("PURPLE").unwrap().to_hex(), "800080");
        assert!(Color::named("teal").is_none());
    }

    #[test]
    fn scaling_treats_channels_as_unsigned() {
        let dimmed = Color::from_rgb(200, 255, 129).scaled(0.5);
        assert_eq!(dimmed.to_rgb(), (100, 127, 64));
        assert_eq!(Color::WHITE.scaled(0.0), Color::BLACK);
        assert_eq!(Color::WHITE.scaled(1.0), Color::WHITE);
    }
}
