//! Color input and bit-depth reduction for light hardware.
//!
//! Hardware takes premultiplied colors at 6, 15 or 16 bits per light. The
//! conversion below is bit-exact with what deployed devices expect, so the
//! order of floor and integer truncation must not change.

use crate::error::{Error, Result};

/// A 32-bit RGBA color that may not have been set yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    /// Set for colors that were never assigned.
    empty: bool,
}

impl Color {
    /// Uninitialized color. Quantizing it fails.
    pub const EMPTY: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
        empty: true,
    };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color {
            r,
            g,
            b,
            a,
            empty: false,
        }
    }

    /// Fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::new(r, g, b, 255)
    }

    /// Build a color from a packed `0xAARRGGBB` value.
    pub const fn from_argb(argb: u32) -> Color {
        Color::new(
            ((argb >> 16) & 0xFF) as u8,
            ((argb >> 8) & 0xFF) as u8,
            (argb & 0xFF) as u8,
            ((argb >> 24) & 0xFF) as u8,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Same color with a different alpha. Empty colors stay empty.
    pub fn with_alpha(self, a: u8) -> Color {
        Color { a, ..self }
    }

    pub fn to_rgb6(&self) -> Result<Rgb6> {
        let [r, g, b] = scale_channels(*self, Rgb6::MAX)?;
        Ok(Rgb6 { r, g, b })
    }

    pub fn to_rgb15(&self) -> Result<Rgb15> {
        let [r, g, b] = scale_channels(*self, Rgb15::MAX)?;
        Ok(Rgb15 { r, g, b })
    }

    pub fn to_rgb16(&self) -> Result<Rgb16> {
        let [r, g, b] = scale_channels(*self, Rgb16::MAX)?;
        Ok(Rgb16 { r, g, b })
    }
}

impl Default for Color {
    fn default() -> Color {
        Color::EMPTY
    }
}

/// Premultiply by alpha, then scale each channel down to its maximum.
///
/// Alpha is divided by 256, not 255: an opaque channel at 255 lands on 254
/// before scaling. Devices are calibrated against this.
fn scale_channels(color: Color, max: [u8; 3]) -> Result<[u8; 3]> {
    if color.is_empty() {
        return Err(Error::UninitializedColor);
    }
    let alpha_ratio = f64::from(color.a) / 256.0;
    let scale = |channel: u8, max: u8| -> u8 {
        let premultiplied = (f64::from(channel) * alpha_ratio).floor() as u32;
        (premultiplied * u32::from(max) / 255) as u8
    };
    Ok([
        scale(color.r, max[0]),
        scale(color.g, max[1]),
        scale(color.b, max[2]),
    ])
}

/// 2-2-2 bit color, one byte on the wire (`00RRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb6 {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb6 {
    pub const MAX: [u8; 3] = [3, 3, 3];

    pub fn r(&self) -> u8 {
        self.r
    }
    pub fn g(&self) -> u8 {
        self.g
    }
    pub fn b(&self) -> u8 {
        self.b
    }

    pub fn channels(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub fn to_byte(self) -> u8 {
        (self.r << 4) | (self.g << 2) | self.b
    }

    /// Decode a wire byte. The two top bits are ignored.
    pub(crate) fn from_byte(byte: u8) -> Rgb6 {
        Rgb6 {
            r: (byte >> 4) & 0x03,
            g: (byte >> 2) & 0x03,
            b: byte & 0x03,
        }
    }
}

/// 5-5-5 bit color, one word on the wire (`0RRRRRGGGGGBBBBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb15 {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb15 {
    pub const MAX: [u8; 3] = [31, 31, 31];

    pub fn r(&self) -> u8 {
        self.r
    }
    pub fn g(&self) -> u8 {
        self.g
    }
    pub fn b(&self) -> u8 {
        self.b
    }

    pub fn channels(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub fn to_word(self) -> u16 {
        (u16::from(self.r) << 10) | (u16::from(self.g) << 5) | u16::from(self.b)
    }

    pub(crate) fn from_word(word: u16) -> Rgb15 {
        Rgb15 {
            r: ((word >> 10) & 0x1F) as u8,
            g: ((word >> 5) & 0x1F) as u8,
            b: (word & 0x1F) as u8,
        }
    }
}

/// 5-6-5 bit color, one word on the wire (`RRRRRGGGGGGBBBBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb16 {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb16 {
    pub const MAX: [u8; 3] = [31, 63, 31];

    pub fn r(&self) -> u8 {
        self.r
    }
    pub fn g(&self) -> u8 {
        self.g
    }
    pub fn b(&self) -> u8 {
        self.b
    }

    pub fn channels(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub fn to_word(self) -> u16 {
        (u16::from(self.r) << 11) | (u16::from(self.g) << 5) | u16::from(self.b)
    }

    pub(crate) fn from_word(word: u16) -> Rgb16 {
        Rgb16 {
            r: ((word >> 11) & 0x1F) as u8,
            g: ((word >> 5) & 0x3F) as u8,
            b: (word & 0x1F) as u8,
        }
    }
}

/// Hardware color formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorDepth {
    Rgb6,
    Rgb15,
    Rgb16,
}

/// A color reduced to one of the hardware formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantizedColor {
    Rgb6(Rgb6),
    Rgb15(Rgb15),
    Rgb16(Rgb16),
}

impl QuantizedColor {
    pub fn depth(&self) -> ColorDepth {
        match self {
            QuantizedColor::Rgb6(_) => ColorDepth::Rgb6,
            QuantizedColor::Rgb15(_) => ColorDepth::Rgb15,
            QuantizedColor::Rgb16(_) => ColorDepth::Rgb16,
        }
    }

    /// Channel values as `(r, g, b)`.
    pub fn channels(&self) -> (u8, u8, u8) {
        match self {
            QuantizedColor::Rgb6(c) => c.channels(),
            QuantizedColor::Rgb15(c) => c.channels(),
            QuantizedColor::Rgb16(c) => c.channels(),
        }
    }
}

/// Reduce `color` to `depth`. Fails for uninitialized colors.
pub fn quantize(color: Color, depth: ColorDepth) -> Result<QuantizedColor> {
    Ok(match depth {
        ColorDepth::Rgb6 => QuantizedColor::Rgb6(color.to_rgb6()?),
        ColorDepth::Rgb15 => QuantizedColor::Rgb15(color.to_rgb15()?),
        ColorDepth::Rgb16 => QuantizedColor::Rgb16(color.to_rgb16()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WHITE: Color = Color::rgb(255, 255, 255);

    #[test]
    fn test_opaque_white_does_not_reach_channel_max() {
        // 255 * 255/256 floors to 254, which scales below the top value.
        assert_eq!(WHITE.to_rgb16().unwrap().channels(), (30, 62, 30));
        assert_eq!(WHITE.to_rgb15().unwrap().channels(), (30, 30, 30));
        assert_eq!(WHITE.to_rgb6().unwrap().channels(), (2, 2, 2));

        // A naive alpha / 255 would have produced the full range.
        let naive = |c: u32, max: u32| (c * 255 / 255) * max / 255;
        assert_eq!(naive(255, 31), 31);
        assert_ne!(u32::from(WHITE.to_rgb16().unwrap().r()), naive(255, 31));
    }

    #[test]
    fn test_alpha_premultiplies_channels() {
        let half = Color::new(200, 100, 50, 128);
        // 200 * 0.5 = 100 -> 100 * 31 / 255 = 12
        // 100 * 0.5 = 50  -> 50 * 63 / 255 = 12
        // 50 * 0.5 = 25   -> 25 * 31 / 255 = 3
        assert_eq!(half.to_rgb16().unwrap().channels(), (12, 12, 3));
        assert_eq!(Color::new(255, 255, 255, 0).to_rgb15().unwrap().channels(), (0, 0, 0));
    }

    #[test]
    fn test_uninitialized_color_fails() {
        assert!(matches!(Color::EMPTY.to_rgb6(), Err(Error::UninitializedColor)));
        assert!(matches!(
            quantize(Color::default(), ColorDepth::Rgb16),
            Err(Error::UninitializedColor)
        ));
        // An explicit black is not empty.
        assert!(quantize(Color::rgb(0, 0, 0), ColorDepth::Rgb16).is_ok());
    }

    #[test]
    fn test_from_argb() {
        let color = Color::from_argb(0x80FF_4020);
        assert_eq!((color.r, color.g, color.b, color.a), (0xFF, 0x40, 0x20, 0x80));
        assert!(!color.is_empty());
    }

    #[test]
    fn test_packed_forms() {
        let c = Color::rgb(255, 0, 255);
        assert_eq!(c.to_rgb16().unwrap().to_word(), (30 << 11) | 30);
        assert_eq!(c.to_rgb15().unwrap().to_word(), (30 << 10) | 30);
        assert_eq!(c.to_rgb6().unwrap().to_byte(), 0b0010_0010);
        assert_eq!(Rgb16::from_word((30 << 11) | 30).channels(), (30, 0, 30));
    }

    proptest! {
        #[test]
        fn quantized_channels_stay_in_range(r: u8, g: u8, b: u8, a: u8) {
            let color = Color::new(r, g, b, a);
            let (r16, g16, b16) = color.to_rgb16().unwrap().channels();
            prop_assert!(r16 <= 31 && g16 <= 63 && b16 <= 31);
            let (r6, g6, b6) = color.to_rgb6().unwrap().channels();
            prop_assert!(r6 <= 3 && g6 <= 3 && b6 <= 3);
            prop_assert_eq!(Rgb15::from_word(color.to_rgb15().unwrap().to_word()), color.to_rgb15().unwrap());
        }
    }
}
