//! RGBW pixel color and the integer blending used by fades.
//!
//! Step strips are RGBW; the animation engine blends all four channels with
//! integer arithmetic so that a fade lands exactly on its endpoints. Helpers
//! convert from `palette` colors (including HSV) with white extraction.

use palette::{FromColor, Hsv, Srgb};

/// A four-channel pixel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgbw {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
}

impl Rgbw {
    /// All channels off.
    pub const OFF: Rgbw = Rgbw::new(0, 0, 0, 0);

    /// Creates a color from its four channels.
    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white,
        }
    }

    /// Only the dedicated white channel, at `level`.
    #[inline]
    pub const fn white(level: u8) -> Self {
        Self::new(0, 0, 0, level)
    }

    /// Blends from `self` toward `to` after `elapsed` of `total` time units.
    ///
    /// Returns `self` exactly when `elapsed == 0` and `to` exactly once
    /// `elapsed >= total`. A zero `total` yields `to`.
    pub fn lerp(self, to: Rgbw, elapsed: u64, total: u64) -> Rgbw {
        if total == 0 || elapsed >= total {
            return to;
        }

        Rgbw {
            red: lerp_channel(self.red, to.red, elapsed, total),
            green: lerp_channel(self.green, to.green, elapsed, total),
            blue: lerp_channel(self.blue, to.blue, elapsed, total),
            white: lerp_channel(self.white, to.white, elapsed, total),
        }
    }

    /// Scales every channel by `brightness / 255`, rounding to nearest.
    ///
    /// `scale(255)` is the identity and `scale(0)` is [`Rgbw::OFF`].
    pub fn scale(self, brightness: u8) -> Rgbw {
        Rgbw {
            red: scale_channel(self.red, brightness),
            green: scale_channel(self.green, brightness),
            blue: scale_channel(self.blue, brightness),
            white: scale_channel(self.white, brightness),
        }
    }

    /// The brightest of the four channels.
    #[inline]
    pub fn level(self) -> u8 {
        self.red.max(self.green).max(self.blue).max(self.white)
    }

    /// Returns true if every channel is zero.
    #[inline]
    pub fn is_off(self) -> bool {
        self == Rgbw::OFF
    }
}

impl From<Srgb<u8>> for Rgbw {
    /// Moves the gray component shared by red, green and blue onto the white
    /// channel.
    fn from(color: Srgb<u8>) -> Self {
        let white = color.red.min(color.green).min(color.blue);
        Rgbw::new(
            color.red - white,
            color.green - white,
            color.blue - white,
            white,
        )
    }
}

impl From<Srgb> for Rgbw {
    fn from(color: Srgb) -> Self {
        Rgbw::from(color.into_format::<u8>())
    }
}

/// Creates an RGBW color from HSV (Hue, Saturation, Value) components.
#[inline]
pub fn hsv(hue: f32, saturation: f32, value: f32) -> Rgbw {
    let hsv = Hsv::new(hue, saturation, value);
    Rgbw::from(Srgb::from_color(hsv))
}

/// Creates an RGBW color from hue only (full saturation and value).
#[inline]
pub fn hue(hue: f32) -> Rgbw {
    hsv(hue, 1.0, 1.0)
}

fn lerp_channel(from: u8, to: u8, elapsed: u64, total: u64) -> u8 {
    let from = i64::from(from);
    let delta = i64::from(to) - from;
    // elapsed < total here, so the blended value stays between the endpoints.
    let step = delta * elapsed as i64 / total as i64;
    (from + step) as u8
}

fn scale_channel(value: u8, brightness: u8) -> u8 {
    ((u16::from(value) * u16::from(brightness) + 127) / 255) as u8
}
