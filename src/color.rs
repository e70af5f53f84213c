//! Pixel type and wire channel ordering.
//! Works in no_std.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

/// One LED's color, 8 bits per channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb888> for Rgb {
    fn from(c: Rgb888) -> Self {
        Self::new(c.r(), c.g(), c.b())
    }
}

impl From<Rgb> for Rgb888 {
    fn from(c: Rgb) -> Self {
        Rgb888::new(c.r, c.g, c.b)
    }
}

/// Order in which a pixel's channels are clocked out.
///
/// WS2812B parts latch green first, so [`ChannelOrder::Grb`] is the default.
/// The other permutations cover clones that wire the channels differently.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Rbg,
    #[default]
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ChannelOrder {
    /// Channel values of `px` in transmission order.
    #[inline]
    pub fn arrange(self, px: Rgb) -> [u8; 3] {
        let Rgb { r, g, b } = px;
        match self {
            ChannelOrder::Rgb => [r, g, b],
            ChannelOrder::Rbg => [r, b, g],
            ChannelOrder::Grb => [g, r, b],
            ChannelOrder::Gbr => [g, b, r],
            ChannelOrder::Brg => [b, r, g],
            ChannelOrder::Bgr => [b, g, r],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grb_is_default() {
        let px = Rgb::new(0x10, 0x20, 0x30);
        assert_eq!(ChannelOrder::default(), ChannelOrder::Grb);
        assert_eq!(ChannelOrder::default().arrange(px), [0x20, 0x10, 0x30]);
    }

    #[test]
    fn permutations() {
        let px = Rgb::new(1, 2, 3);
        assert_eq!(ChannelOrder::Rgb.arrange(px), [1, 2, 3]);
        assert_eq!(ChannelOrder::Rbg.arrange(px), [1, 3, 2]);
        assert_eq!(ChannelOrder::Gbr.arrange(px), [2, 3, 1]);
        assert_eq!(ChannelOrder::Brg.arrange(px), [3, 1, 2]);
        assert_eq!(ChannelOrder::Bgr.arrange(px), [3, 2, 1]);
    }

    #[test]
    fn rgb888_conversions() {
        let px: Rgb = Rgb888::new(0xAB, 0xCD, 0xEF).into();
        assert_eq!(px, Rgb::new(0xAB, 0xCD, 0xEF));
        assert_eq!(Rgb888::from(px), Rgb888::new(0xAB, 0xCD, 0xEF));
        assert_eq!(Rgb::from([7, 8, 9]), Rgb::new(7, 8, 9));
    }
}
