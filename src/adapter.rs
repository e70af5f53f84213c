//! Strip: an embedded-graphics DrawTarget holding one frame of pixels.
//!
//! The strip is exposed as a `len x 1` display so the usual drawing
//! primitives can be used on it; `x` is the LED index.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::Rectangle,
};

use crate::color::Rgb;

/// Pixel frame for a strip of fixed length, all LEDs off initially.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strip {
    pixels: Vec<Rgb>,
}

impl Strip {
    pub fn new(len: usize) -> Self { Self { pixels: vec![Rgb::BLACK; len] } }
    pub fn len(&self) -> usize { self.pixels.len() }
    pub fn is_empty(&self) -> bool { self.pixels.is_empty() }
    pub fn pixels(&self) -> &[Rgb] { &self.pixels }
    pub fn pixels_mut(&mut self) -> &mut [Rgb] { &mut self.pixels }

    /// Sets LED `index`; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, color: Rgb) {
        if let Some(px) = self.pixels.get_mut(index) {
            *px = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }
}

impl AsRef<[Rgb]> for Strip {
    fn as_ref(&self) -> &[Rgb] { &self.pixels }
}

impl DrawTarget for Strip {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels.into_iter() {
            if coord.y != 0 {
                continue;
            }
            if let Ok(x) = usize::try_from(coord.x) {
                self.set(x, color.into());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.is_zero_sized() {
            return Ok(());
        }

        let start = area.top_left.x as usize;
        let end = start + area.size.width as usize;
        self.pixels[start..end].fill(color.into());
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.into());
        Ok(())
    }
}

impl OriginDimensions for Strip {
    fn size(&self) -> Size { Size::new(self.pixels.len() as u32, 1) }
}
