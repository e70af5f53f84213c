//! WS2812 LED strip driver that uses an SPI bus as the signal generator.
//!
//! WS2812-family LEDs expect a single data line where each bit is a pulse of a
//! particular width. This crate produces that waveform from an ordinary SPI
//! peripheral: every protocol bit is expanded into one SPI byte whose run of
//! set bits, clocked at [`SPI_SPEED_HZ`], lasts as long as the LED needs to see
//! a `1` or a `0`.
//!
//! ## Features
//! - Pure, allocation-checked frame encoder ([`encoder`]).
//! - [`Ws2812`] driver over any [`Transfer`] bus, including any embedded-hal
//!   1.0 [`SpiDevice`](embedded_hal::spi::SpiDevice) via [`HalSpi`].
//! - [`Strip`], an `embedded-graphics` `DrawTarget` for composing frames.
//! - `linux` feature: [`linux::Spidev`] for `/dev/spidevB.C` character devices.
//!
//! ## Usage
//!
//! 1. Build a transport: [`HalSpi::new`] around your HAL's SPI device, or
//!    [`linux::Spidev::open`] on Linux.
//! 2. Create the driver with [`Ws2812::new`] (or `Ws2812::open` on Linux).
//! 3. Draw into a [`Strip`] or fill a `&[Rgb]` yourself.
//! 4. Call [`Ws2812::send`]; each call is one blocking transfer.
//! 5. Call [`Ws2812::close`] when done.
//!
//! ```no_run
//! # use embedded_hal::spi::{ErrorType, Operation, SpiDevice};
//! # struct MockSpi;
//! # impl ErrorType for MockSpi { type Error = core::convert::Infallible; }
//! # impl SpiDevice<u8> for MockSpi { fn transaction(&mut self, _: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> { Ok(()) } }
//! use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::{Line, PrimitiveStyle}};
//! use ws2812_spi::{Config, HalSpi, Strip, Ws2812};
//!
//! let config = Config::default();
//! let mut leds = Ws2812::new(HalSpi::new(MockSpi), config);
//!
//! let mut strip = Strip::new(config.led_count);
//! Line::new(Point::new(0, 0), Point::new(9, 0))
//!     .into_styled(PrimitiveStyle::with_stroke(Rgb888::RED, 1))
//!     .draw(&mut strip)
//!     .unwrap();
//!
//! leds.send(strip.pixels()).expect("send failed");
//! leds.close();
//! ```

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod adapter;
pub mod color;
pub mod encoder;
#[cfg(feature = "linux")]
#[cfg_attr(docsrs, doc(cfg(feature = "linux")))]
pub mod linux;
pub mod transfer;

use embedded_hal::spi::{Mode, MODE_0};

pub use adapter::Strip;
pub use color::{ChannelOrder, Rgb};
pub use transfer::{HalSpi, Transfer};

// Protocol framing
pub const LED_COUNT: usize = 60;
pub const BITS_PER_LED: usize = 24;
/// Zero bytes after the last pixel; at 6.4 MHz this is a 50 us low period.
pub const RESET_BYTES: usize = 40;

/// Symbol for a protocol `1`: five of eight SPI bits high.
pub const DATA_HIGH: u8 = 0b0001_1111;
/// Symbol for a protocol `0`: two of eight SPI bits high.
pub const DATA_LOW: u8 = 0b0000_0011;

// Bus defaults
pub const SPI_MODE: Mode = MODE_0;
pub const SPI_BITS_PER_WORD: u8 = 8;
pub const SPI_SPEED_HZ: u32 = 6_400_000;

/// Bus and strip settings for one [`Ws2812`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Clock polarity and phase.
    pub mode: Mode,
    pub bits_per_word: u8,
    /// Clock rate the symbol widths are tuned for.
    pub speed_hz: u32,
    /// Number of LEDs on the strip. The driver sends whatever length it is
    /// given; callers use this to size a [`Strip`].
    pub led_count: usize,
    pub channel_order: ChannelOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: SPI_MODE,
            bits_per_word: SPI_BITS_PER_WORD,
            speed_hz: SPI_SPEED_HZ,
            led_count: LED_COUNT,
            channel_order: ChannelOrder::Grb,
        }
    }
}

impl Config {
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_bits_per_word(mut self, bits: u8) -> Self {
        self.bits_per_word = bits;
        self
    }

    pub fn with_speed_hz(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    pub fn with_led_count(mut self, led_count: usize) -> Self {
        self.led_count = led_count;
        self
    }

    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }
}

/// WS2812 strip driver.
///
/// Owns the bus transport while open. Each [`send`](Self::send) encodes a
/// fresh frame and issues exactly one blocking transfer; nothing is retried.
/// After [`close`](Self::close) the transport is released and every send
/// fails with [`Error::Closed`].
#[derive(Debug)]
pub struct Ws2812<T> {
    transport: Option<T>,
    config: Config,
}

impl<T: Transfer> Ws2812<T> {
    /// Creates an open driver on an already configured transport.
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport: Some(transport),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Sends one frame and returns the byte count reported by the bus.
    ///
    /// A closed driver or an empty frame is rejected before anything is
    /// allocated or transferred.
    pub fn send(&mut self, pixels: &[Rgb]) -> Result<usize, Error<T::Error>> {
        let transport = self.transport.as_mut().ok_or(Error::Closed)?;
        if pixels.is_empty() {
            return Err(Error::NoPixels);
        }

        let len = encoder::frame_len(pixels.len());
        let buffer = encoder::try_encode(pixels, self.config.channel_order)
            .map_err(|_| Error::Alloc(len))?;

        log::debug!(
            "sending {} pixels ({} bytes, ~{} us)",
            pixels.len(),
            len,
            encoder::frame_time_us(pixels.len(), self.config.speed_hz)
        );

        match transport.transfer(&buffer, self.config.speed_hz, self.config.bits_per_word) {
            Ok(sent) => Ok(sent),
            Err(e) => {
                log::warn!("transfer of {} byte frame failed", len);
                Err(Error::Transfer(e))
            }
        }
    }

    /// Sends packed `[r, g, b, r, g, b, ...]` bytes.
    pub fn send_rgb_bytes(&mut self, rgb: &[u8]) -> Result<usize, Error<T::Error>> {
        if !self.is_open() {
            return Err(Error::Closed);
        }
        if rgb.is_empty() || rgb.len() % 3 != 0 {
            return Err(Error::InvalidLength(rgb.len()));
        }

        let mut pixels = alloc::vec::Vec::new();
        pixels
            .try_reserve_exact(rgb.len() / 3)
            .map_err(|_| Error::Alloc(rgb.len()))?;
        pixels.extend(rgb.chunks_exact(3).map(|c| Rgb::new(c[0], c[1], c[2])));
        self.send(&pixels)
    }

    /// Releases the transport. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.transport = None;
    }

    /// Returns the transport, or `None` if already closed.
    pub fn into_inner(self) -> Option<T> {
        self.transport
    }
}

/// Error type for the driver.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// The driver was closed.
    #[error("driver is closed")]
    Closed,
    /// A frame must contain at least one pixel.
    #[error("no pixels to send")]
    NoPixels,
    /// Packed RGB data was empty or not a whole number of pixels.
    #[error("rgb data length {0} is not a positive multiple of 3")]
    InvalidLength(usize),
    /// A frame buffer of the given size in bytes could not be allocated.
    #[error("failed to allocate {0} byte frame buffer")]
    Alloc(usize),
    /// The bus reported a failure.
    #[error("transfer failed")]
    Transfer(#[source] E),
}

/// Prelude module for easy importing of common traits and types.
pub mod prelude {
    pub use embedded_graphics::prelude::*;
    pub use embedded_hal::spi::SpiDevice;
    pub use super::{
        ChannelOrder, Config, Error, HalSpi, Rgb, Strip, Transfer, Ws2812, LED_COUNT,
    };
}
