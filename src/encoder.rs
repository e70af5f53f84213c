//! Frame encoder: expands pixels into SPI bit-pattern symbols.
//!
//! Each protocol bit becomes one SPI byte. At [`SPI_SPEED_HZ`](crate::SPI_SPEED_HZ)
//! the number of set bits in the symbol decides how long the line sits high,
//! which is how a WS2812 tells a `1` from a `0`. A frame is every pixel's 24
//! symbols followed by [`RESET_BYTES`] zero bytes that hold the line low long
//! enough for the strip to latch.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;

use crate::color::{ChannelOrder, Rgb};
use crate::{BITS_PER_LED, DATA_HIGH, DATA_LOW, RESET_BYTES};

const SYMBOLS_PER_CHANNEL: usize = 8;

/// Symbols for one channel value, most significant bit first.
#[inline]
pub fn encode_byte(value: u8) -> [u8; 8] {
    let mut out = [DATA_LOW; SYMBOLS_PER_CHANNEL];
    for (i, symbol) in out.iter_mut().enumerate() {
        if value & (0x80 >> i) != 0 {
            *symbol = DATA_HIGH;
        }
    }
    out
}

/// Length of the transmit buffer for `pixel_count` LEDs.
#[inline]
pub const fn frame_len(pixel_count: usize) -> usize {
    pixel_count * BITS_PER_LED + RESET_BYTES
}

/// Encodes `pixels` into a freshly allocated transmit buffer.
///
/// Callers are expected to reject an empty slice; given one, the result is
/// just the reset gap.
pub fn encode(pixels: &[Rgb], order: ChannelOrder) -> Vec<u8> {
    let mut buffer = alloc::vec![0u8; frame_len(pixels.len())];
    write_pixels(pixels, order, &mut buffer);
    buffer
}

/// Like [`encode`], but reports allocation failure instead of aborting.
pub fn try_encode(pixels: &[Rgb], order: ChannelOrder) -> Result<Vec<u8>, TryReserveError> {
    let len = frame_len(pixels.len());
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len)?;
    buffer.resize(len, 0);
    write_pixels(pixels, order, &mut buffer);
    Ok(buffer)
}

/// Encodes `pixels` into a caller-provided buffer.
///
/// # Panics
///
/// If `buffer.len()` is not exactly [`frame_len`]`(pixels.len())`.
pub fn encode_into(pixels: &[Rgb], order: ChannelOrder, buffer: &mut [u8]) {
    assert_eq!(
        buffer.len(),
        frame_len(pixels.len()),
        "transmit buffer does not fit {} pixels",
        pixels.len()
    );
    let reset = write_pixels(pixels, order, buffer);
    reset.fill(0);
}

/// Writes the symbol region and returns the untouched reset tail.
fn write_pixels<'a>(pixels: &[Rgb], order: ChannelOrder, buffer: &'a mut [u8]) -> &'a mut [u8] {
    let (data, reset) = buffer.split_at_mut(pixels.len() * BITS_PER_LED);
    for (led, px) in data.chunks_exact_mut(BITS_PER_LED).zip(pixels) {
        for (slot, value) in led.chunks_exact_mut(SYMBOLS_PER_CHANNEL).zip(order.arrange(*px)) {
            slot.copy_from_slice(&encode_byte(value));
        }
    }
    reset
}

const NANOS_PER_SEC: u64 = 1_000_000_000;
const MICROS_PER_SEC: u64 = 1_000_000;

#[inline]
fn scaled(bits: u64, unit: u64, speed_hz: u32) -> u32 {
    (bits * unit).checked_div(speed_hz as u64).unwrap_or(0) as u32
}

/// Time the line is held high for a `1` bit. Zero if `speed_hz` is zero.
pub fn high_time_ns(speed_hz: u32) -> u32 {
    scaled(DATA_HIGH.count_ones() as u64, NANOS_PER_SEC, speed_hz)
}

/// Time the line is held high for a `0` bit.
pub fn low_time_ns(speed_hz: u32) -> u32 {
    scaled(DATA_LOW.count_ones() as u64, NANOS_PER_SEC, speed_hz)
}

/// Length of the trailing idle gap.
pub fn reset_time_us(speed_hz: u32) -> u32 {
    scaled((RESET_BYTES * 8) as u64, MICROS_PER_SEC, speed_hz)
}

/// Wire time of a whole frame, reset gap included.
pub fn frame_time_us(pixel_count: usize, speed_hz: u32) -> u32 {
    scaled((frame_len(pixel_count) * 8) as u64, MICROS_PER_SEC, speed_hz)
}
