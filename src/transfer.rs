//! Synchronous transfer capability used by the driver.

use embedded_hal::spi::SpiDevice;

/// A bus that can clock out one buffer in a single blocking transfer.
pub trait Transfer {
    type Error;

    /// Sends `tx` at `speed_hz` with `bits_per_word`-bit words and returns the
    /// number of bytes the bus reports as transferred.
    fn transfer(
        &mut self,
        tx: &[u8],
        speed_hz: u32,
        bits_per_word: u8,
    ) -> Result<usize, Self::Error>;
}

impl<T: Transfer + ?Sized> Transfer for &mut T {
    type Error = T::Error;

    fn transfer(
        &mut self,
        tx: &[u8],
        speed_hz: u32,
        bits_per_word: u8,
    ) -> Result<usize, Self::Error> {
        (**self).transfer(tx, speed_hz, bits_per_word)
    }
}

/// Adapts an embedded-hal [`SpiDevice`] to [`Transfer`].
///
/// Clock speed and word size are fixed when the HAL device is built, so the
/// per-transfer values are ignored.
pub struct HalSpi<SPI> {
    spi: SPI,
}

impl<SPI> HalSpi<SPI> {
    pub fn new(spi: SPI) -> Self { Self { spi } }
    pub fn into_inner(self) -> SPI { self.spi }
    pub fn inner(&self) -> &SPI { &self.spi }
    pub fn inner_mut(&mut self) -> &mut SPI { &mut self.spi }
}

impl<SPI: SpiDevice<u8>> Transfer for HalSpi<SPI> {
    type Error = SPI::Error;

    fn transfer(
        &mut self,
        tx: &[u8],
        _speed_hz: u32,
        _bits_per_word: u8,
    ) -> Result<usize, Self::Error> {
        self.spi.write(tx)?;
        Ok(tx.len())
    }
}
