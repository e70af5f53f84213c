//! Linux spidev transport.
//!
//! Talks to `/dev/spidevB.C` through the kernel's spidev ioctls:
//! `include/uapi/linux/spi/spidev.h`.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::string::String;

use embedded_hal::spi::{Mode, Phase, Polarity};
use nix::errno::Errno;

use crate::{Config, Transfer, Ws2812};

mod ioctl {
    const SPI_IOC_MAGIC: u8 = b'k';

    const SPI_IOC_TYPE_MESSAGE: u8 = 0; // &[SpiIocTransfer]
    const SPI_IOC_TYPE_MODE: u8 = 1; // u8
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3; // u8
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4; // u32

    pub const SPI_CPHA: u8 = 0x01;
    pub const SPI_CPOL: u8 = 0x02;

    /// `struct spi_ioc_transfer`
    #[derive(Debug, Default)]
    #[repr(C)]
    pub struct SpiIocTransfer {
        pub tx_buf: u64,
        pub rx_buf: u64,

        pub len: u32,
        pub speed_hz: u32,

        pub delay_usecs: u16,
        pub bits_per_word: u8,
        pub cs_change: u8,
        pub tx_nbits: u8,
        pub rx_nbits: u8,
        pub word_delay_usecs: u8,
        pub pad: u8,
    }

    nix::ioctl_write_ptr!(spi_write_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    nix::ioctl_write_ptr!(spi_write_bits_per_word, SPI_IOC_MAGIC, SPI_IOC_TYPE_BITS_PER_WORD, u8);
    nix::ioctl_write_ptr!(spi_write_max_speed_hz, SPI_IOC_MAGIC, SPI_IOC_TYPE_MAX_SPEED_HZ, u32);

    // SPI_IOC_MESSAGE(n)
    nix::ioctl_write_buf!(spi_message, SPI_IOC_MAGIC, SPI_IOC_TYPE_MESSAGE, SpiIocTransfer);
}

/// Errors from the spidev transport.
#[derive(Debug, thiserror::Error)]
pub enum SpidevError {
    #[error("failed to open SPI device {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to set {setting} on {path}: {source}")]
    Configure {
        setting: &'static str,
        path: String,
        source: Errno,
    },
    #[error("SPI transfer failed: {0}")]
    Transfer(#[source] Errno),
    #[error("{0} byte transfer does not fit in one SPI message")]
    TooLong(usize),
}

/// An open and configured spidev character device.
///
/// The kernel rejects messages longer than the `spidev.bufsiz` module
/// parameter (4096 bytes by default, about 169 LEDs per frame). Longer strips
/// need it raised, e.g. `spidev.bufsiz=65536` on the kernel command line.
///
/// The file descriptor is closed on drop.
#[derive(Debug)]
pub struct Spidev {
    file: File,
    path: String,
}

impl Spidev {
    /// Opens `path` read/write and applies the mode, word size and clock
    /// speed from `config`.
    ///
    /// Unlike a bare `ioctl` sequence, a rejected setting is an error: a bus
    /// left at the wrong speed produces garbage timing with no other symptom.
    pub fn open(path: &str, config: &Config) -> Result<Self, SpidevError> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| SpidevError::Open {
                path: path.into(),
                source,
            })?;

        let fd = file.as_raw_fd();
        let configure = |setting: &'static str, r: nix::Result<i32>| {
            r.map(|_| ()).map_err(|source| SpidevError::Configure {
                setting,
                path: path.into(),
                source,
            })
        };

        let mode = mode_bits(config.mode);
        configure("mode", unsafe { ioctl::spi_write_mode(fd, &mode) })?;
        configure("bits per word", unsafe {
            ioctl::spi_write_bits_per_word(fd, &config.bits_per_word)
        })?;
        configure("max speed", unsafe {
            ioctl::spi_write_max_speed_hz(fd, &config.speed_hz)
        })?;

        log::info!(
            "SPI device '{}' ready (mode {}, {} bits, {} Hz)",
            path,
            mode,
            config.bits_per_word,
            config.speed_hz
        );

        Ok(Self {
            file,
            path: path.into(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transfer for Spidev {
    type Error = SpidevError;

    fn transfer(
        &mut self,
        tx: &[u8],
        speed_hz: u32,
        bits_per_word: u8,
    ) -> Result<usize, SpidevError> {
        let len = message_len(tx.len())?;
        let message = [ioctl::SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            len,
            speed_hz,
            bits_per_word,
            ..Default::default()
        }];

        // tx outlives the call; the kernel only reads from tx_buf.
        let sent = unsafe { ioctl::spi_message(self.file.as_raw_fd(), &message) }
            .map_err(SpidevError::Transfer)?;
        Ok(sent as usize)
    }
}

impl Drop for Spidev {
    fn drop(&mut self) {
        log::info!("SPI device '{}' closed", self.path);
    }
}

impl Ws2812<Spidev> {
    /// Opens the spidev device at `path` and wraps it in a driver.
    pub fn open(path: &str, config: Config) -> Result<Self, SpidevError> {
        let dev = Spidev::open(path, &config)?;
        Ok(Ws2812::new(dev, config))
    }
}

/// `spi_ioc_transfer.len` for a buffer of `len` bytes.
fn message_len(len: usize) -> Result<u32, SpidevError> {
    u32::try_from(len).map_err(|_| SpidevError::TooLong(len))
}

/// spidev mode byte for an embedded-hal [`Mode`].
fn mode_bits(mode: Mode) -> u8 {
    let mut bits = 0;
    if mode.polarity == Polarity::IdleHigh {
        bits |= ioctl::SPI_CPOL;
    }
    if mode.phase == Phase::CaptureOnSecondTransition {
        bits |= ioctl::SPI_CPHA;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{MODE_0, MODE_1, MODE_2, MODE_3};
    use std::string::ToString;

    #[test]
    fn mode_bits_match_spidev() {
        assert_eq!(mode_bits(MODE_0), 0);
        assert_eq!(mode_bits(MODE_1), 1);
        assert_eq!(mode_bits(MODE_2), 2);
        assert_eq!(mode_bits(MODE_3), 3);
    }

    #[test]
    fn message_len_fits_u32() {
        assert_eq!(message_len(crate::encoder::frame_len(60)).unwrap(), 1480);
        assert_eq!(message_len(u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn message_len_too_long() {
        let len = u32::MAX as usize + 1;
        let err = message_len(len).unwrap_err();
        assert!(matches!(err, SpidevError::TooLong(n) if n == len));
        assert_eq!(
            err.to_string(),
            "4294967296 byte transfer does not fit in one SPI message"
        );
    }

    #[test]
    fn transfer_struct_layout() {
        assert_eq!(core::mem::size_of::<ioctl::SpiIocTransfer>(), 32);
    }

    #[test]
    fn open_missing_device() {
        let err = Ws2812::open("/dev/does-not-exist-spidev9.9", Config::default()).unwrap_err();
        match err {
            SpidevError::Open { path, source } => {
                assert_eq!(path, "/dev/does-not-exist-spidev9.9");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn regular_file_rejects_configuration() {
        let path = std::env::temp_dir().join("ws2812-spi-not-a-device");
        std::fs::write(&path, b"").unwrap();
        let err = Spidev::open(path.to_str().unwrap(), &Config::default()).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, SpidevError::Configure { setting: "mode", .. }));
    }
}
