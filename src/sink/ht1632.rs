// src/sink/ht1632.rs

//! Sink for chained 32x8 LED panels built around the HT1632 controller.
//!
//! Each panel sits on its own SPI chip select. The controller takes 16-bit
//! command words and a 34-byte write that streams the whole 256-pixel RAM
//! starting at address 0.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, error, info, trace};

use super::DisplaySink;
use crate::graphics::PixelBuffer;

/// Columns driven by one panel.
pub const PANEL_WIDTH: usize = 32;

/// Size of a full RAM write.
pub const FRAME_BYTES: usize = 34;

const COMMAND_HEADER: u16 = 0b100;
/// Write-mode id (101) followed by the first five bits of address 0.
const WRITE_HEADER: u8 = 0xa0;

const SYS_DIS: u8 = 0x00;
const SYS_EN: u8 = 0x01;
const LED_ON: u8 = 0x03;
const BLINK_OFF: u8 = 0x08;
const BLINK_ON: u8 = 0x09;
const RC_MASTER_MODE: u8 = 0x18;
const COM_NMOS_8: u8 = 0x20;
const PWM_DUTY: u8 = 0xa0;
const MAX_BRIGHTNESS: u8 = 15;

const INIT_SEQUENCE: [u8; 6] = [SYS_DIS, COM_NMOS_8, RC_MASTER_MODE, SYS_EN, LED_ON, BLINK_OFF];

/// Byte transport to one panel.
pub trait SpiTransport: Send {
    fn write(&mut self, data: &[u8]) -> io::Result<()>;
}

nix::ioctl_write_ptr!(spi_write_max_speed_hz, b'k', 4, u32);

/// A Linux `spidev` character device.
pub struct SpidevTransport {
    file: File,
}

impl SpidevTransport {
    pub fn open(path: impl AsRef<Path>, speed_hz: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open SPI device {}", path.display()))?;
        // SAFETY: the fd is open for the duration of the call and the ioctl
        // only reads the u32 we pass.
        unsafe { spi_write_max_speed_hz(file.as_raw_fd(), &speed_hz) }
            .with_context(|| format!("Failed to set SPI speed on {}", path.display()))?;
        info!(
            "SpidevTransport: Opened {} at {} Hz",
            path.display(),
            speed_hz
        );
        Ok(Self { file })
    }
}

impl SpiTransport for SpidevTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)
    }
}

/// 16-bit command word for `command`, most significant byte first.
pub fn command_word(command: u8) -> [u8; 2] {
    (((COMMAND_HEADER << 8) | u16::from(command)) << 5).to_be_bytes()
}

/// Encodes the 32 columns of `frame` starting at `first_x` as a RAM write.
///
/// Pixels are streamed column by column, top row first, starting at bit 5 of
/// byte 1. The 6 bits left over in the last byte repeat rows 0 to 5 of the
/// first column.
pub fn encode_frame(frame: &PixelBuffer, first_x: usize) -> [u8; FRAME_BYTES] {
    let mut data = [0u8; FRAME_BYTES];
    data[0] = WRITE_HEADER;

    let mut index = 1;
    let mut bit = 5u8;
    for x in first_x..first_x + PANEL_WIDTH {
        for y in 0..PixelBuffer::ROWS {
            if frame.pixel(x, y) {
                data[index] |= 1 << bit;
            }
            if bit == 0 {
                bit = 7;
                index += 1;
            } else {
                bit -= 1;
            }
        }
    }

    for y in 0..6 {
        if frame.pixel(first_x, y) {
            data[FRAME_BYTES - 1] |= 1 << (5 - y);
        }
    }
    data
}

/// Blank RAM write.
pub fn clear_frame() -> [u8; FRAME_BYTES] {
    let mut data = [0u8; FRAME_BYTES];
    data[0] = WRITE_HEADER;
    data
}

/// Drives one transport per panel; panel `i` shows columns
/// `32 * i .. 32 * (i + 1)`.
pub struct Ht1632Sink<T: SpiTransport = SpidevTransport> {
    panels: Vec<T>,
}

impl Ht1632Sink<SpidevTransport> {
    /// Opens the first `panels` devices of `devices`.
    pub fn open(devices: &[String], panels: usize, speed_hz: u32) -> Result<Self> {
        if panels == 0 || panels > devices.len() {
            bail!(
                "Cannot drive {} panels with {} SPI devices configured",
                panels,
                devices.len()
            );
        }
        let transports = devices[..panels]
            .iter()
            .map(|device| SpidevTransport::open(device, speed_hz))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(transports))
    }
}

impl<T: SpiTransport> Ht1632Sink<T> {
    /// Initialises every panel and blanks it.
    pub fn new(panels: Vec<T>) -> Self {
        let mut sink = Self { panels };
        for panel in 0..sink.panels.len() {
            for command in INIT_SEQUENCE {
                sink.send_command(panel, command);
            }
        }
        DisplaySink::clear(&mut sink);
        info!("Ht1632Sink: Initialised {} panels", sink.panels.len());
        sink
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Sets the PWM duty of every panel. Levels above 15 are clamped.
    pub fn set_brightness(&mut self, level: u8) {
        let level = level.min(MAX_BRIGHTNESS);
        debug!("Ht1632Sink: Brightness {}", level);
        for panel in 0..self.panels.len() {
            self.send_command(panel, PWM_DUTY | level);
        }
    }

    pub fn set_blink(&mut self, on: bool) {
        debug!("Ht1632Sink: Blink {}", on);
        let command = if on { BLINK_ON } else { BLINK_OFF };
        for panel in 0..self.panels.len() {
            self.send_command(panel, command);
        }
    }

    fn send_command(&mut self, panel: usize, command: u8) {
        self.send(panel, &command_word(command));
    }

    fn send(&mut self, panel: usize, data: &[u8]) {
        if let Some(transport) = self.panels.get_mut(panel) {
            if let Err(e) = transport.write(data) {
                error!("Ht1632Sink: Write to panel {} failed: {}", panel, e);
            }
        }
    }
}

impl<T: SpiTransport> DisplaySink for Ht1632Sink<T> {
    fn accept_snapshot(&mut self, frame: &PixelBuffer) {
        trace!("Ht1632Sink: Frame of {} columns", frame.width());
        for panel in 0..self.panels.len() {
            let data = encode_frame(frame, panel * PANEL_WIDTH);
            self.send(panel, &data);
        }
    }

    fn width(&self) -> usize {
        self.panels.len() * PANEL_WIDTH
    }

    fn clear(&mut self) {
        let data = clear_frame();
        for panel in 0..self.panels.len() {
            self.send(panel, &data);
        }
    }
}

impl<T: SpiTransport> Drop for Ht1632Sink<T> {
    fn drop(&mut self) {
        debug!("Ht1632Sink: Clearing panels on drop");
        DisplaySink::clear(self);
    }
}
