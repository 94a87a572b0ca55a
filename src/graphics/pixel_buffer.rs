// src/graphics/pixel_buffer.rs

//! A monochrome frame with a fixed number of rows and a growable width.
//!
//! Storage is a vector of columns, one `u8` per column where bit `y` is row
//! `y` (row 0 is the top of the display). The buffer exposes a *logical*
//! coordinate space that starts at `origin` within the physical storage:
//! logical column `x` lives in physical column `x + origin`.
//!
//! Shifting moves the origin instead of moving pixels. A left shift simply
//! advances the origin, leaving the dropped columns in storage but out of
//! reach. A right shift walks the origin back and only inserts a physical
//! column once the origin is already zero. Storage therefore only grows until
//! [`PixelBuffer::clear`] is called; scrolling content never copies it.

use log::{debug, error, trace};

use super::toolbox::MatrixDrawable;
use super::Direction;

/// Addressable boolean grid with 8 rows and a width that grows on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    columns: Vec<u8>,
    origin: usize,
}

impl PixelBuffer {
    /// Number of rows of every buffer.
    pub const ROWS: usize = 8;

    /// Creates an empty buffer (width 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a blank buffer with the given logical width.
    pub fn with_width(width: usize) -> Self {
        Self {
            columns: vec![0; width],
            origin: 0,
        }
    }

    /// Turns the pixel at logical `(x, y)` on or off.
    ///
    /// Rows outside of the buffer are ignored (and logged). Columns beyond the
    /// current width grow the buffer; the new columns start blank.
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        if y >= Self::ROWS {
            error!(
                "PixelBuffer: Tried to set pixel ({}, {}) outside of a {}x{} buffer",
                x,
                y,
                self.width(),
                self.height()
            );
            return;
        }

        // Logical x is relative to the origin; growth is in physical columns.
        let Some(physical_x) = self.physical(x).filter(|px| *px < usize::MAX) else {
            error!(
                "PixelBuffer: Column {} is out of range (origin {})",
                x, self.origin
            );
            return;
        };
        if physical_x >= self.columns.len() {
            self.columns.resize(physical_x + 1, 0);
        }

        let mask = 1u8 << y;
        if on {
            self.columns[physical_x] |= mask;
        } else {
            self.columns[physical_x] &= !mask;
        }
    }

    /// Returns the state of the pixel at logical `(x, y)`.
    ///
    /// Anything outside of the buffer is off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if y >= Self::ROWS {
            return false;
        }
        match self.physical(x).and_then(|px| self.columns.get(px)) {
            Some(column) => column & (1u8 << y) != 0,
            None => false,
        }
    }

    fn physical(&self, x: usize) -> Option<usize> {
        x.checked_add(self.origin)
    }

    /// Logical width: physical columns minus the origin offset.
    pub fn width(&self) -> usize {
        self.columns.len() - self.origin
    }

    /// Number of rows, always [`PixelBuffer::ROWS`].
    pub fn height(&self) -> usize {
        Self::ROWS
    }

    /// Grows the buffer so that its logical width is at least `width`.
    /// Never shrinks.
    pub fn set_width(&mut self, width: usize) {
        let Some(required) = self.physical(width) else {
            error!(
                "PixelBuffer: Width {} is out of range (origin {})",
                width, self.origin
            );
            return;
        };
        if self.columns.len() < required {
            self.columns.resize(required, 0);
        }
    }

    /// Drops every column and resets the origin. The width becomes 0.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.origin = 0;
    }

    /// Turns every pixel off, keeping the width and the origin.
    pub fn reset(&mut self) {
        self.columns.iter_mut().for_each(|column| *column = 0);
    }

    /// Number of physical columns held in storage, including the columns
    /// hidden before the origin.
    pub fn storage_width(&self) -> usize {
        self.columns.len()
    }

    /// Current origin offset of the logical viewport.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Raw column bits of logical column `x` (bit `y` is row `y`), or 0
    /// outside of the buffer.
    pub fn column(&self, x: usize) -> u8 {
        self.physical(x)
            .and_then(|px| self.columns.get(px))
            .copied()
            .unwrap_or(0)
    }

    /// Circularly rotates the content by `count` positions.
    ///
    /// `Left`/`Right` rotate the whole column sequence (modulo its length).
    /// `Up` moves the pixel of row `y` to row `(y - count) mod 8`, `Down` to
    /// `(y + count) mod 8`. A count of 0 leaves the buffer untouched.
    pub fn rotate(&mut self, direction: Direction, count: usize) {
        if count == 0 || self.columns.is_empty() {
            return;
        }
        match direction {
            // Horizontal rotation wraps over storage, hidden columns included.
            Direction::Left => {
                let count = count % self.columns.len();
                self.columns.rotate_left(count);
            }
            Direction::Right => {
                let count = count % self.columns.len();
                self.columns.rotate_right(count);
            }
            // Bit y is row y, so moving up is a right rotation of the bits.
            Direction::Up => {
                let count = (count % Self::ROWS) as u32;
                self.columns
                    .iter_mut()
                    .for_each(|column| *column = column.rotate_right(count));
            }
            Direction::Down => {
                let count = (count % Self::ROWS) as u32;
                self.columns
                    .iter_mut()
                    .for_each(|column| *column = column.rotate_left(count));
            }
        }
        trace!("PixelBuffer: Rotated {:?} by {}", direction, count);
    }

    /// Shifts the viewport by `count` columns.
    ///
    /// `Left` drops the leftmost visible columns by advancing the origin (it
    /// stops once the logical width reaches 0). `Right` pushes the content
    /// to the right, exposing blank columns on the left. Vertical directions
    /// are not supported by shifting and are ignored.
    pub fn shift(&mut self, direction: Direction, count: usize) {
        if self.columns.is_empty() {
            error!("PixelBuffer: Trying to shift a buffer of width 0");
            return;
        }
        if count == 0 {
            return;
        }

        match direction {
            Direction::Left => {
                // Never past the end: width bottoms out at 0.
                self.origin = self.origin.saturating_add(count).min(self.columns.len());
            }
            Direction::Right => {
                // Reveal hidden columns first, then insert blanks at the front.
                let from_origin = count.min(self.origin);
                self.origin -= from_origin;
                let inserted = count - from_origin;
                if inserted > 0 {
                    self.columns
                        .splice(0..0, std::iter::repeat(0).take(inserted));
                }
            }
            Direction::Up | Direction::Down => {
                error!(
                    "PixelBuffer: Shift {:?} is not supported, use rotate instead",
                    direction
                );
                return;
            }
        }

        debug!(
            "PixelBuffer: Shifted {} columns to the {:?}, width {} origin {}",
            count,
            direction,
            self.width(),
            self.origin
        );
    }
}

impl MatrixDrawable for PixelBuffer {
    fn pixel(&self, x: usize, y: usize) -> bool {
        PixelBuffer::pixel(self, x, y)
    }

    fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

/// Creates the buffers content sources render into.
pub trait BufferFactory: Send + Sync {
    fn create(&self) -> PixelBuffer;
}

/// Factory for the single-color, 8-row buffers used by HT1632 panels.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonoColorBufferFactory;

impl BufferFactory for MonoColorBufferFactory {
    fn create(&self) -> PixelBuffer {
        PixelBuffer::new()
    }
}
