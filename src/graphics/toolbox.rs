// src/graphics/toolbox.rs

//! Drawing helpers: text rendering and blitting of drawable objects.
//!
//! Text coordinates use the *bottom* row of the glyphs as the vertical
//! anchor, so `write_text` on an 8-row buffer fills the whole height with an
//! 8-row font.

use log::warn;

use super::{Alignment, Font, PixelBuffer};

/// Code used for characters outside of Latin-1. Fonts draw their fallback
/// glyph for it.
const UNMAPPED_CHAR: u8 = 0x7f;

/// Anything that can be copied onto a [`PixelBuffer`].
pub trait MatrixDrawable {
    fn pixel(&self, x: usize, y: usize) -> bool;

    /// `(width, height)` of the drawable.
    fn size(&self) -> (usize, usize);
}

/// Maps a character to the Latin-1 code fonts are indexed with.
fn font_code(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(UNMAPPED_CHAR)
}

/// Width in columns of `text` once drawn with `font`, spacing included.
pub fn text_width(font: &dyn Font, text: &str) -> usize {
    let mut width = 0;
    let mut glyphs = 0;
    for c in text.chars() {
        width += font.char_width(font_code(c));
        glyphs += 1;
    }
    if glyphs > 1 {
        width += font.letter_spacing() * (glyphs - 1);
    }
    width
}

fn aligned_start(buffer: &PixelBuffer, font: &dyn Font, text: &str, alignment: Alignment) -> usize {
    let text_width = text_width(font, text);
    let buffer_width = buffer.width();
    if text_width > buffer_width {
        warn!(
            "Toolbox: Text \"{}\" is {} columns wide, larger than the buffer ({}); aligning left",
            text, text_width, buffer_width
        );
        return 0;
    }
    match alignment {
        Alignment::Left => 0,
        Alignment::Right => buffer_width - text_width,
        Alignment::Center => (buffer_width - text_width) / 2,
    }
}

/// Writes `text` starting at the bottom-left corner of the buffer.
pub fn write_text(buffer: &mut PixelBuffer, font: &dyn Font, text: &str) {
    let bottom = buffer.height() - 1;
    write_text_at(buffer, font, 0, bottom, text);
}

/// Writes `text` on the bottom row, positioned according to `alignment`
/// within the current width of the buffer.
pub fn write_text_aligned(
    buffer: &mut PixelBuffer,
    font: &dyn Font,
    text: &str,
    alignment: Alignment,
) {
    let x = aligned_start(buffer, font, text, alignment);
    let bottom = buffer.height() - 1;
    write_text_at(buffer, font, x, bottom, text);
}

/// Writes `text` with its first column at `x` and the bottom row of the
/// glyphs on row `y`.
///
/// Blank columns are written between glyphs and one blank column is written
/// after the last glyph, so the buffer always ends with a gap.
pub fn write_text_at(buffer: &mut PixelBuffer, font: &dyn Font, x: usize, y: usize, text: &str) {
    let char_height = font.char_height();
    let top = y as isize - (char_height as isize - 1);
    let mut write_x = x;

    for (index, c) in text.chars().enumerate() {
        let code = font_code(c);

        if index > 0 {
            for _ in 0..font.letter_spacing() {
                for char_y in 0..char_height {
                    let row = top + char_y as isize;
                    if row >= 0 {
                        buffer.set_pixel(write_x, row as usize, false);
                    }
                }
                write_x += 1;
            }
        }

        for char_x in 0..font.char_width(code) {
            for char_y in 0..char_height {
                let row = top + char_y as isize;
                if row >= 0 {
                    buffer.set_pixel(write_x, row as usize, font.char_pixel(code, char_x, char_y));
                }
            }
            write_x += 1;
        }
    }

    buffer.set_pixel(write_x, 0, false);
}

/// Copies `drawable` onto the buffer with its top-left corner at `(x, y)`.
///
/// Negative coordinates clip the drawable; rows below the buffer are dropped.
pub fn write_drawable(buffer: &mut PixelBuffer, drawable: &dyn MatrixDrawable, x: isize, y: isize) {
    let (width, height) = drawable.size();
    let x_end = x + width as isize;
    let y_end = (y + height as isize).min(buffer.height() as isize);
    if x_end <= 0 || y_end <= 0 {
        return;
    }

    for write_x in x.max(0)..x_end {
        let drawable_x = (write_x - x) as usize;
        for write_y in y.max(0)..y_end {
            let drawable_y = (write_y - y) as usize;
            buffer.set_pixel(
                write_x as usize,
                write_y as usize,
                drawable.pixel(drawable_x, drawable_y),
            );
        }
    }
}
