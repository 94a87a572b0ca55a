// src/sink/console.rs

//! Text rendering of frames, for running without the panels attached.

use std::io::{self, IsTerminal, Write};

use log::{error, info};

use super::DisplaySink;
use crate::graphics::PixelBuffer;

const LIT: char = '#';
const UNLIT: char = '.';

/// Draws each frame as eight lines of `#` and `.`.
///
/// When redrawing in place, every frame after the first moves the cursor
/// back up over the previous one.
pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    writer: W,
    width: usize,
    redraw_in_place: bool,
    frames_written: u64,
}

impl ConsoleSink<io::Stdout> {
    /// Writes to stdout, redrawing in place when stdout is a terminal.
    pub fn stdout(width: usize) -> Self {
        let stdout = io::stdout();
        let redraw_in_place = stdout.is_terminal();
        info!(
            "ConsoleSink: {} columns on stdout (in place: {})",
            width, redraw_in_place
        );
        Self::new(stdout, width, redraw_in_place)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W, width: usize, redraw_in_place: bool) -> Self {
        Self {
            writer,
            width,
            redraw_in_place,
            frames_written: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn render(&self, frame: &PixelBuffer) -> String {
        let mut text = String::with_capacity((self.width + 1) * PixelBuffer::ROWS + 8);
        if self.redraw_in_place && self.frames_written > 0 {
            text.push_str(&format!("\x1b[{}A", PixelBuffer::ROWS));
        }
        for y in 0..PixelBuffer::ROWS {
            for x in 0..self.width {
                text.push(if frame.pixel(x, y) { LIT } else { UNLIT });
            }
            text.push('\n');
        }
        text
    }
}

impl<W: Write + Send> DisplaySink for ConsoleSink<W> {
    fn accept_snapshot(&mut self, frame: &PixelBuffer) {
        let text = self.render(frame);
        let written = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush());
        match written {
            Ok(()) => self.frames_written += 1,
            Err(e) => error!("ConsoleSink: Failed to write frame: {}", e),
        }
    }

    fn width(&self) -> usize {
        self.width
    }
}
