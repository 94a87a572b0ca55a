// src/sink/mod.rs

//! Display sinks: where finished frames go.
//!
//! The render thread hands every frame to a [`DisplaySink`]. A sink owns its
//! transport and deals with its own failures; nothing it does can stop the
//! render loop.

pub mod console;
pub mod headless;
pub mod ht1632;

pub use console::ConsoleSink;
pub use headless::{FrameLog, HeadlessSink};
pub use ht1632::{Ht1632Sink, SpiTransport, SpidevTransport};

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::graphics::PixelBuffer;

pub trait DisplaySink: Send {
    /// Writes the first [`width`](DisplaySink::width) columns of `frame` to
    /// the display. Missing columns are shown blank.
    fn accept_snapshot(&mut self, frame: &PixelBuffer);

    /// Number of columns the display shows.
    fn width(&self) -> usize;

    /// Turns every pixel of the display off.
    fn clear(&mut self) {
        let blank = PixelBuffer::with_width(self.width());
        self.accept_snapshot(&blank);
    }
}

/// A sink shared between the render thread and its owner.
pub type SharedSink = Arc<Mutex<Box<dyn DisplaySink>>>;

pub fn shared<S: DisplaySink + 'static>(sink: S) -> SharedSink {
    Arc::new(Mutex::new(Box::new(sink)))
}

/// Which sink the binary drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Ht1632,
    #[default]
    Console,
    Headless,
}
