// src/graphics/mod.rs

//! Everything a content source needs to draw a frame.
//!
//! The [`PixelBuffer`] is the shared currency of the crate: content sources
//! render into one, the scheduler snapshots it, and a display sink turns it
//! into hardware writes. The remaining modules are helpers that draw into a
//! buffer (text, drawables) or move its viewport over time (animations).

pub mod animation;
pub mod font;
pub mod pixel_buffer;
pub mod toolbox;

pub use animation::{Animation, HorizontalScroll};
pub use font::{Font, Font8x5};
pub use pixel_buffer::{BufferFactory, MonoColorBufferFactory, PixelBuffer};

use serde::{Deserialize, Serialize};

/// Direction in which the content of a buffer can be moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Returns true for `Left` and `Right`.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Horizontal alignment of text within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
}
