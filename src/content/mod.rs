// src/content/mod.rs

//! Content sources: the units of displayable content the scheduler arbitrates
//! between.
//!
//! Each source owns a [`PixelBuffer`] that it redraws from its hooks. The
//! compute hook runs on the slow cycle and is where a source updates its
//! state; the render hook runs on the fast cycle, but only for the source
//! that currently owns the display.

pub mod clock;
pub mod message;
pub mod mock;

pub use clock::ClockSource;
pub use message::{MessageQueue, MessageSource};

use std::sync::{Arc, Mutex};

use crate::graphics::PixelBuffer;

/// A content provider the scheduler can put on the display.
pub trait ContentSource: Send {
    /// Slow-cycle hook, called for every registered source.
    fn compute_tick(&mut self, cycle: u32);

    /// Fast-cycle hook, called only while this source is selected.
    fn render_tick(&mut self, cycle: u32);

    /// The frame this source wants displayed, if it has one.
    fn current_buffer(&self) -> Option<&PixelBuffer>;

    /// Whether the source has something to show. Re-evaluated every compute
    /// cycle.
    fn is_active(&self) -> bool;

    /// Higher wins.
    fn priority(&self) -> u8;

    /// Whether a higher-priority source may take the display while this one
    /// is still active.
    fn is_preemptible(&self) -> bool;

    fn name(&self) -> &str;
}

/// A content source shared between the scheduler threads. Each hook runs
/// under the source's own lock.
pub type SharedSource = Arc<Mutex<Box<dyn ContentSource>>>;

/// Wraps a source for registration with the scheduler.
pub fn shared<S: ContentSource + 'static>(source: S) -> SharedSource {
    Arc::new(Mutex::new(Box::new(source)))
}
