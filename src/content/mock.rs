// src/content/mock.rs

//! Scriptable content source for scheduler tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::ContentSource;
use crate::graphics::PixelBuffer;

/// Shared view on a [`MockSource`] that stays usable after the source has
/// been handed to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    compute_ticks: Arc<AtomicUsize>,
    render_ticks: Arc<AtomicUsize>,
    active: Arc<AtomicBool>,
}

impl MockProbe {
    pub fn compute_ticks(&self) -> usize {
        self.compute_ticks.load(Ordering::SeqCst)
    }

    pub fn render_ticks(&self) -> usize {
        self.render_ticks.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// A content source whose frame is a single marker column.
///
/// Activity is either set through the probe or scripted: every compute tick
/// consumes the next scripted value, and the last one sticks.
pub struct MockSource {
    name: String,
    priority: u8,
    preemptible: bool,
    buffer: PixelBuffer,
    script: VecDeque<bool>,
    probe: MockProbe,
}

impl MockSource {
    pub fn new(name: &str, priority: u8) -> Self {
        let mut buffer = PixelBuffer::with_width(1);
        for y in 0..PixelBuffer::ROWS {
            buffer.set_pixel(0, y, priority & (1u8 << y) != 0);
        }
        Self {
            name: name.to_string(),
            priority,
            preemptible: false,
            buffer,
            script: VecDeque::new(),
            probe: MockProbe::default(),
        }
    }

    pub fn preemptible(mut self, preemptible: bool) -> Self {
        self.preemptible = preemptible;
        self
    }

    pub fn active(self, active: bool) -> Self {
        self.probe.set_active(active);
        self
    }

    /// Activity values applied on successive compute ticks.
    pub fn with_script(mut self, script: impl IntoIterator<Item = bool>) -> Self {
        self.script = script.into_iter().collect();
        self
    }

    pub fn probe(&self) -> MockProbe {
        self.probe.clone()
    }

    /// Column 0 of every frame this source produces: the priority bits.
    pub fn marker(&self) -> u8 {
        self.priority
    }
}

impl ContentSource for MockSource {
    fn compute_tick(&mut self, _cycle: u32) {
        self.probe.compute_ticks.fetch_add(1, Ordering::SeqCst);
        if let Some(active) = self.script.pop_front() {
            self.probe.set_active(active);
        }
    }

    fn render_tick(&mut self, _cycle: u32) {
        self.probe.render_ticks.fetch_add(1, Ordering::SeqCst);
    }

    fn current_buffer(&self) -> Option<&PixelBuffer> {
        Some(&self.buffer)
    }

    fn is_active(&self) -> bool {
        self.probe.is_active()
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn is_preemptible(&self) -> bool {
        self.preemptible
    }

    fn name(&self) -> &str {
        &self.name
    }
}
