// src/content/message.rs

//! One-shot text messages scrolled across the screen.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::{debug, info};

use super::ContentSource;
use crate::graphics::{
    toolbox, Animation, BufferFactory, Direction, Font, Font8x5, HorizontalScroll, PixelBuffer,
};
use crate::sync::lock;

const NAME: &str = "message";
const DEFAULT_PRIORITY: u8 = 10;
const DEFAULT_SPEED_DIVISOR: u32 = 1;
/// Bottom row the message glyphs sit on.
const TEXT_BASELINE: usize = 7;

/// FIFO of pending messages, shared between producers and the render thread.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    inner: Arc<Mutex<VecDeque<String>>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>) {
        lock(&self.inner, "MessageQueue").push_back(message.into());
    }

    pub fn pop(&self) -> Option<String> {
        lock(&self.inner, "MessageQueue").pop_front()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner, "MessageQueue").len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner, "MessageQueue").is_empty()
    }
}

/// Scrolls queued messages from right to left, one at a time.
///
/// Not preemptible: once a message starts scrolling it runs to the end, and
/// the queue drains before anything of lower priority gets the display back.
pub struct MessageSource {
    buffer: PixelBuffer,
    font: Font8x5,
    queue: MessageQueue,
    current: Option<String>,
    animation: Option<HorizontalScroll>,
    screen_width: usize,
    priority: u8,
    speed_divisor: u32,
}

impl MessageSource {
    pub fn new(factory: &dyn BufferFactory, screen_width: usize) -> Self {
        let mut buffer = factory.create();
        buffer.set_width(screen_width);
        Self {
            buffer,
            font: Font8x5::new(),
            queue: MessageQueue::new(),
            current: None,
            animation: None,
            screen_width,
            priority: DEFAULT_PRIORITY,
            speed_divisor: DEFAULT_SPEED_DIVISOR,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Number of render cycles per one-column scroll step.
    pub fn with_speed_divisor(mut self, divisor: u32) -> Self {
        self.speed_divisor = divisor;
        self
    }

    pub fn with_letter_spacing(mut self, spacing: usize) -> Self {
        self.font.set_letter_spacing(spacing);
        self
    }

    /// Handle producers use to enqueue messages.
    pub fn queue(&self) -> MessageQueue {
        self.queue.clone()
    }

    pub fn display_message(&self, message: impl Into<String>) {
        self.queue.push(message);
    }

    /// The message currently on screen, if any.
    pub fn current_message(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl ContentSource for MessageSource {
    fn compute_tick(&mut self, _cycle: u32) {}

    fn render_tick(&mut self, _cycle: u32) {
        if self.current.is_none() {
            if let Some(message) = self.queue.pop() {
                info!("MessageSource: Displaying message \"{}\"", message);
                self.current = Some(message);
            }
        }

        if self.animation.is_none() {
            let Some(message) = self.current.as_deref() else {
                return;
            };
            debug!("MessageSource: Starting scroll for \"{}\"", message);
            toolbox::write_text_at(&mut self.buffer, &self.font, 0, TEXT_BASELINE, message);
            self.animation = Some(HorizontalScroll::new(
                &mut self.buffer,
                self.screen_width,
                Direction::Left,
                self.speed_divisor,
            ));
            return;
        }

        if let Some(animation) = self.animation.as_mut() {
            if !animation.is_done() {
                animation.perform_step(&mut self.buffer);
                return;
            }
        }

        info!(
            "MessageSource: Message \"{}\" done",
            self.current.as_deref().unwrap_or_default()
        );
        self.animation = None;
        self.current = None;
        self.buffer.clear();
    }

    fn current_buffer(&self) -> Option<&PixelBuffer> {
        Some(&self.buffer)
    }

    fn is_active(&self) -> bool {
        let scrolling = self
            .animation
            .as_ref()
            .is_some_and(|animation| !animation.is_done());
        scrolling || !self.queue.is_empty()
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn is_preemptible(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        NAME
    }
}
