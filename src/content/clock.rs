// src/content/clock.rs

//! Wall-clock display, the default content when nothing else is going on.

use log::warn;

use super::ContentSource;
use crate::graphics::{toolbox, Alignment, BufferFactory, Font, Font8x5, PixelBuffer};

const NAME: &str = "time";
const DEFAULT_PRIORITY: u8 = 0;

/// Produces the text the clock displays.
pub type TimeFormatter = fn() -> String;

/// Current local time as `HH:MM:SS`.
pub fn local_time() -> String {
    // SAFETY: `time` accepts a null pointer, and `localtime_r` only writes
    // into the `tm` we own.
    let now = unsafe { libc::time(std::ptr::null_mut()) };
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::localtime_r(&now, &mut tm) };
    if result.is_null() {
        warn!("ClockSource: localtime_r failed, showing a placeholder");
        return "--:--:--".to_string();
    }
    format!("{:02}:{:02}:{:02}", tm.tm_hour, tm.tm_min, tm.tm_sec)
}

/// Shows the current time centered on the screen.
///
/// Always active and always preemptible: any other active source takes the
/// display away from it.
pub struct ClockSource {
    buffer: PixelBuffer,
    font: Font8x5,
    priority: u8,
    formatter: TimeFormatter,
}

impl ClockSource {
    pub fn new(factory: &dyn BufferFactory, screen_width: usize) -> Self {
        let mut buffer = factory.create();
        buffer.set_width(screen_width);
        Self {
            buffer,
            font: Font8x5::new(),
            priority: DEFAULT_PRIORITY,
            formatter: local_time,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_letter_spacing(mut self, spacing: usize) -> Self {
        self.font.set_letter_spacing(spacing);
        self
    }

    /// Replaces the time source, mostly useful for fixed-output tests.
    pub fn with_formatter(mut self, formatter: TimeFormatter) -> Self {
        self.formatter = formatter;
        self
    }
}

impl ContentSource for ClockSource {
    fn compute_tick(&mut self, _cycle: u32) {}

    fn render_tick(&mut self, _cycle: u32) {
        let text = (self.formatter)();
        self.buffer.reset();
        toolbox::write_text_aligned(&mut self.buffer, &self.font, &text, Alignment::Center);
    }

    fn current_buffer(&self) -> Option<&PixelBuffer> {
        Some(&self.buffer)
    }

    fn is_active(&self) -> bool {
        true
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn is_preemptible(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        NAME
    }
}
