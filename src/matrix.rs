// src/matrix.rs

//! The assembled display: clock and message sources on top of a scheduler
//! driving one sink.

use anyhow::Result;
use log::{debug, info};

use crate::config::Config;
use crate::content::{self, ClockSource, MessageQueue, MessageSource};
use crate::graphics::MonoColorBufferFactory;
use crate::logging::{self, LogLevel};
use crate::scheduler::{Scheduler, Timing};
use crate::sink::SharedSink;
use crate::sync::lock;

/// Clock plus message display, ready to start.
///
/// The clock is registered first, so it is what an idle display falls back
/// to. Messages are queued through [`LedMatrix::enqueue_message`] and take
/// over the display on the next compute cycle.
pub struct LedMatrix {
    scheduler: Scheduler,
    messages: MessageQueue,
    sink: SharedSink,
}

impl LedMatrix {
    pub fn new(config: &Config, sink: SharedSink) -> Self {
        let factory = MonoColorBufferFactory;
        let width = lock(&sink, "LedMatrix").width();

        let clock = ClockSource::new(&factory, width)
            .with_priority(config.content.clock_priority)
            .with_letter_spacing(config.content.letter_spacing);
        let message = MessageSource::new(&factory, width)
            .with_priority(config.content.message_priority)
            .with_speed_divisor(config.content.scroll_speed_divisor)
            .with_letter_spacing(config.content.letter_spacing);
        let messages = message.queue();

        let sources = vec![content::shared(clock), content::shared(message)];
        let scheduler = Scheduler::new(
            sources,
            sink.clone(),
            Timing::from(&config.timing),
            config.scheduler.idle_policy,
        );
        info!("LedMatrix: Assembled for a {} column display", width);

        Self {
            scheduler,
            messages,
            sink,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.scheduler.start()
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_started(&self) -> bool {
        self.scheduler.is_started()
    }

    /// Queues `text` for display. Empty strings are ignored.
    pub fn enqueue_message(&self, text: &str) {
        if text.is_empty() {
            debug!("LedMatrix: Ignoring empty message");
            return;
        }
        self.messages.push(text);
    }

    /// Handle for producers on other threads.
    pub fn message_queue(&self) -> MessageQueue {
        self.messages.clone()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        logging::set_log_level(level);
    }

    /// Name of the source currently on the display.
    pub fn current_source(&self) -> Option<String> {
        self.scheduler.arbiter().selected_name()
    }

    /// Blanks the display. Meant for use once stopped.
    pub fn clear_display(&self) {
        lock(&self.sink, "LedMatrix").clear();
    }
}

impl Drop for LedMatrix {
    fn drop(&mut self) {
        if self.is_started() {
            self.stop();
        }
    }
}
