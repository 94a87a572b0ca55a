// src/scheduler/mod.rs

//! The two periodic threads that drive the display.
//!
//! The compute thread runs every source's compute hook on the slow period
//! and updates the selection. The render thread runs the selected source's
//! render hook on the fast period and hands frames to the sink.
//!
//! Frames are transmitted one cycle late: each render iteration first sends
//! the frame prepared by the previous iteration, then prepares the next one.
//! A slow render hook therefore delays the next frame but never the one
//! being transmitted.

pub mod arbiter;
pub mod shutdown;

pub use arbiter::{choose_source, Arbiter, IdlePolicy, SourceStatus};
pub use shutdown::{shutdown_channel, ShutdownHandle, ShutdownSignal};

use std::io;
use std::os::unix::thread::JoinHandleExt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};

use crate::content::SharedSource;
use crate::graphics::PixelBuffer;
use crate::sink::SharedSink;
use crate::sync::lock;

const COMPUTE_THREAD_NAME: &str = "ledmatrix-compute";
const RENDER_THREAD_NAME: &str = "ledmatrix-render";

/// Default `SCHED_FIFO` priority of the render thread.
pub const DEFAULT_RENDER_PRIORITY: i32 = 20;

/// Periods of the two scheduler threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub render_period: Duration,
    pub compute_period: Duration,
    /// `SCHED_FIFO` priority for the render thread. `None` leaves it under
    /// the default policy.
    pub render_priority: Option<i32>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            render_period: Duration::from_millis(15),
            compute_period: Duration::from_millis(1000),
            render_priority: Some(DEFAULT_RENDER_PRIORITY),
        }
    }
}

struct Workers {
    shutdown: Vec<ShutdownHandle>,
    threads: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Cancels every thread and waits for it to finish its iteration.
    fn shutdown(self) {
        for handle in self.shutdown {
            handle.raise();
        }
        for thread in self.threads {
            let name = thread.thread().name().unwrap_or("<unnamed>").to_string();
            if let Err(e) = thread.join() {
                error!("Scheduler: Thread {} panicked: {:?}", name, e);
            } else {
                debug!("Scheduler: Thread {} joined", name);
            }
        }
    }
}

pub struct Scheduler {
    arbiter: Arc<Arbiter>,
    sink: SharedSink,
    timing: Timing,
    workers: Option<Workers>,
}

impl Scheduler {
    pub fn new(
        sources: Vec<SharedSource>,
        sink: SharedSink,
        timing: Timing,
        idle_policy: IdlePolicy,
    ) -> Self {
        Self {
            arbiter: Arc::new(Arbiter::new(sources, idle_policy)),
            sink,
            timing,
            workers: None,
        }
    }

    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    pub fn is_started(&self) -> bool {
        self.workers.is_some()
    }

    /// Spawns the compute and render threads.
    ///
    /// Starting a running scheduler only logs a warning.
    pub fn start(&mut self) -> Result<()> {
        if self.is_started() {
            warn!("Scheduler: Already started");
            return Ok(());
        }
        let mut workers = Workers {
            shutdown: Vec::with_capacity(2),
            threads: Vec::with_capacity(2),
        };

        let (handle, signal) = shutdown_channel();
        let arbiter = Arc::clone(&self.arbiter);
        let period = self.timing.compute_period;
        let spawned = thread::Builder::new()
            .name(COMPUTE_THREAD_NAME.to_string())
            .spawn(move || compute_loop(&arbiter, period, &signal))
            .context("Failed to spawn compute thread");
        workers.threads.push(spawned?);
        workers.shutdown.push(handle);

        let (handle, signal) = shutdown_channel();
        let arbiter = Arc::clone(&self.arbiter);
        let sink = Arc::clone(&self.sink);
        let period = self.timing.render_period;
        let spawned = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || render_loop(&arbiter, &sink, period, &signal))
            .context("Failed to spawn render thread");
        match spawned {
            Ok(render) => {
                if let Some(priority) = self.timing.render_priority {
                    make_realtime(&render, priority);
                }
                workers.shutdown.push(handle);
                workers.threads.push(render);
            }
            Err(e) => {
                workers.shutdown();
                return Err(e);
            }
        }

        info!(
            "Scheduler: Started (render every {:?}, compute every {:?})",
            self.timing.render_period, self.timing.compute_period
        );
        self.workers = Some(workers);
        Ok(())
    }

    /// Stops both threads and waits for them. Once this returns, no hook
    /// runs and nothing is sent to the sink.
    pub fn stop(&mut self) {
        match self.workers.take() {
            Some(workers) => {
                info!("Scheduler: Stopping");
                workers.shutdown();
                info!("Scheduler: Stopped");
            }
            None => warn!("Scheduler: Already stopped"),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.is_started() {
            self.stop();
        }
    }
}

/// Switches a spawned thread to `SCHED_FIFO`. Failure (usually missing
/// privileges) is logged and the thread keeps its current policy.
fn make_realtime(thread: &JoinHandle<()>, priority: i32) {
    // SAFETY: sched_param is plain data; zero is valid for every field.
    let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
    param.sched_priority = priority;
    // SAFETY: the handle is not joined yet, so the pthread id is valid.
    let result =
        unsafe { libc::pthread_setschedparam(thread.as_pthread_t(), libc::SCHED_FIFO, &param) };
    if result == 0 {
        info!("Scheduler: Render thread runs SCHED_FIFO at priority {}", priority);
    } else {
        error!(
            "Scheduler: Failed to set SCHED_FIFO priority {} on the render thread: {}",
            priority,
            io::Error::from_raw_os_error(result)
        );
    }
}

fn compute_loop(arbiter: &Arbiter, period: Duration, signal: &ShutdownSignal) {
    info!("Scheduler: Compute thread started");
    let mut cycle: u32 = 0;
    loop {
        if signal.is_raised() {
            break;
        }
        let deadline = Instant::now() + period;

        trace!("Scheduler: Compute cycle {}", cycle);
        arbiter.compute_cycle(cycle);
        cycle = cycle.wrapping_add(1);

        if signal.wait_until(deadline) {
            break;
        }
    }
    info!("Scheduler: Compute thread exiting after {} cycles", cycle);
}

fn render_loop(arbiter: &Arbiter, sink: &SharedSink, period: Duration, signal: &ShutdownSignal) {
    info!("Scheduler: Render thread started");
    let blank_width = match arbiter.idle_policy() {
        IdlePolicy::Blank => Some(lock(sink, "Scheduler").width()),
        IdlePolicy::FallbackToFirst => None,
    };

    let mut cycle: u32 = 0;
    let mut pending: Option<PixelBuffer> = None;
    loop {
        if signal.is_raised() {
            break;
        }
        // Measured from now, so an overrun eats the slack instead of drifting.
        let deadline = Instant::now() + period;

        // Transmit last cycle's frame before preparing the next one.
        if let Some(frame) = pending.take() {
            lock(sink, "Scheduler").accept_snapshot(&frame);
        }
        // Nothing selected: skip the frame, or blank it under IdlePolicy::Blank.
        pending = arbiter
            .render_cycle(cycle)
            .or_else(|| blank_width.map(PixelBuffer::with_width));
        cycle = cycle.wrapping_add(1);

        if signal.wait_until(deadline) {
            break;
        }
    }
    info!("Scheduler: Render thread exiting after {} cycles", cycle);
}

#[cfg(test)]
mod tests;
