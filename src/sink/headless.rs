//! Headless sink that keeps the frames it receives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::{info, trace};

use super::DisplaySink;
use crate::graphics::PixelBuffer;
use crate::sync::lock;

const DEFAULT_HISTORY: usize = 1024;

/// Read side of a [`HeadlessSink`]'s history. Cloning shares the history.
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    frames: Arc<Mutex<VecDeque<PixelBuffer>>>,
    accepted: Arc<AtomicUsize>,
}

impl FrameLog {
    /// Frames still held, oldest first.
    pub fn frames(&self) -> Vec<PixelBuffer> {
        lock(&self.frames, "FrameLog").iter().cloned().collect()
    }

    pub fn last(&self) -> Option<PixelBuffer> {
        lock(&self.frames, "FrameLog").back().cloned()
    }

    /// Total number of frames accepted, including those dropped from the
    /// history.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

pub struct HeadlessSink {
    width: usize,
    capacity: usize,
    log: FrameLog,
}

impl HeadlessSink {
    pub fn new(width: usize) -> Self {
        Self::with_capacity(width, DEFAULT_HISTORY)
    }

    /// Keeps at most `capacity` frames; older ones are dropped first.
    pub fn with_capacity(width: usize, capacity: usize) -> Self {
        info!(
            "HeadlessSink: {} columns, keeping {} frames",
            width, capacity
        );
        Self {
            width,
            capacity,
            log: FrameLog::default(),
        }
    }

    pub fn frame_log(&self) -> FrameLog {
        self.log.clone()
    }
}

impl DisplaySink for HeadlessSink {
    fn accept_snapshot(&mut self, frame: &PixelBuffer) {
        let count = self.log.accepted.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("HeadlessSink: Frame {} ({} columns)", count, frame.width());
        if self.capacity == 0 {
            return;
        }
        let mut frames = lock(&self.log.frames, "HeadlessSink");
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame.clone());
    }

    fn width(&self) -> usize {
        self.width
    }
}
