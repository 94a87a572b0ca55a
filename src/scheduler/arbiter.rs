// src/scheduler/arbiter.rs

//! Selection of the content source that owns the display.
//!
//! The compute thread writes the selection, the render thread reads it. Both
//! go through one lock that is never held while a content hook runs.

use std::sync::Mutex;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::content::SharedSource;
use crate::graphics::PixelBuffer;
use crate::sync::lock;

/// What to do when no registered source is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdlePolicy {
    /// Keep showing the first registered source, active or not.
    #[default]
    FallbackToFirst,
    /// Clear the selection and show a blank screen.
    Blank,
}

/// Scheduling-relevant state of one source, sampled once per compute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStatus {
    pub active: bool,
    pub priority: u8,
    pub preemptible: bool,
}

/// Picks the source to display given the statuses of every registered
/// source, in registration order.
///
/// The current selection is kept unless it went inactive, or it is
/// preemptible and some other source is active too. A new pick is the active
/// source with the highest priority; on equal priorities the first
/// registered one wins.
pub fn choose_source(
    statuses: &[SourceStatus],
    current: Option<usize>,
    idle_policy: IdlePolicy,
) -> Option<usize> {
    let active_count = statuses.iter().filter(|status| status.active).count();

    if let Some(status) = current.and_then(|index| statuses.get(index)) {
        let contested = status.preemptible && active_count > 1;
        if status.active && !contested {
            return current;
        }
    }

    let mut best: Option<(usize, u8)> = None;
    for (index, status) in statuses.iter().enumerate() {
        if !status.active {
            continue;
        }
        match best {
            Some((_, priority)) if priority >= status.priority => {}
            _ => best = Some((index, status.priority)),
        }
    }

    match (best, idle_policy) {
        (Some((index, _)), _) => Some(index),
        (None, IdlePolicy::FallbackToFirst) if !statuses.is_empty() => Some(0),
        (None, _) => None,
    }
}

/// Owns the registered sources and the current selection.
pub struct Arbiter {
    sources: Vec<SharedSource>,
    selection: Mutex<Option<usize>>,
    idle_policy: IdlePolicy,
}

impl Arbiter {
    pub fn new(sources: Vec<SharedSource>, idle_policy: IdlePolicy) -> Self {
        Self {
            sources,
            selection: Mutex::new(None),
            idle_policy,
        }
    }

    pub fn idle_policy(&self) -> IdlePolicy {
        self.idle_policy
    }

    /// Index of the selected source, in registration order.
    pub fn selection(&self) -> Option<usize> {
        *lock(&self.selection, "Arbiter")
    }

    /// Name of the selected source.
    pub fn selected_name(&self) -> Option<String> {
        let source = self.sources.get(self.selection()?)?;
        let name = lock(source, "Arbiter").name().to_string();
        Some(name)
    }

    /// Runs every source's compute hook and updates the selection.
    pub fn compute_cycle(&self, cycle: u32) {
        let mut statuses = Vec::with_capacity(self.sources.len());
        let mut names = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let mut source = lock(source, "Arbiter");
            source.compute_tick(cycle);
            statuses.push(SourceStatus {
                active: source.is_active(),
                priority: source.priority(),
                preemptible: source.is_preemptible(),
            });
            names.push(source.name().to_string());
        }
        trace!("Arbiter: Compute cycle {} statuses {:?}", cycle, statuses);

        let mut selection = lock(&self.selection, "Arbiter");
        let next = choose_source(&statuses, *selection, self.idle_policy);
        if next != *selection {
            let describe = |index: Option<usize>| match index {
                Some(index) => names[index].as_str(),
                None => "<none>",
            };
            info!(
                "Arbiter: Display switches from {} to {}",
                describe(*selection),
                describe(next)
            );
            *selection = next;
        }
    }

    /// Runs the render hook of the selected source and returns a snapshot of
    /// its frame.
    ///
    /// Returns `None` when nothing is selected or the source has no buffer.
    pub fn render_cycle(&self, cycle: u32) -> Option<PixelBuffer> {
        let selected = *lock(&self.selection, "Arbiter");
        let Some(index) = selected else {
            debug!("Arbiter: Render cycle {} with no selected source", cycle);
            return None;
        };
        let source = self.sources.get(index)?;
        let mut source = lock(source, "Arbiter");
        source.render_tick(cycle);
        source.current_buffer().cloned()
    }
}
