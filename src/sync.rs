// src/sync.rs

//! Lock helpers shared by the render and compute threads.

use std::sync::{Mutex, MutexGuard};

use log::error;

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// A panicking content source must not take the display down with it, so a
/// poisoned lock is logged and used as-is.
pub(crate) fn lock<'a, T: ?Sized>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        error!("{}: Lock was poisoned by a panicking thread, recovering", what);
        poisoned.into_inner()
    })
}
