// src/lib.rs

//! Driver for monochrome LED dot-matrix displays.
//!
//! Content sources draw into [`graphics::PixelBuffer`]s, the
//! [`scheduler::Scheduler`] decides every compute cycle which source owns the
//! display and pushes that source's frame to a [`sink::DisplaySink`] every
//! render cycle. [`matrix::LedMatrix`] wires a clock and a message ticker
//! onto a sink.

pub mod config;
pub mod content;
pub mod graphics;
pub mod logging;
pub mod matrix;
pub mod scheduler;
pub mod sink;

mod sync;

pub use matrix::LedMatrix;
