// src/scheduler/tests.rs

use super::*;
use crate::content::mock::{MockProbe, MockSource};
use crate::content::{self, ContentSource};
use crate::sink::{self, FrameLog, HeadlessSink};
use std::thread;
use std::time::{Duration, Instant};
use test_log::test;

fn status(active: bool, priority: u8, preemptible: bool) -> SourceStatus {
    SourceStatus {
        active,
        priority,
        preemptible,
    }
}

fn headless(width: usize) -> (SharedSink, FrameLog) {
    let sink = HeadlessSink::new(width);
    let log = sink.frame_log();
    (sink::shared(sink), log)
}

fn fast_timing() -> Timing {
    Timing {
        render_period: Duration::from_millis(2),
        compute_period: Duration::from_millis(20),
        render_priority: None,
    }
}

fn markers(log: &FrameLog) -> Vec<u8> {
    log.frames().iter().map(|frame| frame.column(0)).collect()
}

// --- choose_source ---

#[test]
fn highest_priority_active_source_wins() {
    let statuses = [status(true, 1, false), status(true, 10, false)];
    assert_eq!(choose_source(&statuses, None, IdlePolicy::FallbackToFirst), Some(1));
}

#[test]
fn equal_priorities_go_to_first_registered() {
    let statuses = [
        status(false, 9, false),
        status(true, 5, false),
        status(true, 5, false),
    ];
    assert_eq!(choose_source(&statuses, None, IdlePolicy::FallbackToFirst), Some(1));
}

#[test]
fn non_preemptible_selection_is_kept_while_active() {
    let statuses = [status(true, 1, false), status(true, 10, false)];
    assert_eq!(choose_source(&statuses, Some(0), IdlePolicy::FallbackToFirst), Some(0));
}

#[test]
fn preemptible_selection_yields_to_other_active_sources() {
    let statuses = [status(true, 0, true), status(true, 10, false)];
    assert_eq!(choose_source(&statuses, Some(0), IdlePolicy::FallbackToFirst), Some(1));
}

#[test]
fn preemptible_selection_alone_is_kept() {
    let statuses = [status(true, 0, true), status(false, 10, false)];
    assert_eq!(choose_source(&statuses, Some(0), IdlePolicy::FallbackToFirst), Some(0));
}

#[test]
fn preemptible_selection_with_higher_priority_is_reselected() {
    let statuses = [status(true, 10, true), status(true, 1, false)];
    assert_eq!(choose_source(&statuses, Some(0), IdlePolicy::FallbackToFirst), Some(0));
}

#[test]
fn inactive_selection_is_replaced() {
    let statuses = [status(true, 0, true), status(false, 10, false)];
    assert_eq!(choose_source(&statuses, Some(1), IdlePolicy::FallbackToFirst), Some(0));
}

#[test]
fn idle_policy_decides_when_nothing_is_active() {
    let statuses = [status(false, 0, true), status(false, 10, false)];
    assert_eq!(choose_source(&statuses, Some(1), IdlePolicy::FallbackToFirst), Some(0));
    assert_eq!(choose_source(&statuses, Some(1), IdlePolicy::Blank), None);
    assert_eq!(choose_source(&[], None, IdlePolicy::FallbackToFirst), None);
}

// --- Arbiter, stepped by hand ---

#[test]
fn render_before_first_compute_shows_nothing() {
    let source = MockSource::new("only", 1).active(true);
    let probe = source.probe();
    let arbiter = Arbiter::new(vec![content::shared(source)], IdlePolicy::FallbackToFirst);

    assert_eq!(arbiter.render_cycle(0), None);
    assert_eq!(probe.render_ticks(), 0);
}

#[test]
fn compute_cycle_ticks_every_source() {
    let first = MockSource::new("first", 1).active(true);
    let second = MockSource::new("second", 2);
    let probes = [first.probe(), second.probe()];
    let arbiter = Arbiter::new(
        vec![content::shared(first), content::shared(second)],
        IdlePolicy::FallbackToFirst,
    );

    for cycle in 0..3 {
        arbiter.compute_cycle(cycle);
    }

    assert!(probes.iter().all(|probe| probe.compute_ticks() == 3));
    assert!(probes.iter().all(|probe| probe.render_ticks() == 0));
}

#[test]
fn lower_priority_source_never_renders_while_higher_is_active() {
    let high = MockSource::new("high", 10).active(true);
    let low = MockSource::new("low", 1).active(true);
    let (high_probe, low_probe) = (high.probe(), low.probe());
    let arbiter = Arbiter::new(
        vec![content::shared(low), content::shared(high)],
        IdlePolicy::FallbackToFirst,
    );

    for cycle in 0..300u32 {
        if cycle % 50 == 0 {
            arbiter.compute_cycle(cycle / 50);
        }
        let frame = arbiter.render_cycle(cycle).expect("frame");
        assert_eq!(frame.column(0), 10);
    }

    assert_eq!(arbiter.selected_name().as_deref(), Some("high"));
    assert_eq!(high_probe.render_ticks(), 300);
    assert_eq!(low_probe.render_ticks(), 0);
}

#[test]
fn activated_source_takes_over_from_preemptible_one() {
    let high = MockSource::new("high", 10).with_script([false, true]);
    let low = MockSource::new("low", 1).preemptible(true).active(true);
    let (high_probe, low_probe) = (high.probe(), low.probe());
    let arbiter = Arbiter::new(
        vec![content::shared(high), content::shared(low)],
        IdlePolicy::FallbackToFirst,
    );

    arbiter.compute_cycle(0);
    assert_eq!(arbiter.selection(), Some(1));
    for cycle in 0..10 {
        arbiter.render_cycle(cycle);
    }

    arbiter.compute_cycle(1);
    assert_eq!(arbiter.selection(), Some(0));
    for cycle in 10..20 {
        arbiter.render_cycle(cycle);
    }

    assert_eq!(low_probe.render_ticks(), 10);
    assert_eq!(high_probe.render_ticks(), 10);
}

#[test]
fn fallback_selects_first_source_even_if_inactive() {
    let first = MockSource::new("first", 1);
    let probe = first.probe();
    let arbiter = Arbiter::new(
        vec![content::shared(first), content::shared(MockSource::new("second", 2))],
        IdlePolicy::FallbackToFirst,
    );

    arbiter.compute_cycle(0);
    assert_eq!(arbiter.selection(), Some(0));
    assert!(arbiter.render_cycle(0).is_some());
    assert_eq!(probe.render_ticks(), 1);
}

#[test]
fn blank_policy_clears_selection_when_idle() {
    let source = MockSource::new("only", 1).with_script([true, false]);
    let probe = source.probe();
    let arbiter = Arbiter::new(vec![content::shared(source)], IdlePolicy::Blank);

    arbiter.compute_cycle(0);
    assert_eq!(arbiter.selection(), Some(0));
    arbiter.compute_cycle(1);
    assert_eq!(arbiter.selection(), None);
    assert_eq!(arbiter.render_cycle(0), None);
    assert_eq!(probe.render_ticks(), 0);
}

// --- ShutdownSignal ---

#[test]
fn shutdown_signal_is_sticky() {
    let (handle, signal) = shutdown_channel();
    assert!(!signal.is_raised());
    handle.raise();
    assert!(signal.is_raised());
    assert!(signal.is_raised());
    assert!(signal.wait_until(Instant::now() + Duration::from_secs(5)));
}

#[test]
fn dropping_the_handle_raises_the_signal() {
    let (handle, signal) = shutdown_channel();
    drop(handle);
    assert!(signal.wait_until(Instant::now() + Duration::from_secs(5)));
}

#[test]
fn wait_until_times_out_without_shutdown() {
    let (_handle, signal) = shutdown_channel();
    let start = Instant::now();
    assert!(!signal.wait_until(start + Duration::from_millis(20)));
    assert!(start.elapsed() >= Duration::from_millis(15));
    assert!(!signal.is_raised());
}

// --- Scheduler with real threads ---

#[test]
fn start_and_stop_are_idempotent() {
    let (sink, log) = headless(8);
    let source = MockSource::new("only", 3).active(true);
    let mut scheduler = Scheduler::new(
        vec![content::shared(source)],
        sink,
        fast_timing(),
        IdlePolicy::FallbackToFirst,
    );

    assert!(!scheduler.is_started());
    scheduler.start().expect("start");
    scheduler.start().expect("second start");
    assert!(scheduler.is_started());
    thread::sleep(Duration::from_millis(100));
    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_started());

    let accepted = log.accepted();
    assert!(accepted > 0);
    assert!(markers(&log).iter().all(|&marker| marker == 3));

    thread::sleep(Duration::from_millis(30));
    assert_eq!(log.accepted(), accepted, "no frame after stop");
}

#[test]
fn scheduler_can_restart_after_stop() {
    let (sink, log) = headless(8);
    let source = MockSource::new("only", 3).active(true);
    let probe: MockProbe = source.probe();
    let mut scheduler = Scheduler::new(
        vec![content::shared(source)],
        sink,
        fast_timing(),
        IdlePolicy::FallbackToFirst,
    );

    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(50));
    scheduler.stop();
    let first_run = log.accepted();

    scheduler.start().expect("restart");
    thread::sleep(Duration::from_millis(50));
    scheduler.stop();

    assert!(log.accepted() > first_run);
    assert!(probe.compute_ticks() >= 2);
}

#[test]
fn frames_switch_once_when_high_priority_source_activates() {
    let (sink, log) = headless(8);
    let high = MockSource::new("high", 10).with_script([false, false, true]);
    let low = MockSource::new("low", 1).preemptible(true).active(true);
    let (high_probe, low_probe) = (high.probe(), low.probe());
    let mut scheduler = Scheduler::new(
        vec![content::shared(low), content::shared(high)],
        sink,
        fast_timing(),
        IdlePolicy::FallbackToFirst,
    );

    scheduler.start().expect("start");
    let deadline = Instant::now() + Duration::from_secs(5);
    while high_probe.render_ticks() < 10 {
        assert!(Instant::now() < deadline, "high priority source never rendered");
        thread::sleep(Duration::from_millis(5));
    }
    scheduler.stop();

    assert!(low_probe.render_ticks() > 0);
    let markers = markers(&log);
    let switch = markers
        .iter()
        .position(|&marker| marker == 10)
        .expect("high priority frame");
    assert!(switch > 0);
    assert!(markers[..switch].iter().all(|&marker| marker == 1));
    assert!(markers[switch..].iter().all(|&marker| marker == 10));
}

#[test]
fn render_cycles_split_evenly_around_the_switch() {
    let (sink, _log) = headless(8);
    // Inactive on compute cycle 0, active from cycle 1: halfway through the run.
    let high = MockSource::new("high", 10).with_script([false, true]);
    let low = MockSource::new("low", 1).preemptible(true).active(true);
    let (high_probe, low_probe) = (high.probe(), low.probe());
    let mut scheduler = Scheduler::new(
        vec![content::shared(low), content::shared(high)],
        sink,
        Timing {
            render_period: Duration::from_millis(20),
            compute_period: Duration::from_millis(400),
            render_priority: None,
        },
        IdlePolicy::FallbackToFirst,
    );

    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(800));
    scheduler.stop();

    let (low_ticks, high_ticks) = (low_probe.render_ticks(), high_probe.render_ticks());
    let half = (low_ticks + high_ticks) / 2;
    assert!(
        low_ticks.abs_diff(half) <= 2 && high_ticks.abs_diff(half) <= 2,
        "uneven split: low {} high {}",
        low_ticks,
        high_ticks
    );
}

#[test]
fn render_thread_runs_whether_or_not_realtime_is_granted() {
    let (sink, log) = headless(8);
    let source = MockSource::new("only", 3).active(true);
    let mut scheduler = Scheduler::new(
        vec![content::shared(source)],
        sink,
        Timing {
            render_priority: Some(DEFAULT_RENDER_PRIORITY),
            ..fast_timing()
        },
        IdlePolicy::FallbackToFirst,
    );

    scheduler.start().expect("start");
    let deadline = Instant::now() + Duration::from_secs(5);
    while log.accepted() < 5 {
        assert!(Instant::now() < deadline, "render thread stalled");
        thread::sleep(Duration::from_millis(2));
    }
    scheduler.stop();
    assert!(markers(&log).iter().all(|&marker| marker == 3));
}

#[test]
fn stop_does_not_wait_for_the_slow_period() {
    let (sink, _log) = headless(8);
    let source = MockSource::new("only", 1).active(true);
    let mut scheduler = Scheduler::new(
        vec![content::shared(source)],
        sink,
        Timing {
            render_period: Duration::from_millis(5),
            compute_period: Duration::from_secs(30),
            render_priority: None,
        },
        IdlePolicy::FallbackToFirst,
    );

    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(50));
    let stopping = Instant::now();
    scheduler.stop();
    assert!(stopping.elapsed() < Duration::from_secs(5));
}

#[test]
fn blank_policy_sends_blank_frames_when_idle() {
    let (sink, log) = headless(12);
    let source = MockSource::new("idle", 7);
    let probe = source.probe();
    let mut scheduler = Scheduler::new(
        vec![content::shared(source)],
        sink,
        fast_timing(),
        IdlePolicy::Blank,
    );

    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(60));
    scheduler.stop();

    assert_eq!(probe.render_ticks(), 0);
    let frames = log.frames();
    assert!(!frames.is_empty());
    assert!(frames
        .iter()
        .all(|frame| *frame == PixelBuffer::with_width(12)));
}

struct PanickingSource {
    buffer: PixelBuffer,
}

impl ContentSource for PanickingSource {
    fn compute_tick(&mut self, _cycle: u32) {}

    fn render_tick(&mut self, _cycle: u32) {
        panic!("render hook exploded");
    }

    fn current_buffer(&self) -> Option<&PixelBuffer> {
        Some(&self.buffer)
    }

    fn is_active(&self) -> bool {
        true
    }

    fn priority(&self) -> u8 {
        0
    }

    fn is_preemptible(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

#[test]
fn panicking_render_thread_is_reported_on_stop() {
    let (sink, _log) = headless(8);
    let source = PanickingSource {
        buffer: PixelBuffer::new(),
    };
    let mut scheduler = Scheduler::new(
        vec![content::shared(source)],
        sink,
        fast_timing(),
        IdlePolicy::FallbackToFirst,
    );

    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(60));
    scheduler.stop();
    assert!(!scheduler.is_started());

    // The compute thread keeps working with the poisoned source lock.
    assert_eq!(scheduler.arbiter().selected_name().as_deref(), Some("panicking"));
}

#[test]
fn dropping_a_running_scheduler_stops_it() {
    let (sink, log) = headless(8);
    let source = MockSource::new("only", 2).active(true);
    let mut scheduler = Scheduler::new(
        vec![content::shared(source)],
        sink,
        fast_timing(),
        IdlePolicy::FallbackToFirst,
    );
    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(30));

    drop(scheduler);
    let accepted = log.accepted();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(log.accepted(), accepted);
}
