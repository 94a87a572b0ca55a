//! End-to-end tests of the assembled display on a headless sink.

use std::thread;
use std::time::{Duration, Instant};

use pi_ledmatrix::config::Config;
use pi_ledmatrix::graphics::PixelBuffer;
use pi_ledmatrix::logging::LogLevel;
use pi_ledmatrix::sink::{self, FrameLog, HeadlessSink};
use pi_ledmatrix::LedMatrix;
use test_log::test;

const WIDTH: usize = 64;

fn fast_config() -> Config {
    let mut config = Config::default();
    config.timing.render_period_ms = 2;
    config.timing.compute_period_ms = 20;
    config
}

fn matrix() -> (LedMatrix, FrameLog) {
    let sink = HeadlessSink::new(WIDTH);
    let log = sink.frame_log();
    (LedMatrix::new(&fast_config(), sink::shared(sink)), log)
}

fn wait_for_source(matrix: &LedMatrix, name: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while matrix.current_source().as_deref() != Some(name) {
        assert!(
            Instant::now() < deadline,
            "{} never got the display (current: {:?})",
            name,
            matrix.current_source()
        );
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn clock_owns_the_idle_display() {
    let (mut matrix, log) = matrix();
    matrix.start().expect("start");
    wait_for_source(&matrix, "time");
    thread::sleep(Duration::from_millis(50));
    matrix.stop();

    let last = log.last().expect("a frame");
    assert!(last.width() >= WIDTH);
    assert!((0..last.width()).any(|x| last.column(x) != 0), "time is drawn");
}

#[test]
fn message_takes_over_and_hands_back_to_clock() {
    let (mut matrix, _log) = matrix();
    matrix.enqueue_message("hi");
    matrix.start().expect("start");

    wait_for_source(&matrix, "message");
    wait_for_source(&matrix, "time");
    assert!(matrix.message_queue().is_empty());

    matrix.stop();
}

#[test]
fn start_and_stop_twice_is_harmless() {
    let (mut matrix, _log) = matrix();
    assert!(!matrix.is_started());
    matrix.start().expect("start");
    matrix.start().expect("second start");
    assert!(matrix.is_started());
    matrix.stop();
    matrix.stop();
    assert!(!matrix.is_started());
}

#[test]
fn empty_messages_are_ignored() {
    let (matrix, _log) = matrix();
    matrix.enqueue_message("");
    assert!(matrix.message_queue().is_empty());
    matrix.enqueue_message("x");
    assert_eq!(matrix.message_queue().len(), 1);
}

#[test]
fn producer_thread_does_not_block_the_display() {
    let (mut matrix, log) = matrix();
    let queue = matrix.message_queue();
    matrix.start().expect("start");

    let producer = thread::spawn(move || {
        for index in 0..200 {
            queue.push(format!("message {}", index));
            thread::sleep(Duration::from_micros(200));
        }
    });
    producer.join().expect("producer panicked");

    let frames_before = log.accepted();
    thread::sleep(Duration::from_millis(50));
    assert!(log.accepted() > frames_before, "render loop keeps running");

    matrix.stop();
    assert!(!matrix.is_started());
}

#[test]
fn clear_display_sends_a_blank_frame() {
    let (mut matrix, log) = matrix();
    matrix.start().expect("start");
    thread::sleep(Duration::from_millis(30));
    matrix.stop();
    matrix.clear_display();

    assert_eq!(log.last(), Some(PixelBuffer::with_width(WIDTH)));
}

#[test]
fn dropping_a_started_matrix_stops_rendering() {
    let (mut matrix, log) = matrix();
    matrix.set_log_level(LogLevel::Debug);
    matrix.start().expect("start");
    thread::sleep(Duration::from_millis(30));
    drop(matrix);

    let accepted = log.accepted();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(log.accepted(), accepted);
}
