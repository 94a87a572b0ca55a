// src/main.rs

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use pi_ledmatrix::config::{DisplayConfig, CONFIG};
use pi_ledmatrix::content::MessageQueue;
use pi_ledmatrix::logging::{self, LogLevel};
use pi_ledmatrix::sink::{self, ConsoleSink, HeadlessSink, Ht1632Sink, SharedSink, SinkKind};
use pi_ledmatrix::LedMatrix;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_secs(1);

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signal: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

fn install_signal_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(request_shutdown),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic.
        unsafe { signal::sigaction(sig, &action) }
            .with_context(|| format!("Failed to install {} handler", sig))?;
    }
    Ok(())
}

fn build_sink(display: &DisplayConfig) -> Result<SharedSink> {
    let sink = match display.sink {
        SinkKind::Ht1632 => {
            let mut panels =
                Ht1632Sink::open(&display.spi_devices, display.panels, display.spi_speed_hz)
                    .context("Failed to open HT1632 panels")?;
            panels.set_brightness(display.brightness);
            panels.set_blink(display.blink);
            sink::shared(panels)
        }
        SinkKind::Console => sink::shared(ConsoleSink::stdout(display.width())),
        SinkKind::Headless => sink::shared(HeadlessSink::with_capacity(display.width(), 0)),
    };
    Ok(sink)
}

/// Forwards every non-empty stdin line to the message queue until EOF.
fn spawn_stdin_reader(queue: MessageQueue) -> Result<()> {
    thread::Builder::new()
        .name("ledmatrix-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        let text = line.trim();
                        if !text.is_empty() {
                            info!("Main: Queueing message \"{}\"", text);
                            queue.push(text);
                        }
                    }
                    Err(e) => {
                        error!("Main: Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            info!("Main: stdin closed, no more messages");
        })
        .context("Failed to spawn stdin reader thread")?;
    Ok(())
}

fn main() -> Result<()> {
    logging::init(LogLevel::Info);
    let config = &*CONFIG;
    logging::set_log_level(config.logging.level);
    info!("Starting pi-ledmatrix...");

    install_signal_handlers()?;

    let sink = build_sink(&config.display)?;
    let mut matrix = LedMatrix::new(config, sink);
    matrix.start().context("Failed to start the display")?;

    spawn_stdin_reader(matrix.message_queue())?;

    while !SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
        thread::sleep(SHUTDOWN_POLL_INTERVAL);
    }

    warn!("Main: Shutdown requested");
    matrix.stop();
    matrix.clear_display();
    info!("pi-ledmatrix exited.");
    Ok(())
}
