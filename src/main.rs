//! # sysdelta
//!
//! A periodic host-metrics collector for Linux.
//!
//! ## Overview
//!
//! `sysdelta` samples the kernel's cumulative counters on a fixed period and
//! turns consecutive samples into rates:
//!
//! - Whole-machine CPU utilization and per-process CPU share
//! - Per-owner totals (CPU share, resident memory, I/O rates)
//! - Read/write throughput and busy share of the primary disk
//! - Receive/transmit bit rates of the primary network interface
//! - AMD GPU utilization from `rocm-smi` or the amdgpu sysfs files
//!
//! ## Usage
//!
//! ```bash
//! # Run with TUI (default)
//! sysdelta
//!
//! # Headless mode, one line per pass
//! sysdelta --headless
//!
//! # Single report as JSON, with the last 50 journal lines
//! sysdelta --once --json --logs 50
//! ```

use std::fs::File;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use sysdelta::app::App;
use sysdelta::config::Config;
use sysdelta::process::{self, ProcessSignal};
use sysdelta::ui;

fn main() -> ExitCode {
    #[cfg(not(target_os = "linux"))]
    {
        eprintln!("WARNING: sysdelta reads /proc and /sys and is designed for Linux only.");
        eprintln!();
    }

    let config = Config::parse();
    let use_headless = config.headless || !is_terminal();

    if let Err(err) = init_tracing(&config, use_headless) {
        eprintln!("cannot open log file: {err}");
        return ExitCode::FAILURE;
    }

    match run(config, use_headless) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "sysdelta stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config, use_headless: bool) -> sysdelta::Result<()> {
    if let Some(pid) = config.terminate {
        let signal = if config.force {
            ProcessSignal::Kill
        } else {
            ProcessSignal::Terminate
        };
        process::send_signal(pid, signal)?;
        info!(pid, ?signal, "signal sent");
        return Ok(());
    }

    let interval = Duration::from_secs(config.interval);

    if config.once {
        let json = config.json;
        return ui::run_once(App::new(config), interval, json);
    }

    // Setup Ctrl+C / SIGTERM handler
    let running = Arc::new(AtomicBool::new(true));
    setup_signal_handler(running.clone());

    if !config.headless && use_headless {
        warn!("stdout is not a TTY, running in headless mode");
    }

    let app = App::new(config);
    if use_headless {
        ui::run_headless(app, running, interval)
    } else {
        ui::run(app, running, interval)
    }
}

/// Route logs to `--log-file`, or stderr outside the dashboard.
///
/// The dashboard owns the terminal, so without a log file it logs nowhere.
fn init_tracing(config: &Config, use_headless: bool) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (writer, ansi) = match &config.log_file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(File::create(path)?)), false),
        None if use_headless || config.once || config.terminate.is_some() => {
            (BoxMakeWriter::new(std::io::stderr), true)
        }
        None => (BoxMakeWriter::new(std::io::sink), false),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .init();
    Ok(())
}

/// Global flag for signal handler (must be static for signal safety).
static SIGNAL_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Set up signal handlers for graceful shutdown.
fn setup_signal_handler(running: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            if SIGNAL_RECEIVED.load(Ordering::Relaxed) {
                running.store(false, Ordering::Relaxed);
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    });

    unsafe {
        libc::signal(
            libc::SIGINT,
            signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGTERM,
            signal_handler as *const () as libc::sighandler_t,
        );
    }
}

/// Signal handler that sets the signal flag (async-signal-safe).
extern "C" fn signal_handler(_: i32) {
    SIGNAL_RECEIVED.store(true, Ordering::Relaxed);
}

/// Check if stdout is connected to a terminal.
fn is_terminal() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
}
