//! Front-panel daemon for a Raspberry Pi sitting next to the printer.
//!
//! Two loops share the panel hardware: the input loop scans buttons every
//! 50 ms on the main thread, the monitor loop reconciles printer state every
//! 250 ms on its own thread. Each loop owns its own HTTP transport. Whatever
//! ends the run, the panel is walked down to dark exactly once before exit.

#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

mod gpio_panel;
mod octoprint;
mod settings;

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Context;

use octopanel_core::{
    gate, shutdown, Clock, Cue, InputLoop, Monitor, PanelConfig, PrinterClient, StdClock,
    MONITOR_TICK_MS, TICK_MS,
};

use crate::gpio_panel::{GpioPanel, SharedPanel};
use crate::octoprint::OctoTransport;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCause {
    Normal,
    Interrupt,
    Fault,
}

struct Flags {
    running: Arc<AtomicBool>,
    interrupted: Arc<AtomicBool>,
    fault: Arc<AtomicBool>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(ExitCause::Normal) => ExitCode::SUCCESS,
        Ok(cause) => {
            log::warn!("exiting after {cause:?}");
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCause> {
    let settings = Settings::load()?;
    let panel = SharedPanel::new(GpioPanel::new().context("opening gpio")?);
    let config = PanelConfig::default();

    let flags = Flags {
        running: Arc::new(AtomicBool::new(true)),
        interrupted: Arc::new(AtomicBool::new(false)),
        fault: Arc::new(AtomicBool::new(false)),
    };
    {
        let running = Arc::clone(&flags.running);
        let interrupted = Arc::clone(&flags.interrupted);
        ctrlc::set_handler(move || {
            log::info!("interrupt received");
            interrupted.store(true, Ordering::SeqCst);
            running.store(false, Ordering::SeqCst);
        })
        .context("installing signal handler")?;
    }

    let mut clock = StdClock;
    let mut input_client =
        PrinterClient::new(OctoTransport::new(&settings).context("building http client")?);

    // Hold the panel dark until the print service answers.
    {
        let mut panel = panel.clone();
        let running = Arc::clone(&flags.running);
        let ready = gate::wait_for_service(&mut panel, &mut clock, &mut input_client, || {
            running.load(Ordering::SeqCst)
        });
        if !ready {
            let mut panel = panel.clone();
            shutdown::power_down(&mut panel, &mut clock, &mut input_client);
            return Ok(ExitCause::Interrupt);
        }
    }

    let monitor_handle = {
        let mut panel = panel.clone();
        let running = Arc::clone(&flags.running);
        let fault = Arc::clone(&flags.fault);
        let mut client =
            PrinterClient::new(OctoTransport::new(&settings).context("building http client")?);
        thread::Builder::new()
            .name("monitor".to_string())
            .spawn(move || {
                let mut clock = StdClock;
                let mut monitor = Monitor::new();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    while running.load(Ordering::SeqCst) {
                        monitor.tick(&mut panel, &mut clock, &mut client, &config);
                        clock.sleep_ms(MONITOR_TICK_MS);
                    }
                }));
                if outcome.is_err() {
                    log::error!("monitor loop faulted");
                    fault.store(true, Ordering::SeqCst);
                    running.store(false, Ordering::SeqCst);
                }
            })
            .context("spawning monitor thread")?
    };

    // Input loop on the main thread.
    {
        let mut panel = panel.clone();
        let running = Arc::clone(&flags.running);
        let mut input = InputLoop::new(config);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            while running.load(Ordering::SeqCst) {
                input.tick(&mut panel, &mut clock, &mut input_client);
                clock.sleep_ms(TICK_MS);
            }
        }));
        if outcome.is_err() {
            log::error!("input loop faulted");
            flags.fault.store(true, Ordering::SeqCst);
            flags.running.store(false, Ordering::SeqCst);
        }
    }

    if monitor_handle.join().is_err() {
        flags.fault.store(true, Ordering::SeqCst);
    }

    let mut panel = panel.clone();
    if flags.interrupted.load(Ordering::SeqCst) {
        Cue::Down.play(&mut panel, &mut clock);
    }
    shutdown::power_down(&mut panel, &mut clock, &mut input_client);

    if flags.fault.load(Ordering::SeqCst) {
        Ok(ExitCause::Fault)
    } else if flags.interrupted.load(Ordering::SeqCst) {
        Ok(ExitCause::Interrupt)
    } else {
        Ok(ExitCause::Normal)
    }
}
