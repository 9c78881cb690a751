//! Monitor loop: mirrors printer state onto LEDs and the speaker, and runs
//! the automatic power-down when a print finishes.
//!
//! The loop owns nothing but its previous-poll snapshot. Relay truth is read
//! back from the hardware line on every tick so externally driven changes
//! (the input loop, or a manual toggle) are detected as edges. While the
//! printer relay is off no state is pulled — polling a powered-off printer
//! would only burn retries.

use crate::client::{PrinterClient, PushCommand, Transport};
use crate::config::PanelConfig;
use crate::cue::Cue;
use crate::io::{Clock, InputLine, OutputLine, Panel};
use crate::state::PrinterState;

/// Monitor loop tick period.
pub const MONITOR_TICK_MS: u64 = 250;
/// Half-period of the pause-LED blink and the countdown blink.
const BLINK_MS: u64 = 500;
/// Settle delays around the final relay cut.
const RELAY_CUT_SETTLE_MS: u64 = 250;

/// Edge-detection snapshot between polls.
#[derive(Debug, Default)]
pub struct Monitor {
    prev_state: Option<PrinterState>,
    prev_powered: Option<bool>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one monitor cycle. The caller sleeps [`MONITOR_TICK_MS`] between
    /// cycles.
    pub fn tick<P: Panel, C: Clock, T: Transport>(
        &mut self,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
        config: &PanelConfig,
    ) {
        let powered = panel.get(OutputLine::PrinterRelay);
        if let Some(prev) = self.prev_powered {
            if !prev && powered {
                log::info!("monitor: printer relay on");
                panel.set(OutputLine::PowerLed, true);
                Cue::Beep.play(panel, clock);
                // Force a fresh transition evaluation now that power is back.
                self.prev_state = None;
            } else if prev && !powered {
                log::info!("monitor: printer relay off");
                panel.set(OutputLine::PowerLed, false);
                panel.set(OutputLine::ConnectionLed, false);
                panel.set(OutputLine::PauseLed, false);
                Cue::Down.play(panel, clock);
            }
        }
        self.prev_powered = Some(powered);

        if !powered {
            return;
        }

        let state = match client.pull_state(clock) {
            Ok(state) => state,
            Err(err) => {
                // An unreachable service is not a state; keep the snapshot
                // and try again next tick.
                log::warn!("monitor: state pull failed: {err}");
                return;
            }
        };

        if self.prev_state != Some(state) {
            let finished_printing = state == PrinterState::Operational
                && matches!(
                    self.prev_state,
                    Some(PrinterState::Printing) | Some(PrinterState::Paused)
                );
            if finished_printing && config.auto_shutdown {
                self.auto_shutdown(panel, clock, client, config);
                return;
            }
            self.on_transition(state, panel, clock);
        }

        self.blink_pause_led(state, panel, clock);
        self.prev_state = Some(state);
    }

    fn on_transition<P: Panel, C: Clock>(
        &mut self,
        state: PrinterState,
        panel: &mut P,
        clock: &mut C,
    ) {
        match state {
            PrinterState::Operational => {
                log::info!("monitor: printer connected");
                panel.set(OutputLine::ConnectionLed, true);
                panel.set(OutputLine::PauseLed, false);
                Cue::Up.play(panel, clock);
            }
            PrinterState::Paused => {
                log::info!("monitor: print paused");
                panel.set(OutputLine::ConnectionLed, true);
                panel.set(OutputLine::PauseLed, true);
                Cue::Down.play(panel, clock);
            }
            PrinterState::Printing => {
                if self.prev_state == Some(PrinterState::Paused) {
                    log::info!("monitor: print resumed");
                } else {
                    log::info!("monitor: print started");
                }
                panel.set(OutputLine::ConnectionLed, true);
                panel.set(OutputLine::PauseLed, false);
                Cue::Up.play(panel, clock);
            }
            PrinterState::Disconnected => {
                panel.set(OutputLine::ConnectionLed, false);
                panel.set(OutputLine::PauseLed, false);
                if matches!(
                    self.prev_state,
                    Some(PrinterState::Operational)
                        | Some(PrinterState::Paused)
                        | Some(PrinterState::Printing)
                ) {
                    log::info!("monitor: printer disconnected");
                    Cue::Beep.play(panel, clock);
                } else {
                    // Transient or unknown previous state: stay silent to
                    // avoid cue spam.
                    log::debug!("monitor: printer not connected");
                }
            }
        }
    }

    /// Print finished or was cancelled: cool down, disconnect, blink through
    /// the countdown, then cut both relays.
    fn auto_shutdown<P: Panel, C: Clock, T: Transport>(
        &mut self,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
        config: &PanelConfig,
    ) {
        log::info!(
            "monitor: print completed or cancelled, automated shutdown in {}s",
            config.shutdown_countdown_ticks
        );
        panel.set(OutputLine::ConnectionLed, true);
        panel.set(OutputLine::PauseLed, false);
        Cue::Up.play(panel, clock);
        clock.sleep_ms(BLINK_MS);

        client.push(&PushCommand::Target(0.0));
        client.push(&PushCommand::Disconnect);

        for _ in 0..config.shutdown_countdown_ticks {
            panel.set(OutputLine::ConnectionLed, false);
            Cue::Beep.play(panel, clock);
            clock.sleep_ms(BLINK_MS);
            panel.set(OutputLine::ConnectionLed, true);
            clock.sleep_ms(BLINK_MS);
        }

        panel.set(OutputLine::ConnectionLed, false);
        Cue::Beep.play(panel, clock);
        clock.sleep_ms(RELAY_CUT_SETTLE_MS);
        panel.set(OutputLine::PrinterRelay, false);
        panel.set(OutputLine::FanRelay, false);
        clock.sleep_ms(RELAY_CUT_SETTLE_MS);

        self.prev_state = Some(PrinterState::Disconnected);
    }

    /// Pause/filament feedback: blink the pause LED while the print is
    /// paused or the filament sensor has tripped, extinguish it otherwise.
    fn blink_pause_led<P: Panel, C: Clock>(
        &mut self,
        state: PrinterState,
        panel: &mut P,
        clock: &mut C,
    ) {
        let filament_out = panel.read(InputLine::FilamentSensor);
        if state == PrinterState::Paused || filament_out {
            panel.set(OutputLine::PauseLed, false);
            clock.sleep_ms(BLINK_MS);
            panel.set(OutputLine::PauseLed, true);
        }
        if !filament_out {
            clock.sleep_ms(BLINK_MS);
            panel.set(OutputLine::PauseLed, false);
        }
    }
}
