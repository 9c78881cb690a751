//! Input loop: button sampling and command dispatch.
//!
//! [`InputLoop::tick`] runs once per 50 ms tick, samples all five buttons,
//! feeds their trackers, and dispatches the resulting events. Network calls
//! made during dispatch block the loop for their duration; that is the
//! panel's scheduling model, and the monitor loop keeps reflecting printer
//! state meanwhile.
//!
//! Guard rails: the home button refuses to act while the printer relay is
//! off, and the heat/extrude buttons refuse to act when the connection
//! check fails — each rejection plays the error cue. A short extrude is
//! additionally rejected below the minimum hotend temperature; the
//! long-press forced extrude deliberately skips that check.

use crate::button::{ButtonEvent, ButtonId, ButtonTracker, LONG_PRESS_TICKS};
use crate::client::{PrinterClient, PushCommand, Transport};
use crate::config::PanelConfig;
use crate::cue::Cue;
use crate::io::{Clock, OutputLine, Panel};
use crate::state::{JobState, PrinterState};

/// Grace period between a disconnect push and cutting printer power.
const DISCONNECT_GRACE_MS: u64 = 750;
/// Filament fed per extrude command.
const EXTRUDE_STEP_MM: f32 = 2.0;
/// Minimum hotend target for a normal (short-press) extrude.
const EXTRUDE_MIN_TARGET_C: f32 = 180.0;
/// Period of the repeated forced extrude while the button is held.
const FORCED_EXTRUDE_PERIOD_MS: u64 = 700;
/// Dwell after each RGB tier so the user can stop on a color.
const RGB_TIER_DWELL_MS: u64 = 500;

/// Case-light presets stepped through by the heat-button long press, one per
/// tick starting at the long-press threshold: off, blue, red, green, warm
/// white. One tick later the light locks to full white.
const RGB_TIERS: [(u8, u8, u8); 5] = [
    (0, 0, 0),
    (0, 0, 255),
    (255, 0, 0),
    (0, 255, 0),
    (255, 158, 108),
];
const RGB_FULL_WHITE: (u8, u8, u8) = (255, 255, 255);

pub struct InputLoop {
    trackers: [ButtonTracker; 5],
    config: PanelConfig,
}

impl InputLoop {
    pub fn new(config: PanelConfig) -> Self {
        Self {
            trackers: Default::default(),
            config,
        }
    }

    /// Sample every button once and dispatch whatever the trackers emit.
    pub fn tick<P: Panel, C: Clock, T: Transport>(
        &mut self,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
    ) {
        for (idx, id) in ButtonId::ALL.into_iter().enumerate() {
            let pressed = panel.read(id.line());
            if let Some(event) = self.trackers[idx].tick(pressed) {
                self.dispatch(id, idx, event, panel, clock, client);
            }
        }
    }

    fn dispatch<P: Panel, C: Clock, T: Transport>(
        &mut self,
        id: ButtonId,
        idx: usize,
        event: ButtonEvent,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
    ) {
        match id {
            ButtonId::Power => self.power_button(idx, event, panel, clock, client),
            ButtonId::Home => self.home_button(idx, event, panel, clock, client),
            ButtonId::Heat => self.heat_button(idx, event, panel, clock, client),
            ButtonId::Extrude => self.extrude_button(idx, event, panel, clock, client),
            ButtonId::Pause => self.pause_button(idx, event, panel, clock, client),
        }
    }

    /// Short: toggle printer power (with connect/home on power-up).
    /// Long: toggle the fan relay.
    fn power_button<P: Panel, C: Clock, T: Transport>(
        &mut self,
        idx: usize,
        event: ButtonEvent,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
    ) {
        match event {
            ButtonEvent::Hold(n) if n == LONG_PRESS_TICKS => {
                let fan_on = panel.get(OutputLine::FanRelay);
                panel.set(OutputLine::FanRelay, !fan_on);
                if fan_on {
                    log::info!("power button: fan relay off");
                    Cue::Down.play(panel, clock);
                } else {
                    log::info!("power button: fan relay on");
                    Cue::Up.play(panel, clock);
                }
                self.trackers[idx].latch();
            }
            ButtonEvent::Hold(_) => {}
            ButtonEvent::Short => {
                if !panel.get(OutputLine::PrinterRelay) {
                    log::info!("power button: printer relay on, connecting");
                    panel.set(OutputLine::PrinterRelay, true);
                    if client.connect(panel, clock) {
                        client.push(&PushCommand::Home);
                    } else {
                        log::warn!("power button: failed to connect to printer");
                        Cue::Error.play(panel, clock);
                    }
                } else {
                    log::info!("power button: disconnecting, relays off");
                    client.push(&PushCommand::Disconnect);
                    clock.sleep_ms(DISCONNECT_GRACE_MS);
                    panel.set(OutputLine::PrinterRelay, false);
                    panel.set(OutputLine::FanRelay, false);
                }
            }
        }
    }

    /// Short: home / cancel / reconnect depending on printer state.
    /// Long: one-shot calibration, only from `Operational`.
    fn home_button<P: Panel, C: Clock, T: Transport>(
        &mut self,
        idx: usize,
        event: ButtonEvent,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
    ) {
        match event {
            ButtonEvent::Hold(n) if n == LONG_PRESS_TICKS => {
                if !panel.get(OutputLine::PrinterRelay) {
                    log::warn!("home button: printer is powered off");
                    Cue::Error.play(panel, clock);
                } else if matches!(client.pull_state(clock), Ok(PrinterState::Operational)) {
                    log::info!("home button: calibrating printer");
                    Cue::Up.play(panel, clock);
                    client.push(&PushCommand::Calibrate);
                }
                self.trackers[idx].latch();
            }
            ButtonEvent::Hold(_) => {}
            ButtonEvent::Short => {
                if !panel.get(OutputLine::PrinterRelay) {
                    log::warn!("home button: printer is powered off");
                    Cue::Error.play(panel, clock);
                    return;
                }
                match client.pull_state(clock) {
                    Ok(PrinterState::Operational) => {
                        log::info!("home button: homing printhead");
                        Cue::Up.play(panel, clock);
                        client.push(&PushCommand::Home);
                    }
                    Ok(PrinterState::Printing) | Ok(PrinterState::Paused) => {
                        log::info!("home button: cancelling print, homing printhead");
                        client.push(&PushCommand::Cancel);
                        client.push(&PushCommand::Target(0.0));
                        client.push(&PushCommand::Home);
                    }
                    Ok(PrinterState::Disconnected) | Err(_) => {
                        log::info!("home button: reconnecting");
                        if client.connect(panel, clock) {
                            client.push(&PushCommand::Home);
                        } else {
                            log::warn!("home button: failed to connect to printer");
                            Cue::Error.play(panel, clock);
                        }
                    }
                }
            }
        }
    }

    /// Short: toggle the hotend target between 0 and the warm-up target.
    /// Long: step through the case-light presets, locking to full white.
    fn heat_button<P: Panel, C: Clock, T: Transport>(
        &mut self,
        idx: usize,
        event: ButtonEvent,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
    ) {
        match event {
            ButtonEvent::Hold(n) if n == LONG_PRESS_TICKS => {
                if !matches!(client.pull_connected(clock), Ok(true)) {
                    log::warn!("heat button: connection test failed");
                    Cue::Error.play(panel, clock);
                    self.trackers[idx].latch();
                    return;
                }
                log::info!("heat button: case-light color selection");
                let (r, g, b) = RGB_TIERS[0];
                client.push(&PushCommand::Rgb(r, g, b));
                clock.sleep_ms(RGB_TIER_DWELL_MS);
            }
            ButtonEvent::Hold(n)
                if n > LONG_PRESS_TICKS && n < LONG_PRESS_TICKS + RGB_TIERS.len() as u32 =>
            {
                let (r, g, b) = RGB_TIERS[(n - LONG_PRESS_TICKS) as usize];
                client.push(&PushCommand::Rgb(r, g, b));
                clock.sleep_ms(RGB_TIER_DWELL_MS);
            }
            ButtonEvent::Hold(n) if n == LONG_PRESS_TICKS + RGB_TIERS.len() as u32 => {
                let (r, g, b) = RGB_FULL_WHITE;
                client.push(&PushCommand::Rgb(r, g, b));
                self.trackers[idx].latch();
            }
            ButtonEvent::Hold(_) => {}
            ButtonEvent::Short => {
                if !matches!(client.pull_connected(clock), Ok(true)) {
                    log::warn!("heat button: connection test failed");
                    Cue::Error.play(panel, clock);
                    return;
                }
                match client.pull_target(clock) {
                    Err(_) => {
                        log::warn!("heat button: unable to get current target");
                        Cue::Error.play(panel, clock);
                    }
                    Ok(target) if target == 0.0 => {
                        log::info!("heat button: warming up ({}c)", self.config.warmup_target_c);
                        Cue::Up.play(panel, clock);
                        client.push(&PushCommand::Target(self.config.warmup_target_c));
                    }
                    Ok(_) => {
                        log::info!("heat button: cooling down (0c)");
                        Cue::Down.play(panel, clock);
                        client.push(&PushCommand::Target(0.0));
                    }
                }
            }
        }
    }

    /// Short: extrude a step, rejected while the hotend is cold.
    /// Long: repeated forced extrude while held, no temperature check.
    fn extrude_button<P: Panel, C: Clock, T: Transport>(
        &mut self,
        idx: usize,
        event: ButtonEvent,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
    ) {
        match event {
            ButtonEvent::Hold(n) if n >= LONG_PRESS_TICKS => {
                if n == LONG_PRESS_TICKS && !matches!(client.pull_connected(clock), Ok(true)) {
                    log::warn!("extrude button: connection test failed");
                    Cue::Error.play(panel, clock);
                    self.trackers[idx].latch();
                    return;
                }
                log::info!("extrude button: extruding {}mm (forced)", EXTRUDE_STEP_MM);
                Cue::Up.play(panel, clock);
                client.push(&PushCommand::Extrude(EXTRUDE_STEP_MM));
                clock.sleep_ms(FORCED_EXTRUDE_PERIOD_MS);
            }
            ButtonEvent::Hold(_) => {}
            ButtonEvent::Short => {
                if !matches!(client.pull_connected(clock), Ok(true)) {
                    log::warn!("extrude button: connection test failed");
                    Cue::Error.play(panel, clock);
                    return;
                }
                match client.pull_target(clock) {
                    Err(_) => {
                        log::warn!("extrude button: unable to get current target");
                    }
                    Ok(target) if target >= EXTRUDE_MIN_TARGET_C => {
                        log::info!("extrude button: extruding {}mm", EXTRUDE_STEP_MM);
                        Cue::Up.play(panel, clock);
                        client.push(&PushCommand::Extrude(EXTRUDE_STEP_MM));
                    }
                    Ok(target) => {
                        log::warn!("extrude button: hotend too cold to extrude ({target}c)");
                        Cue::Error.play(panel, clock);
                    }
                }
            }
        }
    }

    /// Pause or resume the job. Dispatches on the press edge and latches, so
    /// a held button still acts exactly once; there is no distinct long
    /// press.
    fn pause_button<P: Panel, C: Clock, T: Transport>(
        &mut self,
        idx: usize,
        event: ButtonEvent,
        panel: &mut P,
        clock: &mut C,
        client: &mut PrinterClient<T>,
    ) {
        if event != ButtonEvent::Hold(1) {
            return;
        }
        self.trackers[idx].latch();
        match client.pull_job(clock) {
            Ok(JobState::Printing) => {
                log::info!("pause button: pausing print");
                client.push(&PushCommand::Pause);
            }
            Ok(JobState::Paused) => {
                log::info!("pause button: resuming print");
                client.push(&PushCommand::Resume);
            }
            Ok(JobState::Other) | Err(_) => {
                log::warn!("pause button: no job to pause or resume");
                Cue::Error.play(panel, clock);
            }
        }
    }
}
