//! End-to-end scenarios driving the full panel logic against scripted
//! hardware and a scripted print service.

use octopanel_core::client::TransportError;
use octopanel_core::testkit::{ScriptedTransport, TestClock, TestPanel};
use octopanel_core::{
    gate, shutdown, InputLine, InputLoop, Monitor, OutputLine, Panel, PanelConfig, PrinterClient,
    LONG_PRESS_TICKS,
};

struct PanelHarness {
    panel: TestPanel,
    clock: TestClock,
    client: PrinterClient<ScriptedTransport>,
    input: InputLoop,
    monitor: Monitor,
    config: PanelConfig,
}

impl PanelHarness {
    fn new(transport: ScriptedTransport) -> Self {
        let config = PanelConfig::default();
        Self {
            panel: TestPanel::new(),
            clock: TestClock::new(),
            client: PrinterClient::new(transport),
            input: InputLoop::new(config),
            monitor: Monitor::new(),
            config,
        }
    }

    fn input_tick(&mut self) {
        self.input
            .tick(&mut self.panel, &mut self.clock, &mut self.client);
    }

    fn monitor_tick(&mut self) {
        self.monitor.tick(
            &mut self.panel,
            &mut self.clock,
            &mut self.client,
            &self.config,
        );
    }

    /// Hold a button for `ticks` loop iterations, then release.
    fn press_for(&mut self, line: InputLine, ticks: u32) {
        self.panel.set_input(line, true);
        for _ in 0..ticks {
            self.input_tick();
        }
        self.panel.set_input(line, false);
        self.input_tick();
    }

    fn posted(&self, name: &str) -> usize {
        self.client.transport().posted_count(name)
    }
}

#[test]
fn cold_start_gate_then_power_on_connects_and_homes() {
    let mut transport = ScriptedTransport::new();
    // Service still booting for two probes, then up with no printer.
    for _ in 0..2 {
        transport
            .state_script
            .push_back(Err(TransportError::Request("connection refused".into())));
    }
    transport.default_state = Ok("Closed".to_string());
    let mut h = PanelHarness::new(transport);

    assert!(gate::wait_for_service(
        &mut h.panel,
        &mut h.clock,
        &mut h.client,
        || true
    ));
    assert!(!h.panel.output(OutputLine::PowerLed));
    h.monitor_tick(); // records the powered-off baseline

    // Operator taps the power button: relay on, connect, home.
    h.client.transport_mut().default_state = Ok("Operational".to_string());
    h.press_for(InputLine::PowerButton, 2);
    assert!(h.panel.output(OutputLine::PrinterRelay));
    assert_eq!(h.posted("connect"), 1);
    assert_eq!(h.posted("home"), 1);

    // The monitor sees the relay edge and lights the panel.
    h.monitor_tick();
    assert!(h.panel.output(OutputLine::ConnectionLed));
    assert!(h.panel.output(OutputLine::PowerLed));
}

#[test]
fn full_print_cycle_ends_with_automated_shutdown() {
    let mut h = PanelHarness::new(ScriptedTransport::with_state("Operational"));
    h.panel.set(OutputLine::PrinterRelay, true);

    h.monitor_tick(); // Operational
    h.client.transport_mut().default_state = Ok("Printing".to_string());
    h.monitor_tick(); // print starts
    assert!(h.panel.output(OutputLine::ConnectionLed));

    h.client.transport_mut().default_state = Ok("Operational".to_string());
    h.monitor_tick(); // print done: countdown, cool-down, relays off

    assert!(!h.panel.output(OutputLine::PrinterRelay));
    assert!(!h.panel.output(OutputLine::FanRelay));
    assert_eq!(h.posted("target"), 1);
    assert_eq!(h.posted("disconnect"), 1);

    // The next monitor tick sees the relay edge and darkens the panel.
    h.monitor_tick();
    assert!(!h.panel.output(OutputLine::PowerLed));
    assert!(!h.panel.output(OutputLine::ConnectionLed));
}

#[test]
fn pause_button_round_trip_during_a_print() {
    let mut h = PanelHarness::new(ScriptedTransport::new());
    h.panel.set(OutputLine::PrinterRelay, true);

    h.client.transport_mut().default_job = Ok("Printing".to_string());
    h.press_for(InputLine::PauseButton, 3);
    assert_eq!(h.posted("pause"), 1);

    h.client.transport_mut().default_job = Ok("Paused".to_string());
    h.press_for(InputLine::PauseButton, 3);
    assert_eq!(h.posted("resume"), 1);
    // One dispatch per press, no repeats while held.
    assert_eq!(h.posted("pause"), 1);
}

#[test]
fn short_and_long_press_are_mutually_exclusive() {
    let mut h = PanelHarness::new(ScriptedTransport::new());
    h.panel.set(OutputLine::PrinterRelay, true);

    // Held past the threshold: only the long action fires.
    h.press_for(InputLine::HomeButton, LONG_PRESS_TICKS + 5);
    assert_eq!(h.posted("calibrate"), 1);
    assert_eq!(h.posted("home"), 0);

    // Released just under the threshold: only the short action fires.
    h.press_for(InputLine::HomeButton, LONG_PRESS_TICKS - 1);
    assert_eq!(h.posted("calibrate"), 1);
    assert_eq!(h.posted("home"), 1);
}

#[test]
fn connect_gives_up_after_bounded_rounds() {
    let mut h = PanelHarness::new(ScriptedTransport::with_state("Closed"));

    // Power-on tap against a printer that never connects.
    h.press_for(InputLine::PowerButton, 2);

    assert!(h.panel.output(OutputLine::PrinterRelay));
    assert_eq!(
        h.posted("connect"),
        octopanel_core::client::CONNECT_ATTEMPTS as usize
    );
    assert_eq!(h.posted("home"), 0);
    // Error cue, not a hang.
    assert_eq!(h.panel.tones.last().map(|t| t.0), Some(50));
}

#[test]
fn shutdown_output_vector_is_identical_for_every_cause() {
    let mut vectors = Vec::new();
    for scripted_failure in [false, true] {
        let mut transport = ScriptedTransport::new();
        transport.fail_posts = scripted_failure;
        let mut h = PanelHarness::new(transport);
        h.panel.set(OutputLine::PrinterRelay, true);
        h.panel.set(OutputLine::FanRelay, true);
        h.panel.set(OutputLine::PowerLed, true);
        h.panel.set(OutputLine::ConnectionLed, true);
        h.panel.writes.clear();

        shutdown::power_down(&mut h.panel, &mut h.clock, &mut h.client);
        vectors.push((h.panel.output_vector(), h.panel.writes.clone()));
    }
    assert_eq!(vectors[0], vectors[1]);
    for (line, on) in vectors[0].0 {
        assert!(!on, "{line:?} still driven after power down");
    }
}

#[test]
fn filament_runout_then_manual_resume() {
    let mut h = PanelHarness::new(ScriptedTransport::with_state("Paused"));
    h.panel.set(OutputLine::PrinterRelay, true);

    h.panel.set_input(InputLine::FilamentSensor, true);
    h.monitor_tick();
    assert!(h.panel.output(OutputLine::PauseLed));

    // Operator reloads filament and taps resume.
    h.panel.set_input(InputLine::FilamentSensor, false);
    h.client.transport_mut().default_job = Ok("Paused".to_string());
    h.press_for(InputLine::PauseButton, 2);
    assert_eq!(h.posted("resume"), 1);

    h.client.transport_mut().default_state = Ok("Printing".to_string());
    h.monitor_tick();
    assert!(!h.panel.output(OutputLine::PauseLed));
    assert!(h.panel.output(OutputLine::ConnectionLed));
}

#[test]
fn monitor_survives_service_outage_mid_print() {
    let mut h = PanelHarness::new(ScriptedTransport::with_state("Printing"));
    h.panel.set(OutputLine::PrinterRelay, true);
    h.monitor_tick();

    for _ in 0..6 {
        h.client
            .transport_mut()
            .state_script
            .push_back(Err(TransportError::Request("timeout".into())));
    }
    h.monitor_tick(); // outage tick, snapshot kept
    h.monitor_tick(); // still down
    h.monitor_tick(); // service back with the same state, no new transition

    assert!(h.panel.output(OutputLine::ConnectionLed));
    assert!(h.panel.output(OutputLine::PrinterRelay));
    let up_cues = h.panel.tones.iter().filter(|t| t.0 == 460).count();
    assert_eq!(up_cues, 1);
}
