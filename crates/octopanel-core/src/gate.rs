//! Startup gate: hold the panel dark until the print service answers.
//!
//! The daemon usually starts well before the service finishes booting, so
//! the gate polls a single unretried state probe and blinks the power LED
//! until a recognizable answer comes back. There is deliberately no attempt
//! cap here; the panel is useless without the service, so it waits.

use crate::client::{PrinterClient, Transport};
use crate::cue::Cue;
use crate::io::{Clock, OutputLine, Panel};

const PROBE_SETTLE_MS: u64 = 200;
const BLINK_OFF_MS: u64 = 150;
const READY_LED_MS: u64 = 500;

/// Raw connection states that mean the service is up and answering, even
/// when the printer itself is absent or unhappy.
fn service_ready(raw: &str) -> bool {
    raw == "Closed" || raw == "Operational" || raw.contains("Failed")
}

/// Block until the print service responds with a known connection state,
/// then play the ready cue and return `true`. Returns `false` without the
/// cue if `keep_waiting` goes false first (shutdown requested).
pub fn wait_for_service<P: Panel, C: Clock, T: Transport>(
    panel: &mut P,
    clock: &mut C,
    client: &mut PrinterClient<T>,
    mut keep_waiting: impl FnMut() -> bool,
) -> bool {
    log::info!("waiting for print service");
    while keep_waiting() {
        panel.set(OutputLine::PowerLed, true);
        match client.pull_state_once() {
            Some(raw) if service_ready(&raw) => {
                log::info!("print service up, state {raw:?}");
                clock.sleep_ms(PROBE_SETTLE_MS);
                panel.set(OutputLine::ConnectionLed, true);
                clock.sleep_ms(READY_LED_MS);
                Cue::Up.play(panel, clock);
                clock.sleep_ms(PROBE_SETTLE_MS);
                panel.set(OutputLine::ConnectionLed, false);
                panel.set(OutputLine::PowerLed, false);
                return true;
            }
            Some(raw) => {
                log::debug!("print service answered with state {raw:?}, waiting");
            }
            None => {}
        }
        clock.sleep_ms(PROBE_SETTLE_MS);
        panel.set(OutputLine::PowerLed, false);
        clock.sleep_ms(BLINK_OFF_MS);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TransportError;
    use crate::testkit::{ScriptedTransport, TestClock, TestPanel};

    #[test]
    fn ready_states_pass_the_gate() {
        for raw in ["Closed", "Operational", "Error: Failed to autodetect"] {
            assert!(service_ready(raw), "{raw} should pass");
        }
        assert!(!service_ready("Offline"));
        assert!(!service_ready("Detecting serial port"));
    }

    #[test]
    fn gate_blinks_until_service_answers() {
        let mut transport = ScriptedTransport::new();
        for _ in 0..3 {
            transport
                .state_script
                .push_back(Err(TransportError::Request("refused".into())));
        }
        transport.state_script.push_back(Ok("Closed".to_string()));
        let mut client = PrinterClient::new(transport);
        let mut panel = TestPanel::new();
        let mut clock = TestClock::new();

        assert!(wait_for_service(&mut panel, &mut clock, &mut client, || true));

        // Three blink cycles before the ready round.
        let power_offs = panel
            .writes
            .iter()
            .filter(|w| *w == &(OutputLine::PowerLed, false))
            .count();
        assert_eq!(power_offs, 4); // 3 blink-offs plus the final off
        assert!(!panel.output(OutputLine::PowerLed));
        assert!(!panel.output(OutputLine::ConnectionLed));
        assert_eq!(panel.tones.first().map(|t| t.0), Some(200)); // up cue
    }

    #[test]
    fn non_ready_answer_keeps_waiting() {
        let mut transport = ScriptedTransport::new();
        transport
            .state_script
            .push_back(Ok("Detecting serial port".to_string()));
        transport.state_script.push_back(Ok("Operational".to_string()));
        let mut client = PrinterClient::new(transport);
        let mut panel = TestPanel::new();
        let mut clock = TestClock::new();

        assert!(wait_for_service(&mut panel, &mut clock, &mut client, || true));

        let power_offs = panel
            .writes
            .iter()
            .filter(|w| *w == &(OutputLine::PowerLed, false))
            .count();
        assert_eq!(power_offs, 2); // one blink-off plus the final off
    }

    #[test]
    fn cancelled_wait_returns_without_ready_cue() {
        let mut transport = ScriptedTransport::new();
        transport
            .state_script
            .push_back(Err(TransportError::Request("refused".into())));
        let mut client = PrinterClient::new(transport);
        let mut panel = TestPanel::new();
        let mut clock = TestClock::new();

        let mut rounds = 0;
        let ready = wait_for_service(&mut panel, &mut clock, &mut client, || {
            rounds += 1;
            rounds <= 1
        });

        assert!(!ready);
        assert_eq!(panel.tone_count(), 0);
    }
}
