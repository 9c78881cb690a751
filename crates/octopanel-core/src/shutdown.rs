//! Final power-down sequence. Runs exactly once, whatever ended the run:
//! a clean exit, an interrupt, or a fault in one of the loops.

use crate::client::{PrinterClient, PushCommand, Transport};
use crate::io::{Clock, OutputLine, Panel};

const DISCONNECT_GRACE_MS: u64 = 750;

/// Disconnect from the printer and walk the panel down to dark, relays off.
/// The grace delay lets the disconnect land before the serial adapter loses
/// power.
pub fn power_down<P: Panel, C: Clock, T: Transport>(
    panel: &mut P,
    clock: &mut C,
    client: &mut PrinterClient<T>,
) {
    log::info!("powering panel down");
    client.push(&PushCommand::Disconnect);
    panel.set(OutputLine::PauseLed, false);
    clock.sleep_ms(DISCONNECT_GRACE_MS);
    panel.set(OutputLine::ConnectionLed, false);
    panel.set(OutputLine::PrinterRelay, false);
    panel.set(OutputLine::FanRelay, false);
    panel.set(OutputLine::PowerLed, false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ScriptedTransport, TestClock, TestPanel};

    #[test]
    fn power_down_clears_every_line() {
        let mut panel = TestPanel::new();
        for line in [
            OutputLine::PrinterRelay,
            OutputLine::FanRelay,
            OutputLine::PowerLed,
            OutputLine::ConnectionLed,
            OutputLine::PauseLed,
        ] {
            panel.set(line, true);
        }
        let mut clock = TestClock::new();
        let mut client = PrinterClient::new(ScriptedTransport::new());

        power_down(&mut panel, &mut clock, &mut client);

        for (line, on) in panel.output_vector() {
            assert!(!on, "{line:?} still driven");
        }
        assert_eq!(client.transport().posted_count("disconnect"), 1);
    }

    #[test]
    fn power_down_sequence_is_fixed() {
        let mut panel = TestPanel::new();
        let mut clock = TestClock::new();
        let mut client = PrinterClient::new(ScriptedTransport::new());

        power_down(&mut panel, &mut clock, &mut client);

        assert_eq!(
            panel.writes,
            vec![
                (OutputLine::PauseLed, false),
                (OutputLine::ConnectionLed, false),
                (OutputLine::PrinterRelay, false),
                (OutputLine::FanRelay, false),
                (OutputLine::PowerLed, false),
            ]
        );
        assert_eq!(clock.slept_ms, vec![DISCONNECT_GRACE_MS]);
    }

    #[test]
    fn power_down_tolerates_unreachable_service() {
        let mut panel = TestPanel::new();
        let mut clock = TestClock::new();
        let mut transport = ScriptedTransport::new();
        transport.fail_posts = true;
        let mut client = PrinterClient::new(transport);

        power_down(&mut panel, &mut clock, &mut client);

        for (line, on) in panel.output_vector() {
            assert!(!on, "{line:?} still driven");
        }
    }
}
