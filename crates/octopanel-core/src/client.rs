//! Printer-control client: retry policy over a raw REST transport.
//!
//! A [`Transport`] performs exactly one HTTP round trip per call and reports
//! failures as [`TransportError`]. [`PrinterClient`] layers the panel's
//! policy on top: pulls retry up to three times with a 500 ms pause and
//! surface [`ClientError`] only after exhaustion; `connect` runs the bounded
//! blink-and-poll sequence; every other push is a single fire-and-forget
//! POST whose failure is observed on the next pull.

use thiserror::Error;

use crate::io::{Clock, OutputLine, Panel};
use crate::state::{JobState, PrinterState};

/// Attempts per pull before giving up.
pub const PULL_ATTEMPTS: u32 = 3;
/// Pause between failed pull attempts.
pub const PULL_RETRY_DELAY_MS: u64 = 500;
/// Connect rounds before giving up.
pub const CONNECT_ATTEMPTS: u32 = 16;
/// Settle time between issuing a connect and probing the result.
pub const CONNECT_SETTLE_MS: u64 = 550;
/// Connection LED blink while a connect round fails.
const CONNECT_BLINK_MS: u64 = 500;

/// Commands pushed to the printer-control service.
#[derive(Debug, Clone, PartialEq)]
pub enum PushCommand {
    Connect,
    Disconnect,
    /// Cancel the running job.
    Cancel,
    /// Zero the hotend target, then home all axes.
    Home,
    /// Pause the job and park the head.
    Pause,
    Resume,
    /// Run the factory calibration program.
    Calibrate,
    /// Set the hotend target temperature (°C).
    Target(f32),
    /// Extrude filament (mm).
    Extrude(f32),
    /// Drive the case light via the firmware's raw-command passthrough
    /// (0–255 per channel).
    Rgb(u8, u8, u8),
}

impl PushCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PushCommand::Connect => "connect",
            PushCommand::Disconnect => "disconnect",
            PushCommand::Cancel => "cancel",
            PushCommand::Home => "home",
            PushCommand::Pause => "pause",
            PushCommand::Resume => "resume",
            PushCommand::Calibrate => "calibrate",
            PushCommand::Target(_) => "target",
            PushCommand::Extrude(_) => "extrude",
            PushCommand::Rgb(..) => "rgb",
        }
    }
}

/// A single failed HTTP round trip.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Pull failure after the retry budget is spent. Callers must treat this as
/// a distinct outcome — it is never folded into `Disconnected`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("printer service unavailable after {attempts} attempts: {last}")]
    Unavailable { attempts: u32, last: TransportError },
}

/// One HTTP round trip per call; no retries at this layer.
pub trait Transport {
    /// GET the raw connection-state string.
    fn connection_state(&mut self) -> Result<String, TransportError>;
    /// GET the hotend target temperature (°C).
    fn tool_target(&mut self) -> Result<f32, TransportError>;
    /// GET the raw job-state string.
    fn job_state(&mut self) -> Result<String, TransportError>;
    /// POST a command.
    fn post(&mut self, command: &PushCommand) -> Result<(), TransportError>;
}

pub struct PrinterClient<T> {
    transport: T,
}

impl<T: Transport> PrinterClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn pull_with_retry<V>(
        &mut self,
        clock: &mut impl Clock,
        what: &str,
        fetch: impl Fn(&mut T) -> Result<V, TransportError>,
    ) -> Result<V, ClientError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match fetch(&mut self.transport) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= PULL_ATTEMPTS => {
                    log::warn!("pull {what}: giving up after {attempt} attempts: {err}");
                    return Err(ClientError::Unavailable { attempts: attempt, last: err });
                }
                Err(err) => {
                    log::warn!("pull {what}: attempt {attempt} failed: {err}");
                    clock.sleep_ms(PULL_RETRY_DELAY_MS);
                }
            }
        }
    }

    /// "Detailed" verbosity: the collapsed state model.
    pub fn pull_state(&mut self, clock: &mut impl Clock) -> Result<PrinterState, ClientError> {
        self.pull_with_retry(clock, "state", |t| t.connection_state())
            .map(|raw| PrinterState::from_raw(&raw))
    }

    /// "Basic" verbosity: connected or not.
    pub fn pull_connected(&mut self, clock: &mut impl Clock) -> Result<bool, ClientError> {
        self.pull_state(clock).map(PrinterState::is_connected)
    }

    /// "Raw" verbosity: the service's state string, untouched.
    pub fn pull_state_raw(&mut self, clock: &mut impl Clock) -> Result<String, ClientError> {
        self.pull_with_retry(clock, "state", |t| t.connection_state())
    }

    /// Single unretried probe; used by the startup gate, where the service is
    /// expected to still be booting.
    pub fn pull_state_once(&mut self) -> Option<String> {
        self.transport.connection_state().ok()
    }

    pub fn pull_target(&mut self, clock: &mut impl Clock) -> Result<f32, ClientError> {
        self.pull_with_retry(clock, "target", |t| t.tool_target())
    }

    pub fn pull_job(&mut self, clock: &mut impl Clock) -> Result<JobState, ClientError> {
        self.pull_with_retry(clock, "job", |t| t.job_state())
            .map(|raw| JobState::from_raw(&raw))
    }

    /// Fire-and-forget POST. Transport failures are logged and swallowed;
    /// the caller sees the effect (or its absence) on the next pull.
    pub fn push(&mut self, command: &PushCommand) {
        if let Err(err) = self.transport.post(command) {
            log::warn!("push {} failed: {}", command.name(), err);
        }
    }

    /// Issue connect commands until the printer reports a live state, up to
    /// [`CONNECT_ATTEMPTS`] rounds. Blinks the connection LED on each failed
    /// round and leaves it lit on success. Returns whether the printer
    /// connected.
    pub fn connect(&mut self, panel: &mut impl Panel, clock: &mut impl Clock) -> bool {
        for attempt in 1..=CONNECT_ATTEMPTS {
            self.push(&PushCommand::Connect);
            clock.sleep_ms(CONNECT_SETTLE_MS);
            if matches!(self.pull_connected(clock), Ok(true)) {
                panel.set(OutputLine::ConnectionLed, true);
                log::info!("printer connected after {attempt} attempt(s)");
                return true;
            }
            panel.set(OutputLine::ConnectionLed, true);
            clock.sleep_ms(CONNECT_BLINK_MS);
            panel.set(OutputLine::ConnectionLed, false);
        }
        log::warn!("connect: retry budget exhausted");
        false
    }
}
