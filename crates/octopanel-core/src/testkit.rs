//! Mock ports for host-side tests.
//!
//! [`TestPanel`] holds plain in-memory line levels and records every write
//! and tone; [`TestClock`] records sleeps instead of performing them, so
//! long-press tiers and countdowns run as synthetic tick sequences;
//! [`ScriptedTransport`] answers pulls from a per-call script with a
//! repeating default, and records every pushed command.

use std::collections::{HashMap, VecDeque};

use crate::client::{PushCommand, Transport, TransportError};
use crate::io::{Clock, InputLine, OutputLine, Panel};

/// In-memory panel. Inputs are levels set by the test; outputs are latched
/// and readable back, like the real relay/LED lines.
#[derive(Debug, Default)]
pub struct TestPanel {
    inputs: HashMap<InputLine, bool>,
    outputs: HashMap<OutputLine, bool>,
    /// Every `set` call in order, including writes that don't change level.
    pub writes: Vec<(OutputLine, bool)>,
    /// Every tone played: (freq_hz, duty_pct, sustain_ms).
    pub tones: Vec<(u32, u8, u64)>,
}

impl TestPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an input line level.
    pub fn set_input(&mut self, line: InputLine, active: bool) {
        self.inputs.insert(line, active);
    }

    /// Current latched level of an output line.
    pub fn output(&self, line: OutputLine) -> bool {
        self.outputs.get(&line).copied().unwrap_or(false)
    }

    /// Snapshot of all output lines, for comparing final hardware vectors.
    pub fn output_vector(&self) -> [(OutputLine, bool); 5] {
        [
            OutputLine::PrinterRelay,
            OutputLine::FanRelay,
            OutputLine::PowerLed,
            OutputLine::ConnectionLed,
            OutputLine::PauseLed,
        ]
        .map(|line| (line, self.output(line)))
    }

    /// Number of tones played so far.
    pub fn tone_count(&self) -> usize {
        self.tones.len()
    }
}

impl Panel for TestPanel {
    fn read(&mut self, line: InputLine) -> bool {
        self.inputs.get(&line).copied().unwrap_or(false)
    }

    fn set(&mut self, line: OutputLine, on: bool) {
        self.outputs.insert(line, on);
        self.writes.push((line, on));
    }

    fn get(&mut self, line: OutputLine) -> bool {
        self.output(line)
    }

    fn tone(&mut self, freq_hz: u32, duty_pct: u8, sustain_ms: u64) {
        self.tones.push((freq_hz, duty_pct, sustain_ms));
    }
}

/// Clock that records every requested sleep and returns immediately.
#[derive(Debug, Default)]
pub struct TestClock {
    pub slept_ms: Vec<u64>,
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.slept_ms.iter().sum()
    }
}

impl Clock for TestClock {
    fn sleep_ms(&mut self, ms: u64) {
        self.slept_ms.push(ms);
    }
}

/// Scripted REST transport. Each pull kind pops from its script queue and
/// falls back to the repeating default once the queue is empty.
#[derive(Debug)]
pub struct ScriptedTransport {
    pub state_script: VecDeque<Result<String, TransportError>>,
    pub default_state: Result<String, TransportError>,
    pub target_script: VecDeque<Result<f32, TransportError>>,
    pub default_target: Result<f32, TransportError>,
    pub job_script: VecDeque<Result<String, TransportError>>,
    pub default_job: Result<String, TransportError>,
    /// Every command pushed, in order.
    pub posted: Vec<PushCommand>,
    /// Make every POST fail (pushes are fire-and-forget, so callers should
    /// not notice).
    pub fail_posts: bool,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            state_script: VecDeque::new(),
            default_state: Ok("Operational".to_string()),
            target_script: VecDeque::new(),
            default_target: Ok(0.0),
            job_script: VecDeque::new(),
            default_job: Ok("Operational".to_string()),
            posted: Vec::new(),
            fail_posts: false,
        }
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose state pulls always answer `raw`.
    pub fn with_state(raw: &str) -> Self {
        let mut transport = Self::default();
        transport.default_state = Ok(raw.to_string());
        transport
    }

    /// Count of pushed commands matching `name`.
    pub fn posted_count(&self, name: &str) -> usize {
        self.posted.iter().filter(|c| c.name() == name).count()
    }
}

impl Transport for ScriptedTransport {
    fn connection_state(&mut self) -> Result<String, TransportError> {
        self.state_script
            .pop_front()
            .unwrap_or_else(|| self.default_state.clone())
    }

    fn tool_target(&mut self) -> Result<f32, TransportError> {
        self.target_script
            .pop_front()
            .unwrap_or_else(|| self.default_target.clone())
    }

    fn job_state(&mut self) -> Result<String, TransportError> {
        self.job_script
            .pop_front()
            .unwrap_or_else(|| self.default_job.clone())
    }

    fn post(&mut self, command: &PushCommand) -> Result<(), TransportError> {
        self.posted.push(command.clone());
        if self.fail_posts {
            Err(TransportError::Request("scripted post failure".into()))
        } else {
            Ok(())
        }
    }
}
