//! Platform-independent control logic for an OctoPrint front panel.
//! Runs against port traits, so it tests on any host.

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

pub mod button;
pub mod client;
pub mod config;
pub mod cue;
pub mod dispatch;
pub mod gate;
pub mod io;
pub mod monitor;
pub mod shutdown;
pub mod state;
pub mod testkit;

pub use button::{ButtonEvent, ButtonId, ButtonTracker, LONG_PRESS_TICKS, TICK_MS};
pub use client::{ClientError, PrinterClient, PushCommand, Transport, TransportError};
pub use config::PanelConfig;
pub use cue::Cue;
pub use dispatch::InputLoop;
pub use io::{Clock, InputLine, OutputLine, Panel, StdClock};
pub use monitor::{Monitor, MONITOR_TICK_MS};
pub use state::{JobState, PrinterState};
