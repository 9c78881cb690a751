//! Printer and job state model.
//!
//! The control service reports connection state as a free-form string
//! ("Operational", "Printing from SD", "Error: …"). Everything outside the
//! three states the panel cares about collapses to [`PrinterState::Disconnected`];
//! callers that need the raw string use `pull_state_raw`. An unreachable
//! service is an `Err` from the client, never a state.

/// Connection state of the printer as seen by the control service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterState {
    Disconnected,
    Operational,
    Printing,
    Paused,
}

impl PrinterState {
    /// Map a raw connection-state string onto the panel's state model.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Operational" => Self::Operational,
            "Printing" => Self::Printing,
            "Paused" => Self::Paused,
            _ => Self::Disconnected,
        }
    }

    /// "Basic" verbosity: connected iff the printer is in a live state.
    pub fn is_connected(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

/// State of the current print job (GET /api/job).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Printing,
    Paused,
    /// Anything the pause button has no action for.
    Other,
}

impl JobState {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Printing" => Self::Printing,
            "Paused" => Self::Paused,
            _ => Self::Other,
        }
    }
}
