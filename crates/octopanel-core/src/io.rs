//! Hardware facade traits.
//!
//! The control logic never touches pins directly; it talks to a [`Panel`]
//! (digital lines plus the piezo speaker) and a [`Clock`]. The daemon binds
//! these to rppal GPIO and `thread::sleep`; tests bind them to the mocks in
//! [`crate::testkit`].

use std::time::Duration;

/// Output lines driven by the panel. Relays are physically latched and can be
/// read back through [`Panel::get`]; the line itself is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLine {
    /// Mains relay for the printer power supply.
    PrinterRelay,
    /// Mains relay for the enclosure fan.
    FanRelay,
    /// Lit while the printer relay is on.
    PowerLed,
    /// Lit while the printer is connected to the control service.
    ConnectionLed,
    /// Lit (blinking) while a print is paused or filament has run out.
    PauseLed,
}

/// Input lines read by the panel. `true` means "active": a pressed button or
/// a tripped filament sensor. Electrical polarity is the adapter's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputLine {
    PowerButton,
    HomeButton,
    HeatButton,
    ExtrudeButton,
    PauseButton,
    FilamentSensor,
}

/// Digital I/O and tone generation, injected into both loops.
pub trait Panel {
    /// Read an input line. `true` = active.
    fn read(&mut self, line: InputLine) -> bool;

    /// Drive an output line. `true` = on.
    fn set(&mut self, line: OutputLine, on: bool);

    /// Read back the latched state of an output line.
    fn get(&mut self, line: OutputLine) -> bool;

    /// Play a square wave on the speaker, blocking for `sustain_ms`.
    fn tone(&mut self, freq_hz: u32, duty_pct: u8, sustain_ms: u64);
}

/// Time source for retry delays, debounce dwell, and countdowns.
pub trait Clock {
    fn sleep_ms(&mut self, ms: u64);
}

/// Wall-clock [`Clock`] backed by `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
