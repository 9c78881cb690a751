//! Panel hardware on the Pi GPIO header.
//!
//! Relay channels are active-low, so their lines start high (relay open).
//! Buttons short to ground through the internal pull-ups; the filament
//! sensor is active-high. The speaker runs on software PWM, which is plenty
//! for short cue tones.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin};

use octopanel_core::{InputLine, OutputLine, Panel};

/// BCM pin assignments for the panel board.
pub mod pins {
    pub const PRINTER_RELAY: u8 = 5;
    pub const FAN_RELAY: u8 = 6;
    pub const SPEAKER: u8 = 12;
    pub const POWER_LED: u8 = 9;
    pub const CONNECTION_LED: u8 = 24;
    pub const PAUSE_LED: u8 = 22;
    pub const POWER_BUTTON: u8 = 25;
    pub const HOME_BUTTON: u8 = 4;
    pub const HEAT_BUTTON: u8 = 23;
    pub const EXTRUDE_BUTTON: u8 = 17;
    pub const PAUSE_BUTTON: u8 = 27;
    pub const FILAMENT_SENSOR: u8 = 21;
}

pub struct GpioPanel {
    printer_relay: OutputPin,
    fan_relay: OutputPin,
    power_led: OutputPin,
    connection_led: OutputPin,
    pause_led: OutputPin,
    speaker: OutputPin,
    power_button: InputPin,
    home_button: InputPin,
    heat_button: InputPin,
    extrude_button: InputPin,
    pause_button: InputPin,
    filament_sensor: InputPin,
}

impl GpioPanel {
    pub fn new() -> rppal::gpio::Result<Self> {
        let gpio = Gpio::new()?;
        Ok(Self {
            // Active-low relays: start high so both channels stay open.
            printer_relay: gpio.get(pins::PRINTER_RELAY)?.into_output_high(),
            fan_relay: gpio.get(pins::FAN_RELAY)?.into_output_high(),
            power_led: gpio.get(pins::POWER_LED)?.into_output_low(),
            connection_led: gpio.get(pins::CONNECTION_LED)?.into_output_low(),
            pause_led: gpio.get(pins::PAUSE_LED)?.into_output_low(),
            speaker: gpio.get(pins::SPEAKER)?.into_output_low(),
            power_button: gpio.get(pins::POWER_BUTTON)?.into_input_pullup(),
            home_button: gpio.get(pins::HOME_BUTTON)?.into_input_pullup(),
            heat_button: gpio.get(pins::HEAT_BUTTON)?.into_input_pullup(),
            extrude_button: gpio.get(pins::EXTRUDE_BUTTON)?.into_input_pullup(),
            pause_button: gpio.get(pins::PAUSE_BUTTON)?.into_input_pullup(),
            filament_sensor: gpio.get(pins::FILAMENT_SENSOR)?.into_input_pullup(),
        })
    }

    fn output_pin(&mut self, line: OutputLine) -> &mut OutputPin {
        match line {
            OutputLine::PrinterRelay => &mut self.printer_relay,
            OutputLine::FanRelay => &mut self.fan_relay,
            OutputLine::PowerLed => &mut self.power_led,
            OutputLine::ConnectionLed => &mut self.connection_led,
            OutputLine::PauseLed => &mut self.pause_led,
        }
    }

    fn active_low(line: OutputLine) -> bool {
        matches!(line, OutputLine::PrinterRelay | OutputLine::FanRelay)
    }
}

impl Panel for GpioPanel {
    fn read(&mut self, line: InputLine) -> bool {
        match line {
            // Buttons pull to ground when pressed.
            InputLine::PowerButton => self.power_button.is_low(),
            InputLine::HomeButton => self.home_button.is_low(),
            InputLine::HeatButton => self.heat_button.is_low(),
            InputLine::ExtrudeButton => self.extrude_button.is_low(),
            InputLine::PauseButton => self.pause_button.is_low(),
            InputLine::FilamentSensor => self.filament_sensor.is_high(),
        }
    }

    fn set(&mut self, line: OutputLine, on: bool) {
        let level_high = on != Self::active_low(line);
        let pin = self.output_pin(line);
        if level_high {
            pin.set_high();
        } else {
            pin.set_low();
        }
    }

    fn get(&mut self, line: OutputLine) -> bool {
        let active_low = Self::active_low(line);
        let pin = self.output_pin(line);
        pin.is_set_high() != active_low
    }

    fn tone(&mut self, freq_hz: u32, duty_pct: u8, sustain_ms: u64) {
        let duty = f64::from(duty_pct.min(100)) / 100.0;
        if let Err(err) = self.speaker.set_pwm_frequency(f64::from(freq_hz), duty) {
            log::warn!("speaker pwm failed: {err}");
            return;
        }
        thread::sleep(Duration::from_millis(sustain_ms));
        if let Err(err) = self.speaker.clear_pwm() {
            log::warn!("speaker pwm stop failed: {err}");
        }
        self.speaker.set_low();
    }
}

/// Panel handle shared between the input and monitor threads. Lock scope is
/// a single `Panel` call, so neither loop can starve the other for longer
/// than one GPIO operation plus a tone.
#[derive(Clone)]
pub struct SharedPanel(Arc<Mutex<GpioPanel>>);

impl SharedPanel {
    pub fn new(panel: GpioPanel) -> Self {
        Self(Arc::new(Mutex::new(panel)))
    }

    fn with<R>(&self, f: impl FnOnce(&mut GpioPanel) -> R) -> R {
        // A poisoned lock only means another thread panicked mid-call; the
        // pin state is still coherent, so keep going and let the supervisor
        // handle the fault.
        let mut guard = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl Panel for SharedPanel {
    fn read(&mut self, line: InputLine) -> bool {
        self.with(|p| p.read(line))
    }

    fn set(&mut self, line: OutputLine, on: bool) {
        self.with(|p| p.set(line, on))
    }

    fn get(&mut self, line: OutputLine) -> bool {
        self.with(|p| p.get(line))
    }

    fn tone(&mut self, freq_hz: u32, duty_pct: u8, sustain_ms: u64) {
        self.with(|p| p.tone(freq_hz, duty_pct, sustain_ms))
    }
}
