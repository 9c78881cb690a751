//! Audible cue patterns.
//!
//! Each cue is a short sequence of square-wave tones. The patterns match the
//! panel's established beep codes: a neutral blip, a rising pair for
//! "something good", a falling pair for "powering down", and a low growl for
//! errors.

use crate::io::{Clock, Panel};

const DUTY_PCT: u8 = 50;

struct ToneStep {
    freq_hz: u32,
    sustain_ms: u64,
    pause_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Single neutral blip.
    Beep,
    /// Rising two-tone: connected, started, resumed.
    Up,
    /// Falling two-tone: paused, powered down.
    Down,
    /// Low two-tone growl: rejected input or failed operation.
    Error,
}

impl Cue {
    fn steps(self) -> &'static [ToneStep] {
        match self {
            Cue::Beep => &[ToneStep { freq_hz: 400, sustain_ms: 70, pause_ms: 0 }],
            Cue::Up => &[
                ToneStep { freq_hz: 200, sustain_ms: 70, pause_ms: 50 },
                ToneStep { freq_hz: 460, sustain_ms: 80, pause_ms: 0 },
            ],
            Cue::Down => &[
                ToneStep { freq_hz: 460, sustain_ms: 70, pause_ms: 50 },
                ToneStep { freq_hz: 180, sustain_ms: 80, pause_ms: 0 },
            ],
            Cue::Error => &[
                ToneStep { freq_hz: 80, sustain_ms: 90, pause_ms: 50 },
                ToneStep { freq_hz: 50, sustain_ms: 90, pause_ms: 0 },
            ],
        }
    }

    /// Play the cue, blocking for its full duration.
    pub fn play<P: Panel, C: Clock>(self, panel: &mut P, clock: &mut C) {
        for step in self.steps() {
            panel.tone(step.freq_hz, DUTY_PCT, step.sustain_ms);
            if step.pause_ms > 0 {
                clock.sleep_ms(step.pause_ms);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{TestClock, TestPanel};

    #[test]
    fn cue_tone_counts() {
        assert_eq!(Cue::Beep.steps().len(), 1);
        assert_eq!(Cue::Up.steps().len(), 2);
        assert_eq!(Cue::Down.steps().len(), 2);
        assert_eq!(Cue::Error.steps().len(), 2);
    }

    #[test]
    fn error_cue_plays_low_tones() {
        let mut panel = TestPanel::new();
        let mut clock = TestClock::new();
        Cue::Error.play(&mut panel, &mut clock);
        let freqs: Vec<u32> = panel.tones.iter().map(|t| t.0).collect();
        assert_eq!(freqs, vec![80, 50]);
        assert_eq!(clock.slept_ms, vec![50]);
    }
}
