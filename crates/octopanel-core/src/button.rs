//! Per-button press state machine.
//!
//! Each physical button is sampled once per input-loop tick (50 ms). A
//! tracker counts how long the line has been held and classifies the press
//! when it ends: released before 15 ticks is a short press, anything longer
//! is a long press. The two classes are mutually exclusive — a long hold
//! never produces a short-press event on release.
//!
//! While a button is held the tracker emits [`ButtonEvent::Hold`] with the
//! running tick count, which is how the dispatcher implements the tiered
//! long-press actions (fan toggle at 15, RGB ladder at 15–20, repeated
//! forced extrude from 15 on). One-shot long actions call
//! [`ButtonTracker::latch`], which suppresses everything until the button is
//! physically released and the machine re-arms.

use crate::io::InputLine;

/// Input-loop tick period.
pub const TICK_MS: u64 = 50;

/// Hold duration, in ticks, at which a press becomes a long press (~750 ms).
pub const LONG_PRESS_TICKS: u32 = 15;

/// The five panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Power,
    Home,
    Heat,
    Extrude,
    Pause,
}

impl ButtonId {
    pub const ALL: [ButtonId; 5] = [
        ButtonId::Power,
        ButtonId::Home,
        ButtonId::Heat,
        ButtonId::Extrude,
        ButtonId::Pause,
    ];

    pub fn line(self) -> InputLine {
        match self {
            ButtonId::Power => InputLine::PowerButton,
            ButtonId::Home => InputLine::HomeButton,
            ButtonId::Heat => InputLine::HeatButton,
            ButtonId::Extrude => InputLine::ExtrudeButton,
            ButtonId::Pause => InputLine::PauseButton,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ButtonId::Power => "power",
            ButtonId::Home => "home/cancel",
            ButtonId::Heat => "heat/cool",
            ButtonId::Extrude => "extrude",
            ButtonId::Pause => "pause/resume",
        }
    }
}

/// Events a tracker hands to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Released before the long-press threshold.
    Short,
    /// Still held; carries the tick count of this press (first tick is 1).
    Hold(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackState {
    Idle,
    Held,
    /// Long action consumed; ignore the line until it releases.
    Latched,
}

#[derive(Debug)]
pub struct ButtonTracker {
    state: TrackState,
    ticks: u32,
}

impl Default for ButtonTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self { state: TrackState::Idle, ticks: 0 }
    }

    /// Feed one sample of the button line. Returns the event to dispatch, if
    /// any.
    pub fn tick(&mut self, pressed: bool) -> Option<ButtonEvent> {
        match self.state {
            TrackState::Idle => {
                if pressed {
                    self.state = TrackState::Held;
                    self.ticks = 1;
                    Some(ButtonEvent::Hold(1))
                } else {
                    None
                }
            }
            TrackState::Held => {
                if pressed {
                    self.ticks += 1;
                    Some(ButtonEvent::Hold(self.ticks))
                } else {
                    let held = self.ticks;
                    self.reset();
                    if held < LONG_PRESS_TICKS {
                        Some(ButtonEvent::Short)
                    } else {
                        None
                    }
                }
            }
            TrackState::Latched => {
                if !pressed {
                    self.reset();
                }
                None
            }
        }
    }

    /// Stop emitting events for the current press; re-arm on release.
    pub fn latch(&mut self) {
        if self.state == TrackState::Held {
            self.state = TrackState::Latched;
        }
    }

    fn reset(&mut self) {
        self.state = TrackState::Idle;
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold_for(tracker: &mut ButtonTracker, ticks: u32) -> Vec<ButtonEvent> {
        (0..ticks).filter_map(|_| tracker.tick(true)).collect()
    }

    #[test]
    fn short_press_classified_on_release() {
        let mut tracker = ButtonTracker::new();
        let events = hold_for(&mut tracker, 3);
        assert_eq!(events, vec![ButtonEvent::Hold(1), ButtonEvent::Hold(2), ButtonEvent::Hold(3)]);
        assert_eq!(tracker.tick(false), Some(ButtonEvent::Short));
    }

    #[test]
    fn release_at_threshold_is_not_short() {
        let mut tracker = ButtonTracker::new();
        let events = hold_for(&mut tracker, LONG_PRESS_TICKS);
        assert_eq!(*events.last().unwrap(), ButtonEvent::Hold(LONG_PRESS_TICKS));
        assert_eq!(tracker.tick(false), None);
    }

    #[test]
    fn release_one_tick_before_threshold_is_short() {
        let mut tracker = ButtonTracker::new();
        hold_for(&mut tracker, LONG_PRESS_TICKS - 1);
        assert_eq!(tracker.tick(false), Some(ButtonEvent::Short));
    }

    #[test]
    fn latch_suppresses_until_release() {
        let mut tracker = ButtonTracker::new();
        hold_for(&mut tracker, LONG_PRESS_TICKS);
        tracker.latch();
        assert_eq!(tracker.tick(true), None);
        assert_eq!(tracker.tick(true), None);
        // Release produces nothing, and the next press starts a fresh cycle.
        assert_eq!(tracker.tick(false), None);
        assert_eq!(tracker.tick(true), Some(ButtonEvent::Hold(1)));
    }

    #[test]
    fn idle_line_stays_silent() {
        let mut tracker = ButtonTracker::new();
        for _ in 0..10 {
            assert_eq!(tracker.tick(false), None);
        }
    }

    #[test]
    fn hold_counts_keep_increasing_past_threshold() {
        let mut tracker = ButtonTracker::new();
        let events = hold_for(&mut tracker, 22);
        assert_eq!(*events.last().unwrap(), ButtonEvent::Hold(22));
        assert_eq!(events.len(), 22);
    }
}
