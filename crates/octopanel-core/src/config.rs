//! Runtime-tunable panel behavior.

/// User-facing knobs; defaults match the panel's shipped behavior.
#[derive(Debug, Clone, Copy)]
pub struct PanelConfig {
    /// Hotend target set by a heat-button short press when the target is 0.
    pub warmup_target_c: f32,
    /// Power everything down automatically when a print finishes.
    pub auto_shutdown: bool,
    /// Length of the auto-shutdown countdown, in one-second ticks.
    pub shutdown_countdown_ticks: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            warmup_target_c: 200.0,
            auto_shutdown: true,
            shutdown_countdown_ticks: 12,
        }
    }
}
