// Combinable behavior flags for the particle cloud.
//
// `expanded`, `attracted` and the wave are independent flags, not one mode.
// The setters enforce the only coupling: turning expansion on clears
// attraction and vice versa, and retargeting clears both.

/// Wave and flag state, stepped by the particle engine once per update.
#[derive(Debug, Clone, PartialEq)]
pub struct Behavior {
    target: &'static str,
    expanded: bool,
    attracted: bool,
    waving: bool,
    phase: f32,
    /// Duration of a wave triggered since the last `advance_clock`. The
    /// deadline is anchored on the next clock value, not a stale one.
    pending_wave: Option<f32>,
    /// Clock value at which the current wave ends. Replaced by every trigger,
    /// so an older trigger can never end a newer wave.
    wave_ends_at: Option<f32>,
}

impl Behavior {
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            expanded: false,
            attracted: false,
            waving: false,
            phase: 0.0,
            pending_wave: None,
            wave_ends_at: None,
        }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn attracted(&self) -> bool {
        self.attracted
    }

    pub fn waving(&self) -> bool {
        self.waving
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Switch template. Callers validate the name first.
    pub fn retarget(&mut self, target: &'static str) {
        self.target = target;
        self.expanded = false;
        self.attracted = false;
    }

    pub fn set_expanded(&mut self, state: bool) {
        self.expanded = state;
        if state {
            self.attracted = false;
        }
    }

    pub fn set_attract(&mut self, state: bool) {
        self.attracted = state;
        if state {
            self.expanded = false;
        }
    }

    /// Start (or restart) a wave lasting `duration` seconds from the next clock value.
    pub fn trigger_wave(&mut self, duration: f32) {
        self.waving = true;
        self.phase = 0.0;
        self.pending_wave = Some(duration);
        self.wave_ends_at = None;
    }

    /// Record the frame clock and end the wave if its deadline has passed.
    pub fn advance_clock(&mut self, time: f32) {
        if let Some(duration) = self.pending_wave.take() {
            self.wave_ends_at = Some(time + duration);
        }
        if let Some(end) = self.wave_ends_at {
            if time >= end {
                self.waving = false;
                self.wave_ends_at = None;
            }
        }
    }

    /// Advance the wave phase by one update's worth. No-op when not waving.
    pub fn step_wave(&mut self, phase_step: f32) {
        if self.waving {
            self.phase += phase_step;
        }
    }
}
