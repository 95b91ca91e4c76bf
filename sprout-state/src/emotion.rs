//! Mood state machine
//!
//! Rules, highest priority first:
//!
//! ```text
//! 1. touch rising edge        → Happy, back to resting mood after the touch window
//! 2. soil dry → wet / watered → Happy + water cue for the watering window
//! 3. bonus sequence           → Excited until the sequence ends
//! 4. idle decay               → Thirsty/Content follow the soil once the mood
//!                               has been left alone for the debounce period
//! ```
//!
//! When a window closes the mood falls back to whatever the still-running
//! higher windows hold (Excited while the bonus plays, Happy while the water
//! cue shows), otherwise to the resting mood for the current soil.
//! Setting the mood to its current value changes nothing, including timers.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::event::PlantEvent;
use crate::outcome::{Outcome, TimerPurpose};
use crate::quest::BonusTiming;

/// Mood shown by the plant face
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Mood {
    Happy,
    Thirsty,
    Excited,
    #[default]
    Content,
}

impl Mood {
    /// Mood the plant rests in for the given soil state
    pub fn resting(soil_is_dry: bool) -> Self {
        if soil_is_dry {
            Mood::Thirsty
        } else {
            Mood::Content
        }
    }

    /// Moods held by a window; idle decay never replaces these
    pub fn is_held(self) -> bool {
        matches!(self, Mood::Happy | Mood::Excited)
    }
}

/// Tuned timing constants for the mood rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmotionConfig {
    /// Happy window after a touch
    /// Default: 1.2 seconds
    pub touch_window: Duration,

    /// Happy window and water cue after watering
    /// Default: 5 seconds
    pub watering_window: Duration,

    /// Minimum time since the last explicit mood change before idle decay
    /// may follow the soil
    /// Default: 3.5 seconds
    pub idle_debounce: Duration,

    /// Bonus sequence phases
    pub bonus: BonusTiming,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            touch_window: Duration::from_millis(1200),
            watering_window: Duration::from_secs(5),
            idle_debounce: Duration::from_millis(3500),
            bonus: BonusTiming::default(),
        }
    }
}

/// Owns the current mood and the windows that hold it
#[derive(Debug, Clone)]
pub struct EmotionStateMachine {
    config: EmotionConfig,
    mood: Mood,
    last_set_at: Option<Instant>,
    touch_window_pending: bool,
    water_cue: bool,
    water_window_pending: bool,
    celebrating: bool,
}

impl EmotionStateMachine {
    pub fn new(config: EmotionConfig) -> Self {
        Self {
            config,
            mood: Mood::default(),
            last_set_at: None,
            touch_window_pending: false,
            water_cue: false,
            water_window_pending: false,
            celebrating: false,
        }
    }

    pub fn config(&self) -> &EmotionConfig {
        &self.config
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Water drops are showing (local request in flight or window open)
    pub fn water_cue_active(&self) -> bool {
        self.water_cue
    }

    pub fn celebrating(&self) -> bool {
        self.celebrating
    }

    /// Explicitly set the mood. Returns false (and does nothing) when the
    /// mood is already `mood`.
    pub fn set(&mut self, mood: Mood, now: Instant, out: &mut Outcome) -> bool {
        if !self.replace(mood, out) {
            return false;
        }
        self.last_set_at = Some(now);
        true
    }

    fn replace(&mut self, mood: Mood, out: &mut Outcome) -> bool {
        if self.mood == mood {
            return false;
        }
        let from = std::mem::replace(&mut self.mood, mood);
        tracing::debug!("Mood {:?} -> {:?}", from, mood);
        out.emit(PlantEvent::MoodChanged { from, to: mood });
        true
    }

    /// Mood to fall back to when a window closes
    fn settled(&self, soil_is_dry: bool) -> Mood {
        if self.celebrating {
            Mood::Excited
        } else if self.water_cue {
            Mood::Happy
        } else {
            Mood::resting(soil_is_dry)
        }
    }

    // ------------------------------------------------------------------
    // Rule 1: touch
    // ------------------------------------------------------------------

    /// Touch edge or touch action
    pub fn on_touch(&mut self, now: Instant, out: &mut Outcome) {
        if self.set(Mood::Happy, now, out) {
            self.touch_window_pending = true;
            out.schedule(TimerPurpose::MoodRevert, self.config.touch_window);
        }
    }

    /// Touch window closed
    pub fn on_touch_window_elapsed(&mut self, soil_is_dry: bool, now: Instant, out: &mut Outcome) {
        self.touch_window_pending = false;
        if self.mood == Mood::Happy {
            let settled = self.settled(soil_is_dry);
            self.set(settled, now, out);
        }
    }

    // ------------------------------------------------------------------
    // Rule 2: watering
    // ------------------------------------------------------------------

    /// Show the water cue and go Happy. The window timer is opened
    /// separately so a local request can show the cue before it is confirmed.
    pub fn start_water_cue(&mut self, now: Instant, out: &mut Outcome) {
        if !self.water_cue {
            self.water_cue = true;
            out.emit(PlantEvent::WaterDropCue);
        }
        self.set(Mood::Happy, now, out);
    }

    /// Open (or restart) the watering window
    pub fn open_water_window(&mut self, out: &mut Outcome) {
        self.water_window_pending = true;
        out.schedule(TimerPurpose::WateringWindow, self.config.watering_window);
    }

    /// Watering window closed
    pub fn on_water_window_elapsed(&mut self, soil_is_dry: bool, now: Instant, out: &mut Outcome) {
        self.water_cue = false;
        self.water_window_pending = false;
        let settled = self.settled(soil_is_dry);
        self.set(settled, now, out);
    }

    /// Withdraw an optimistic water cue after the request was not applied.
    ///
    /// If the device confirmed watering in the meantime (a window is open),
    /// the cue stays. Otherwise the mood returns to `previous` unless
    /// something else already replaced the optimistic Happy. A held
    /// `previous` whose window closed while the request was in flight
    /// falls back to the settled mood instead.
    pub fn withdraw_water_cue(
        &mut self,
        previous: Mood,
        soil_is_dry: bool,
        now: Instant,
        out: &mut Outcome,
    ) {
        if self.water_window_pending {
            return;
        }
        self.water_cue = false;
        if self.mood != Mood::Happy {
            return;
        }
        let still_held = match previous {
            Mood::Happy => self.touch_window_pending,
            Mood::Excited => self.celebrating,
            _ => true,
        };
        let restore = if still_held {
            previous
        } else {
            self.settled(soil_is_dry)
        };
        self.set(restore, now, out);
    }

    // ------------------------------------------------------------------
    // Rule 3: bonus sequence
    // ------------------------------------------------------------------

    pub fn start_celebration(&mut self, now: Instant, out: &mut Outcome) {
        self.celebrating = true;
        self.set(Mood::Excited, now, out);
    }

    pub fn end_celebration(&mut self, soil_is_dry: bool, now: Instant, out: &mut Outcome) {
        self.celebrating = false;
        let settled = self.settled(soil_is_dry);
        self.set(settled, now, out);
    }

    // ------------------------------------------------------------------
    // Rule 4: idle decay
    // ------------------------------------------------------------------

    /// Let Thirsty/Content follow the soil. Only applies when no window is
    /// open, `held` is false (pad pressed or an action pending), and the mood
    /// has been left alone for the debounce period. Returns true if the mood
    /// changed.
    pub fn idle_decay(
        &mut self,
        soil_is_dry: bool,
        held: bool,
        now: Instant,
        out: &mut Outcome,
    ) -> bool {
        if self.water_cue || self.celebrating || held || self.mood.is_held() {
            return false;
        }

        let settled_long_enough = self.last_set_at.map_or(true, |at| {
            now.saturating_duration_since(at) >= self.config.idle_debounce
        });
        if !settled_long_enough {
            return false;
        }

        self.replace(Mood::resting(soil_is_dry), out)
    }

    /// Drop every window flag (teardown)
    pub fn reset_windows(&mut self) {
        self.touch_window_pending = false;
        self.water_cue = false;
        self.water_window_pending = false;
        self.celebrating = false;
    }
}

impl Default for EmotionStateMachine {
    fn default() -> Self {
        Self::new(EmotionConfig::default())
    }
}
