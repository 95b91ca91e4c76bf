//! Daily quests and the one-shot bonus sequence
//!
//! Three hearts (photo, water, touch) fill up over the day. Once all three
//! are full the bonus sequence may be played exactly once; the latch is set
//! the moment it starts. Nothing here is ever cleared in-process: a daily
//! reset starts a fresh session.

use std::time::Duration;

use serde::Serialize;

/// One of the three daily quests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quest {
    PhotoTaken,
    Watered,
    Touched,
}

/// Completion flags for the daily quests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeartState {
    pub photo_taken: bool,
    pub watered: bool,
    pub touched: bool,
}

impl HeartState {
    pub fn all_done(&self) -> bool {
        self.photo_taken && self.watered && self.touched
    }

    pub fn is_done(&self, quest: Quest) -> bool {
        match quest {
            Quest::PhotoTaken => self.photo_taken,
            Quest::Watered => self.watered,
            Quest::Touched => self.touched,
        }
    }

    fn flag_mut(&mut self, quest: Quest) -> &mut bool {
        match quest {
            Quest::PhotoTaken => &mut self.photo_taken,
            Quest::Watered => &mut self.watered,
            Quest::Touched => &mut self.touched,
        }
    }
}

/// Phases of the bonus sequence, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BonusPhase {
    FlyingIn,
    Staying,
    Leaving,
}

impl BonusPhase {
    /// Phase that follows this one, `None` after the last
    pub fn next(self) -> Option<BonusPhase> {
        match self {
            BonusPhase::FlyingIn => Some(BonusPhase::Staying),
            BonusPhase::Staying => Some(BonusPhase::Leaving),
            BonusPhase::Leaving => None,
        }
    }
}

/// Duration of each bonus phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusTiming {
    /// Default: 2 seconds
    pub flying_in: Duration,
    /// Default: 2 seconds
    pub staying: Duration,
    /// Default: 1 second
    pub leaving: Duration,
}

impl Default for BonusTiming {
    fn default() -> Self {
        Self {
            flying_in: Duration::from_secs(2),
            staying: Duration::from_secs(2),
            leaving: Duration::from_secs(1),
        }
    }
}

impl BonusTiming {
    pub fn duration(&self, phase: BonusPhase) -> Duration {
        match phase {
            BonusPhase::FlyingIn => self.flying_in,
            BonusPhase::Staying => self.staying,
            BonusPhase::Leaving => self.leaving,
        }
    }

    pub fn total(&self) -> Duration {
        self.flying_in + self.staying + self.leaving
    }
}

/// Hearts, the bonus latch and the running bonus phase
#[derive(Debug, Clone, Default)]
pub struct DailyQuestTracker {
    hearts: HeartState,
    triggered_today: bool,
    phase: Option<BonusPhase>,
}

impl DailyQuestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a quest done. Returns true only the first time.
    pub fn complete(&mut self, quest: Quest) -> bool {
        let flag = self.hearts.flag_mut(quest);
        let newly = !*flag;
        *flag = true;
        newly
    }

    pub fn hearts(&self) -> HeartState {
        self.hearts
    }

    pub fn triggered_today(&self) -> bool {
        self.triggered_today
    }

    pub fn phase(&self) -> Option<BonusPhase> {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    /// All hearts full, nothing playing, not yet played today
    pub fn bonus_available(&self) -> bool {
        self.hearts.all_done() && !self.is_active() && !self.triggered_today
    }

    /// Start the sequence if allowed; sets the latch before returning
    pub fn try_start(&mut self) -> Option<BonusPhase> {
        if !self.bonus_available() {
            return None;
        }
        self.triggered_today = true;
        self.phase = Some(BonusPhase::FlyingIn);
        self.phase
    }

    /// Move to the next phase. Returns the new phase, or `None` when the
    /// sequence just finished (or was not running). Hearts and latch are
    /// left untouched.
    pub fn advance(&mut self) -> Option<BonusPhase> {
        self.phase = self.phase.and_then(BonusPhase::next);
        self.phase
    }

    /// Drop a running sequence without touching hearts or latch (teardown)
    pub fn abort(&mut self) {
        self.phase = None;
    }
}
