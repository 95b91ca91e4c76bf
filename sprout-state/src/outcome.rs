//! Side effects requested by state transitions
//!
//! The engine never touches a clock or a runtime. Every transition returns
//! an [`Outcome`]: timers to (re)schedule or cancel, and events to publish.
//! The session turns timer requests into cancellable delayed tasks, one per
//! [`TimerPurpose`]; scheduling a purpose that is already pending replaces it.

use std::time::Duration;

use crate::event::PlantEvent;

/// Logical purpose of a delayed task; at most one is pending per purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// End of the happy window opened by a touch
    MoodRevert,
    /// End of the watering cue (water drops + happy)
    WateringWindow,
    /// Next one-second step of the watering cooldown
    CooldownTick,
    /// Next phase of the bonus sequence
    BonusPhase,
}

impl TimerPurpose {
    pub const ALL: [TimerPurpose; 4] = [
        TimerPurpose::MoodRevert,
        TimerPurpose::WateringWindow,
        TimerPurpose::CooldownTick,
        TimerPurpose::BonusPhase,
    ];
}

/// A request to the timer layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Fire `purpose` after `after`, replacing any pending timer for it
    Schedule { purpose: TimerPurpose, after: Duration },
    /// Drop the pending timer for `purpose`, if any
    Cancel(TimerPurpose),
}

/// Timers and events produced by one transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub timers: Vec<TimerRequest>,
    pub events: Vec<PlantEvent>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, purpose: TimerPurpose, after: Duration) {
        self.timers.push(TimerRequest::Schedule { purpose, after });
    }

    pub fn cancel(&mut self, purpose: TimerPurpose) {
        self.timers.push(TimerRequest::Cancel(purpose));
    }

    pub fn emit(&mut self, event: PlantEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty() && self.events.is_empty()
    }

    /// Last request made for `purpose` in this outcome
    pub fn timer_for(&self, purpose: TimerPurpose) -> Option<TimerRequest> {
        self.timers.iter().rev().copied().find(|request| match request {
            TimerRequest::Schedule { purpose: p, .. } | TimerRequest::Cancel(p) => *p == purpose,
        })
    }

    /// Whether `purpose` ends up scheduled by this outcome
    pub fn schedules(&self, purpose: TimerPurpose) -> bool {
        matches!(self.timer_for(purpose), Some(TimerRequest::Schedule { .. }))
    }
}
