//! One-shot cues published to observers

use serde::Serialize;
use sprout_api::Url;

use crate::emotion::Mood;
use crate::quest::{BonusPhase, Quest};

/// User-initiated action that talks to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    Water,
    Capture,
}

/// A failed action, kept for display until the action is tried again
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    pub action: ActionKind,
    pub message: String,
}

/// Something observers may want to react to once (sound, animation, toast)
#[derive(Debug, Clone, PartialEq)]
pub enum PlantEvent {
    MoodChanged { from: Mood, to: Mood },
    /// Water reached the soil; play the drop animation and sound
    WaterDropCue,
    QuestCompleted(Quest),
    /// `None` once the sequence has finished
    BonusPhaseChanged(Option<BonusPhase>),
    PhotoCaptured(Url),
    CooldownFinished,
    ActionFailed(ActionFailure),
}
