//! # sprout-state
//!
//! Reconciliation engine for a plant-care client.
//!
//! The device is polled for a loosely typed status sample; this crate turns
//! the stream of samples and the user's actions into a small set of
//! discrete signals: a [`Mood`], a watering cooldown, three daily quest
//! hearts with a one-shot bonus sequence, and a capture lock.
//!
//! The engine owns no clock and no runtime. Every transition on
//! [`PlantState`] takes the current instant and returns an [`Outcome`]
//! listing the timers to (re)schedule and the [`PlantEvent`]s to publish.
//! `sprout-sdk` drives it on tokio; tests drive it by hand.
//!
//! ```rust
//! use std::time::Instant;
//! use sprout_api::DeviceStatus;
//! use sprout_state::{Mood, PlantState, TimerPurpose};
//!
//! let mut state = PlantState::default();
//! let now = Instant::now();
//!
//! let sample = |touch| DeviceStatus {
//!     soil_is_dry: Some(true),
//!     touch_active: Some(touch),
//!     ..Default::default()
//! };
//!
//! state.apply_status(&sample(false), now);
//! let out = state.apply_status(&sample(true), now);
//!
//! assert_eq!(state.mood(), Mood::Happy);
//! assert!(out.schedules(TimerPurpose::MoodRevert));
//! ```

pub mod camera;
pub mod cooldown;
pub mod edge;
pub mod emotion;
pub mod event;
pub mod light;
pub mod logging;
pub mod outcome;
pub mod quest;
pub mod state;

pub use camera::{Camera, CameraState};
pub use cooldown::CooldownTimer;
pub use edge::{Edge, EdgeMemory};
pub use emotion::{EmotionConfig, EmotionStateMachine, Mood};
pub use event::{ActionFailure, ActionKind, PlantEvent};
pub use light::LightLevel;
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use outcome::{Outcome, TimerPurpose, TimerRequest};
pub use quest::{BonusPhase, BonusTiming, DailyQuestTracker, HeartState, Quest};
pub use state::{
    ActionRefused, PlantSnapshot, PlantState, Sensors, DEFAULT_WATERING_COOLDOWN_SECS,
};
