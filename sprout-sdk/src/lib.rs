//! # sprout-sdk
//!
//! Session orchestrator for the sprout plant-care client.
//!
//! A [`PlantSession`] polls the device, reconciles every sample with the
//! local interactive state (mood, cooldown, daily quests, camera lock), and
//! exposes the user actions: [`touch`](PlantSession::touch),
//! [`water`](PlantSession::water), [`capture`](PlantSession::capture) and
//! [`start_bonus`](PlantSession::start_bonus). The rendering layer observes
//! the result through [`PlantSession::watch`] (latest [`PlantSnapshot`]) and
//! [`PlantSession::subscribe`] (one-shot [`PlantEvent`]s).
//!
//! Configuration is two strings, the service base address and the access
//! key ([`ClientConfig::from_env`] reads `SPROUT_API_BASE` and
//! `SPROUT_API_KEY`). Missing values switch the networked features off
//! instead of failing.

mod config;
mod error;
mod poller;
mod session;
mod timers;

pub use config::SessionConfig;
pub use error::{ActionError, Feature, SdkError};
pub use poller::PollerStats;
pub use session::PlantSession;

// Re-export the types front-ends need without depending on the lower crates
pub use sprout_api::{CapturedPhoto, ClientConfig, PlantService, Url, WaterOutcome};
pub use sprout_state::logging;
pub use sprout_state::{
    ActionFailure, ActionKind, BonusPhase, CameraState, EmotionConfig, HeartState, LightLevel,
    Mood, PlantEvent, PlantSnapshot, Quest,
};
