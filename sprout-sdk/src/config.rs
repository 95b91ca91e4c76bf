//! Configuration for a plant session
//!
//! Every tuned constant the session relies on lives here so front-ends can
//! adjust pacing without touching the engine.

use std::time::Duration;

use sprout_state::{BonusTiming, EmotionConfig, DEFAULT_WATERING_COOLDOWN_SECS};

use crate::SdkError;

/// Configuration for a [`crate::PlantSession`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between status polls
    /// Default: 800 milliseconds
    pub poll_interval: Duration,

    /// Pump run time requested per watering action
    /// Default: 2 seconds
    pub water_duration: Duration,

    /// Local cooldown after the device accepts or refuses watering
    /// Default: 60 seconds
    pub watering_cooldown_secs: u32,

    /// Capacity of the event broadcast channel
    /// Default: 64
    pub event_buffer_size: usize,

    /// Mood windows and bonus phase durations
    pub emotion: EmotionConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(800),
            water_duration: Duration::from_secs(2),
            watering_cooldown_secs: DEFAULT_WATERING_COOLDOWN_SECS,
            event_buffer_size: 64,
            emotion: EmotionConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a SessionConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortened windows for demos and kiosk screens
    pub fn quick() -> Self {
        Self {
            watering_cooldown_secs: 10,
            emotion: EmotionConfig {
                watering_window: Duration::from_secs(3),
                idle_debounce: Duration::from_secs(2),
                bonus: BonusTiming {
                    flying_in: Duration::from_secs(1),
                    staying: Duration::from_secs(1),
                    leaving: Duration::from_millis(500),
                },
                ..EmotionConfig::default()
            },
            ..Default::default()
        }
    }

    /// Slower polling for battery-powered displays
    pub fn low_power() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            event_buffer_size: 16,
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.poll_interval.is_zero() {
            return Err(SdkError::Config(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.water_duration.is_zero() {
            return Err(SdkError::Config(
                "Water duration must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(SdkError::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        let windows = [
            ("touch window", self.emotion.touch_window),
            ("watering window", self.emotion.watering_window),
            ("bonus flying-in phase", self.emotion.bonus.flying_in),
            ("bonus staying phase", self.emotion.bonus.staying),
            ("bonus leaving phase", self.emotion.bonus.leaving),
        ];
        for (name, window) in windows {
            if window.is_zero() {
                return Err(SdkError::Config(format!("The {name} must be greater than 0")));
            }
        }

        Ok(())
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_water_duration(mut self, duration: Duration) -> Self {
        self.water_duration = duration;
        self
    }

    pub fn with_watering_cooldown(mut self, seconds: u32) -> Self {
        self.watering_cooldown_secs = seconds;
        self
    }

    pub fn with_emotion(mut self, emotion: EmotionConfig) -> Self {
        self.emotion = emotion;
        self
    }
}
