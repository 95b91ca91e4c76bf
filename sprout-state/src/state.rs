//! The single owner of all session state
//!
//! [`PlantState`] is mutated from three independent timelines: poll results,
//! user actions (with their network responses) and timer expirations. Every
//! entry point takes the current instant and returns an [`Outcome`]; the
//! caller serialises access, so each call is atomic with respect to the
//! others and the last write wins on shared values.

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use serde::Serialize;
use sprout_api::{ApiError, CapturedPhoto, DeviceStatus, WaterOutcome};
use tracing::{debug, info};

use crate::camera::{Camera, CameraState};
use crate::cooldown::CooldownTimer;
use crate::edge::{Edge, EdgeMemory};
use crate::emotion::{EmotionConfig, EmotionStateMachine, Mood};
use crate::event::{ActionFailure, ActionKind, PlantEvent};
use crate::light::LightLevel;
use crate::outcome::{Outcome, TimerPurpose};
use crate::quest::{BonusPhase, DailyQuestTracker, HeartState, Quest};

/// Default watering cooldown in seconds
pub const DEFAULT_WATERING_COOLDOWN_SECS: u32 = 60;

const COOLDOWN_STEP: Duration = Duration::from_secs(1);

/// Why an action was refused before any request was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionRefused {
    #[error("Watering is cooling down ({remaining_secs}s left)")]
    CoolingDown { remaining_secs: u32 },

    #[error("Watering already in progress")]
    WateringInFlight,

    #[error("Camera is busy")]
    CameraBusy,
}

/// Latest known sensor readings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sensors {
    pub soil_is_dry: bool,
    pub env_humidity_pct: Option<f64>,
    pub temperature_c: Option<f64>,
    pub light_lux: Option<f64>,
    pub light_level: LightLevel,
    pub touch_active: bool,
    pub daily_elapsed_sec: Option<f64>,
    pub last_watered_at: Option<NaiveDateTime>,
}

impl Sensors {
    /// Copy over every field the sample carries
    fn merge(&mut self, status: &DeviceStatus) {
        if let Some(dry) = status.soil_is_dry {
            self.soil_is_dry = dry;
        }
        if let Some(humidity) = status.env_humidity_pct {
            self.env_humidity_pct = Some(humidity);
        }
        if let Some(temperature) = status.temperature_c {
            self.temperature_c = Some(temperature);
        }
        if let Some(lux) = status.light_lux {
            self.light_lux = Some(lux);
            self.light_level = LightLevel::from_lux(lux);
        }
        if let Some(touch) = status.touch_active {
            self.touch_active = touch;
        }
        if let Some(daily) = status.daily_elapsed_sec {
            self.daily_elapsed_sec = Some(daily);
        }
        if let Some(at) = status.last_watered_at {
            self.last_watered_at = Some(at);
        }
    }
}

/// Read-only view of the state, published after every change
#[derive(Debug, Clone, PartialEq)]
pub struct PlantSnapshot {
    pub mood: Mood,
    pub sensors: Sensors,
    pub cooldown_remaining_secs: u32,
    pub watering_in_flight: bool,
    pub water_cue_active: bool,
    pub hearts: HeartState,
    pub bonus_triggered_today: bool,
    pub bonus_phase: Option<BonusPhase>,
    pub bonus_available: bool,
    pub camera: CameraState,
    pub last_photo: Option<CapturedPhoto>,
    pub last_failure: Option<ActionFailure>,
}

impl PlantSnapshot {
    /// A watering request would be sent right now
    pub fn can_water(&self) -> bool {
        self.cooldown_remaining_secs == 0 && !self.watering_in_flight && !self.water_cue_active
    }
}

/// All state for one session
#[derive(Debug, Clone)]
pub struct PlantState {
    sensors: Sensors,
    touch_memory: EdgeMemory,
    soil_memory: EdgeMemory,
    emotion: EmotionStateMachine,
    cooldown: CooldownTimer,
    cooldown_secs: u32,
    quests: DailyQuestTracker,
    camera: Camera,
    watering_in_flight: bool,
    mood_before_watering: Mood,
    last_failure: Option<ActionFailure>,
}

impl PlantState {
    pub fn new(emotion: EmotionConfig, cooldown_secs: u32) -> Self {
        Self {
            sensors: Sensors::default(),
            touch_memory: EdgeMemory::new(),
            soil_memory: EdgeMemory::new(),
            emotion: EmotionStateMachine::new(emotion),
            cooldown: CooldownTimer::new(),
            cooldown_secs,
            quests: DailyQuestTracker::new(),
            camera: Camera::new(),
            watering_in_flight: false,
            mood_before_watering: Mood::default(),
            last_failure: None,
        }
    }

    pub fn mood(&self) -> Mood {
        self.emotion.mood()
    }

    pub fn sensors(&self) -> &Sensors {
        &self.sensors
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown.remaining()
    }

    pub fn hearts(&self) -> HeartState {
        self.quests.hearts()
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera.state()
    }

    pub fn bonus_phase(&self) -> Option<BonusPhase> {
        self.quests.phase()
    }

    pub fn last_failure(&self) -> Option<&ActionFailure> {
        self.last_failure.as_ref()
    }

    pub fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot {
            mood: self.emotion.mood(),
            sensors: self.sensors.clone(),
            cooldown_remaining_secs: self.cooldown.remaining(),
            watering_in_flight: self.watering_in_flight,
            water_cue_active: self.emotion.water_cue_active(),
            hearts: self.quests.hearts(),
            bonus_triggered_today: self.quests.triggered_today(),
            bonus_phase: self.quests.phase(),
            bonus_available: self.quests.bonus_available(),
            camera: self.camera.state(),
            last_photo: self.camera.last_photo().cloned(),
            last_failure: self.last_failure.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Polling
    // ------------------------------------------------------------------

    /// Reconcile with one decoded status sample
    ///
    /// A signal missing from the sample is not evaluated for edges and keeps
    /// its edge memory, so the next sample that carries it compares against
    /// the last value actually seen.
    pub fn apply_status(&mut self, status: &DeviceStatus, now: Instant) -> Outcome {
        let mut out = Outcome::new();

        let touch = status
            .touch_active
            .map_or(Edge::NONE, |t| self.touch_memory.observe(t));
        let soil = status
            .soil_is_dry
            .map_or(Edge::NONE, |d| self.soil_memory.observe(d));

        self.sensors.merge(status);

        if touch.rising {
            debug!("Touch pad pressed on device");
            self.touched(now, &mut out);
        }

        if soil.falling {
            info!("Soil turned wet, watering confirmed by device");
            self.complete(Quest::Watered, &mut out);
            self.emotion.start_water_cue(now, &mut out);
            self.emotion.open_water_window(&mut out);
        }

        // only the two rule edges pre-empt decay; releases and drying do not
        if !touch.rising && !soil.falling {
            let held = self.sensors.touch_active || self.action_pending();
            self.emotion
                .idle_decay(self.sensors.soil_is_dry, held, now, &mut out);
        }

        out
    }

    fn action_pending(&self) -> bool {
        self.watering_in_flight || self.camera.state() == CameraState::Busy
    }

    // ------------------------------------------------------------------
    // Touch
    // ------------------------------------------------------------------

    /// Local touch; never waits for the device
    pub fn touch(&mut self, now: Instant) -> Outcome {
        let mut out = Outcome::new();
        self.touched(now, &mut out);
        out
    }

    fn touched(&mut self, now: Instant, out: &mut Outcome) {
        self.emotion.on_touch(now, out);
        self.complete(Quest::Touched, out);
    }

    // ------------------------------------------------------------------
    // Watering
    // ------------------------------------------------------------------

    /// Check the watering gate and show the optimistic cue
    pub fn begin_watering(&mut self, now: Instant) -> Result<Outcome, ActionRefused> {
        if !self.cooldown.is_ready() {
            return Err(ActionRefused::CoolingDown {
                remaining_secs: self.cooldown.remaining(),
            });
        }
        if self.watering_in_flight || self.emotion.water_cue_active() {
            return Err(ActionRefused::WateringInFlight);
        }

        self.watering_in_flight = true;
        self.mood_before_watering = self.emotion.mood();
        self.clear_failure(ActionKind::Water);

        let mut out = Outcome::new();
        self.emotion.start_water_cue(now, &mut out);
        Ok(out)
    }

    /// Apply the response to a request started with [`begin_watering`]
    ///
    /// [`begin_watering`]: PlantState::begin_watering
    pub fn finish_watering(
        &mut self,
        result: &Result<WaterOutcome, ApiError>,
        now: Instant,
    ) -> Outcome {
        let mut out = Outcome::new();
        self.watering_in_flight = false;

        match result {
            Ok(WaterOutcome::Accepted(receipt)) => {
                info!("Watering accepted");
                if let Some(daily) = receipt.daily_elapsed_sec {
                    self.sensors.daily_elapsed_sec = Some(daily);
                }
                self.complete(Quest::Watered, &mut out);
                self.start_cooldown(&mut out);
                self.emotion.start_water_cue(now, &mut out);
                self.emotion.open_water_window(&mut out);
            }
            Ok(WaterOutcome::CoolingDown) => {
                info!("Watering refused, device is cooling down");
                self.start_cooldown(&mut out);
                self.emotion.withdraw_water_cue(
                    self.mood_before_watering,
                    self.sensors.soil_is_dry,
                    now,
                    &mut out,
                );
            }
            Err(error) => {
                self.emotion.withdraw_water_cue(
                    self.mood_before_watering,
                    self.sensors.soil_is_dry,
                    now,
                    &mut out,
                );
                self.fail(ActionKind::Water, error, &mut out);
            }
        }

        out
    }

    fn start_cooldown(&mut self, out: &mut Outcome) {
        if self.cooldown_secs == 0 {
            return;
        }
        self.cooldown.start(self.cooldown_secs);
        out.schedule(TimerPurpose::CooldownTick, COOLDOWN_STEP);
    }

    // ------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------

    /// Take the camera lock
    pub fn begin_capture(&mut self) -> Result<(), ActionRefused> {
        if !self.camera.try_begin() {
            return Err(ActionRefused::CameraBusy);
        }
        self.clear_failure(ActionKind::Capture);
        Ok(())
    }

    /// Apply the response to a request started with [`begin_capture`]
    ///
    /// [`begin_capture`]: PlantState::begin_capture
    pub fn finish_capture(&mut self, result: &Result<CapturedPhoto, ApiError>) -> Outcome {
        let mut out = Outcome::new();

        match result {
            Ok(photo) => {
                info!("Photo captured: {}", photo.url);
                out.emit(PlantEvent::PhotoCaptured(photo.url.clone()));
                self.camera.finish_success(photo.clone());
                self.complete(Quest::PhotoTaken, &mut out);
            }
            Err(error) => {
                self.camera.finish_failure();
                self.fail(ActionKind::Capture, error, &mut out);
            }
        }

        out
    }

    // ------------------------------------------------------------------
    // Bonus
    // ------------------------------------------------------------------

    /// Start the bonus sequence; `None` when it is not available
    pub fn start_bonus(&mut self, now: Instant) -> Option<Outcome> {
        let phase = self.quests.try_start()?;
        info!("Bonus sequence started");

        let mut out = Outcome::new();
        out.emit(PlantEvent::BonusPhaseChanged(Some(phase)));
        self.emotion.start_celebration(now, &mut out);
        out.schedule(
            TimerPurpose::BonusPhase,
            self.emotion.config().bonus.duration(phase),
        );
        Some(out)
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// A timer scheduled through an earlier outcome fired
    pub fn on_timer(&mut self, purpose: TimerPurpose, now: Instant) -> Outcome {
        let mut out = Outcome::new();
        let soil_is_dry = self.sensors.soil_is_dry;

        match purpose {
            TimerPurpose::MoodRevert => {
                self.emotion
                    .on_touch_window_elapsed(soil_is_dry, now, &mut out);
            }
            TimerPurpose::WateringWindow => {
                self.emotion
                    .on_water_window_elapsed(soil_is_dry, now, &mut out);
            }
            TimerPurpose::CooldownTick => {
                if !self.cooldown.is_ready() {
                    if self.cooldown.tick() == 0 {
                        debug!("Watering cooldown finished");
                        out.emit(PlantEvent::CooldownFinished);
                    } else {
                        out.schedule(TimerPurpose::CooldownTick, COOLDOWN_STEP);
                    }
                }
            }
            TimerPurpose::BonusPhase => {
                if self.quests.is_active() {
                    let next = self.quests.advance();
                    out.emit(PlantEvent::BonusPhaseChanged(next));
                    match next {
                        Some(phase) => out.schedule(
                            TimerPurpose::BonusPhase,
                            self.emotion.config().bonus.duration(phase),
                        ),
                        None => {
                            info!("Bonus sequence finished");
                            self.emotion.end_celebration(soil_is_dry, now, &mut out);
                        }
                    }
                }
            }
        }

        out
    }

    /// Stop everything time-driven: cancels every timer, clears the
    /// cooldown and drops running windows. Hearts, latch and mood are kept.
    pub fn teardown(&mut self) -> Outcome {
        let mut out = Outcome::new();
        for purpose in TimerPurpose::ALL {
            out.cancel(purpose);
        }
        self.cooldown.clear();
        self.quests.abort();
        self.emotion.reset_windows();
        out
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn complete(&mut self, quest: Quest, out: &mut Outcome) {
        if self.quests.complete(quest) {
            info!("Daily quest completed: {:?}", quest);
            out.emit(PlantEvent::QuestCompleted(quest));
        }
    }

    fn fail(&mut self, action: ActionKind, error: &ApiError, out: &mut Outcome) {
        tracing::warn!("{:?} failed: {}", action, error);
        let failure = ActionFailure {
            action,
            message: error.to_string(),
        };
        self.last_failure = Some(failure.clone());
        out.emit(PlantEvent::ActionFailed(failure));
    }

    fn clear_failure(&mut self, action: ActionKind) {
        if self.last_failure.as_ref().map(|f| f.action) == Some(action) {
            self.last_failure = None;
        }
    }
}

impl Default for PlantState {
    fn default() -> Self {
        Self::new(EmotionConfig::default(), DEFAULT_WATERING_COOLDOWN_SECS)
    }
}
