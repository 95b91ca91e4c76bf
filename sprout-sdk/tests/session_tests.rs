//! Session behaviour against an in-memory device
//!
//! All timing tests run on a paused tokio clock, so sleeps advance virtual
//! time and every poll, window and cooldown tick fires deterministically.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sprout_api::{ApiError, DeviceStatus, WaterReceipt};
use sprout_sdk::{
    ActionError, ActionKind, BonusPhase, CameraState, CapturedPhoto, ClientConfig, Feature, Mood,
    PlantEvent, PlantService, PlantSession, SdkError, SessionConfig, Url, WaterOutcome,
};
use tokio::sync::broadcast;
use tokio::time::sleep;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum WaterReply {
    Accepted,
    CoolingDown,
    Fail,
}

/// Device double: a fixed status sample plus scripted action replies
struct FakeDevice {
    soil_is_dry: AtomicBool,
    touch: AtomicBool,
    status_fails: AtomicBool,
    water_reply: Mutex<WaterReply>,
    water_delay_ms: AtomicU64,
    capture_fails: AtomicBool,
    capture_delay: Duration,
    status_calls: AtomicUsize,
    water_calls: AtomicUsize,
    capture_calls: AtomicUsize,
}

impl FakeDevice {
    fn new(soil_is_dry: bool) -> Self {
        Self {
            soil_is_dry: AtomicBool::new(soil_is_dry),
            touch: AtomicBool::new(false),
            status_fails: AtomicBool::new(false),
            water_reply: Mutex::new(WaterReply::Accepted),
            water_delay_ms: AtomicU64::new(0),
            capture_fails: AtomicBool::new(false),
            capture_delay: Duration::ZERO,
            status_calls: AtomicUsize::new(0),
            water_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
        }
    }

    fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    fn set_soil(&self, dry: bool) {
        self.soil_is_dry.store(dry, Ordering::SeqCst);
    }

    fn reply_to_water(&self, reply: WaterReply) {
        *self.water_reply.lock().unwrap() = reply;
    }

    fn delay_water(&self, delay: Duration) {
        self.water_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlantService for FakeDevice {
    async fn status(&self) -> sprout_api::Result<DeviceStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.status_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Decode("expected value at line 1 column 1".into()));
        }
        Ok(DeviceStatus {
            soil_is_dry: Some(self.soil_is_dry.load(Ordering::SeqCst)),
            env_humidity_pct: Some(48.0),
            temperature_c: Some(21.0),
            light_lux: Some(320.0),
            touch_active: Some(self.touch.load(Ordering::SeqCst)),
            ..Default::default()
        })
    }

    async fn water(&self, _duration: Duration) -> sprout_api::Result<WaterOutcome> {
        self.water_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.water_delay_ms.load(Ordering::SeqCst);
        sleep(Duration::from_millis(delay)).await;
        let reply = *self.water_reply.lock().unwrap();
        match reply {
            WaterReply::Accepted => Ok(WaterOutcome::Accepted(WaterReceipt {
                daily_elapsed_sec: Some(2.0),
                message: Some("watered".into()),
            })),
            WaterReply::CoolingDown => Ok(WaterOutcome::CoolingDown),
            WaterReply::Fail => Err(ApiError::Rejected {
                status: 500,
                code: None,
            }),
        }
    }

    async fn capture(&self) -> sprout_api::Result<CapturedPhoto> {
        let call = self.capture_calls.fetch_add(1, Ordering::SeqCst);
        sleep(self.capture_delay).await;
        if self.capture_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Network("camera timed out".into()));
        }
        Ok(CapturedPhoto {
            url: Url::parse(&format!("http://plant.local/photos/{call}.jpg")).unwrap(),
            placeholder: false,
            device_error: None,
        })
    }

    fn actions_enabled(&self) -> bool {
        true
    }

    fn preview_url(&self) -> Option<Url> {
        Url::parse("http://plant.local/camera/stream?api_key=k").ok()
    }
}

fn start(device: &Arc<FakeDevice>) -> PlantSession {
    let service: Arc<dyn PlantService> = device.clone();
    PlantSession::with_service(service, SessionConfig::default()).unwrap()
}

/// Let the first poll land
async fn settle() {
    sleep(Duration::from_millis(100)).await;
}

fn drain(events: &mut broadcast::Receiver<PlantEvent>) -> Vec<PlantEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

// ============================================================================
// Configuration and lifecycle
// ============================================================================

#[test]
fn test_session_needs_a_runtime() {
    let result = PlantSession::offline(SessionConfig::default());
    assert!(matches!(result, Err(SdkError::Runtime(_))));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = SessionConfig::default().with_poll_interval(Duration::ZERO);
    assert!(matches!(
        PlantSession::offline(config),
        Err(SdkError::Config(_))
    ));
}

#[tokio::test]
async fn test_missing_base_runs_offline() {
    let session = PlantSession::start(ClientConfig::default(), SessionConfig::default()).unwrap();

    assert!(!session.is_enabled(Feature::Polling));
    assert!(!session.is_enabled(Feature::Watering));
    assert!(!session.is_polling());
    assert!(session.poller_stats().is_none());
    assert!(session.preview_url().is_none());

    assert!(matches!(
        session.water().await,
        Err(ActionError::NotConfigured(Feature::Watering))
    ));
    assert!(matches!(
        session.capture().await,
        Err(ActionError::NotConfigured(Feature::Capture))
    ));

    // local actions keep working
    session.touch().unwrap();
    assert_eq!(session.snapshot().mood, Mood::Happy);
    assert!(session.snapshot().hearts.touched);
}

#[tokio::test]
async fn test_missing_key_polls_only() {
    let client = ClientConfig::new("http://127.0.0.1:9", "  ");
    let session = PlantSession::start(client, SessionConfig::default()).unwrap();

    assert!(session.is_enabled(Feature::Polling));
    assert!(!session.is_enabled(Feature::Watering));
    assert!(!session.is_enabled(Feature::Preview));
    assert!(matches!(
        session.water().await,
        Err(ActionError::NotConfigured(Feature::Watering))
    ));

    session.shutdown();
}

#[tokio::test]
async fn test_malformed_base_is_an_error() {
    let client = ClientConfig::new("not a url", "key");
    assert!(matches!(
        PlantSession::start(client, SessionConfig::default()),
        Err(SdkError::Api(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_leaves_nothing_running() {
    let device = Arc::new(FakeDevice::new(true));
    let session = start(&device);
    settle().await;

    session.touch().unwrap();
    session.water().await.unwrap();
    assert!(session.pending_timers() >= 3);
    assert!(session.is_polling());

    session.shutdown();
    assert!(!session.is_polling());
    assert_eq!(session.pending_timers(), 0);
    assert!(session.is_shut_down());

    let frozen = session.snapshot();
    assert_eq!(frozen.cooldown_remaining_secs, 0);
    let polls = device.status_calls.load(Ordering::SeqCst);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(session.snapshot(), frozen);
    assert_eq!(device.status_calls.load(Ordering::SeqCst), polls);

    assert!(matches!(session.touch(), Err(ActionError::Shutdown)));
    assert!(matches!(session.start_bonus(), Err(ActionError::Shutdown)));

    // idempotent
    session.shutdown();
}

// ============================================================================
// Polling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_poll_updates_sensors() {
    let device = Arc::new(FakeDevice::new(true));
    let session = start(&device);
    settle().await;

    let snapshot = session.snapshot();
    assert!(snapshot.sensors.soil_is_dry);
    assert_eq!(snapshot.sensors.env_humidity_pct, Some(48.0));
    assert_eq!(snapshot.sensors.light_level.as_u8(), 2);
    assert_eq!(snapshot.mood, Mood::Thirsty);

    sleep(Duration::from_millis(1600)).await;
    assert_eq!(device.status_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_poll_failures_are_silent() {
    let device = Arc::new(FakeDevice::new(false));
    device.status_fails.store(true, Ordering::SeqCst);
    let session = start(&device);
    let mut events = session.subscribe();

    sleep(Duration::from_secs(4)).await;

    let stats = session.poller_stats().unwrap();
    assert!(stats.failures >= 5);
    assert_eq!(stats.failures, stats.polls);
    assert!(session.snapshot().last_failure.is_none());
    assert!(drain(&mut events).is_empty());

    // recovers on the next good tick
    device.status_fails.store(false, Ordering::SeqCst);
    sleep(Duration::from_millis(800)).await;
    assert_eq!(session.poller_stats().unwrap().consecutive_failures, 0);
    assert_eq!(session.snapshot().sensors.temperature_c, Some(21.0));
}

#[tokio::test(start_paused = true)]
async fn test_soil_turning_wet_counts_as_watering() {
    let device = Arc::new(FakeDevice::new(true));
    let session = start(&device);
    settle().await;
    let mut events = session.subscribe();

    device.set_soil(false);
    sleep(Duration::from_millis(800)).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.mood, Mood::Happy);
    assert!(snapshot.water_cue_active);
    assert!(snapshot.hearts.watered);
    assert_eq!(snapshot.cooldown_remaining_secs, 0);
    assert!(drain(&mut events).contains(&PlantEvent::WaterDropCue));

    sleep(Duration::from_secs(5)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.mood, Mood::Content);
    assert!(!snapshot.water_cue_active);
}

#[tokio::test(start_paused = true)]
async fn test_device_touch_pad_press() {
    let device = Arc::new(FakeDevice::new(false));
    let session = start(&device);
    settle().await;

    device.touch.store(true, Ordering::SeqCst);
    sleep(Duration::from_millis(800)).await;
    assert_eq!(session.snapshot().mood, Mood::Happy);
    assert!(session.snapshot().hearts.touched);

    // still held on later polls: no second edge, mood returns after the window
    sleep(Duration::from_millis(1600)).await;
    assert_eq!(session.snapshot().mood, Mood::Content);
}

// ============================================================================
// Touch
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_touch_reverts_to_thirsty_when_dry() {
    let device = Arc::new(FakeDevice::new(true));
    let session = start(&device);
    settle().await;

    session.touch().unwrap();
    assert_eq!(session.snapshot().mood, Mood::Happy);

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(session.snapshot().mood, Mood::Happy);

    sleep(Duration::from_millis(150)).await;
    assert_eq!(session.snapshot().mood, Mood::Thirsty);
}

#[tokio::test(start_paused = true)]
async fn test_touch_reverts_to_content_when_wet() {
    let device = Arc::new(FakeDevice::new(false));
    let session = start(&device);
    settle().await;

    session.touch().unwrap();
    sleep(Duration::from_millis(1250)).await;
    assert_eq!(session.snapshot().mood, Mood::Content);
}

// ============================================================================
// Watering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_watering_accepted_starts_cooldown_and_quest() {
    let device = Arc::new(FakeDevice::new(false));
    let session = start(&device);
    settle().await;
    let mut events = session.subscribe();

    let outcome = session.water().await.unwrap();
    assert!(matches!(outcome, WaterOutcome::Accepted(_)));

    let snapshot = session.snapshot();
    assert!(snapshot.hearts.watered);
    assert_eq!(snapshot.cooldown_remaining_secs, 60);
    assert!(snapshot.water_cue_active);
    assert_eq!(snapshot.mood, Mood::Happy);
    assert_eq!(snapshot.sensors.daily_elapsed_sec, Some(2.0));
    assert!(!snapshot.can_water());

    // gated while cooling down: no request reaches the device
    assert!(matches!(
        session.water().await,
        Err(ActionError::CoolingDown { remaining_secs: 60 })
    ));
    assert_eq!(device.water_calls.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(5_100)).await;
    let snapshot = session.snapshot();
    assert!(!snapshot.water_cue_active);
    assert_eq!(snapshot.mood, Mood::Content);
    assert_eq!(snapshot.cooldown_remaining_secs, 55);

    sleep(Duration::from_secs(55)).await;
    assert_eq!(session.snapshot().cooldown_remaining_secs, 0);
    assert!(drain(&mut events).contains(&PlantEvent::CooldownFinished));

    session.water().await.unwrap();
    assert_eq!(device.water_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_counts_down_one_per_second() {
    let device = Arc::new(FakeDevice::new(false));
    let session = start(&device);
    settle().await;

    session.water().await.unwrap();
    let mut previous = session.snapshot().cooldown_remaining_secs;
    assert_eq!(previous, 60);

    sleep(Duration::from_millis(500)).await;
    for _ in 0..60 {
        sleep(Duration::from_secs(1)).await;
        let remaining = session.snapshot().cooldown_remaining_secs;
        assert_eq!(remaining, previous - 1);
        previous = remaining;
    }
    assert_eq!(previous, 0);
    assert_eq!(session.pending_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_device_cooldown_reply_withholds_credit() {
    let device = Arc::new(FakeDevice::new(true));
    device.reply_to_water(WaterReply::CoolingDown);
    let session = start(&device);
    settle().await;
    let mut events = session.subscribe();

    let outcome = session.water().await.unwrap();
    assert_eq!(outcome, WaterOutcome::CoolingDown);

    let snapshot = session.snapshot();
    assert!(!snapshot.hearts.watered);
    assert_eq!(snapshot.cooldown_remaining_secs, 60);
    assert!(!snapshot.water_cue_active);
    assert_eq!(snapshot.mood, Mood::Thirsty);
    assert!(snapshot.last_failure.is_none());

    let seen = drain(&mut events);
    assert!(!seen.iter().any(|e| matches!(e, PlantEvent::QuestCompleted(_))));
    assert!(!seen.iter().any(|e| matches!(e, PlantEvent::ActionFailed(_))));
}

#[tokio::test(start_paused = true)]
async fn test_watering_failure_rolls_back() {
    let device = Arc::new(FakeDevice::new(true));
    device.reply_to_water(WaterReply::Fail);
    let session = start(&device);
    settle().await;

    let result = session.water().await;
    assert!(matches!(
        result,
        Err(ActionError::Api(ApiError::Rejected { status: 500, .. }))
    ));

    let snapshot = session.snapshot();
    assert!(!snapshot.hearts.watered);
    assert_eq!(snapshot.cooldown_remaining_secs, 0);
    assert!(!snapshot.water_cue_active);
    assert_eq!(snapshot.mood, Mood::Thirsty);
    assert_eq!(
        snapshot.last_failure.map(|f| f.action),
        Some(ActionKind::Water)
    );

    // the next attempt clears the surfaced failure
    device.reply_to_water(WaterReply::Accepted);
    session.water().await.unwrap();
    assert!(session.snapshot().last_failure.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_touch_window_closing_mid_request_rolls_back_to_thirsty() {
    let device = Arc::new(FakeDevice::new(true));
    device.reply_to_water(WaterReply::CoolingDown);
    device.delay_water(Duration::from_secs(2));
    let session = Arc::new(start(&device));
    settle().await;

    session.touch().unwrap();
    let request = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.water().await })
    };

    // touch window closes while the request is still in flight
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(session.snapshot().mood, Mood::Happy);
    assert!(session.snapshot().watering_in_flight);

    assert_eq!(request.await.unwrap().unwrap(), WaterOutcome::CoolingDown);
    assert_eq!(session.snapshot().mood, Mood::Thirsty);

    sleep(Duration::from_secs(60)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.mood, Mood::Thirsty);
    assert!(!snapshot.water_cue_active);
}

#[tokio::test(start_paused = true)]
async fn test_bonus_ending_mid_request_rolls_back_to_content() {
    let device = Arc::new(FakeDevice::new(false));
    let session = Arc::new(start(&device));
    settle().await;

    session.touch().unwrap();
    session.water().await.unwrap();
    session.capture().await.unwrap();
    sleep(Duration::from_secs(61)).await;
    assert!(session.snapshot().can_water());

    device.reply_to_water(WaterReply::Fail);
    device.delay_water(Duration::from_secs(8));
    assert!(session.start_bonus().unwrap());
    let request = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.water().await })
    };

    sleep(Duration::from_millis(5_500)).await;
    assert_eq!(session.snapshot().bonus_phase, None);
    assert_eq!(session.snapshot().mood, Mood::Happy);

    assert!(request.await.unwrap().is_err());
    assert_eq!(session.snapshot().mood, Mood::Content);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(session.snapshot().mood, Mood::Content);
}

// ============================================================================
// Capture
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_capture_while_busy_is_rejected() {
    let device = Arc::new(FakeDevice::new(false).with_capture_delay(Duration::from_secs(1)));
    let session = Arc::new(start(&device));
    settle().await;

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.capture().await })
    };
    sleep(Duration::from_millis(10)).await;
    assert_eq!(session.snapshot().camera, CameraState::Busy);

    assert!(matches!(
        session.capture().await,
        Err(ActionError::CameraBusy)
    ));

    let photo = first.await.unwrap().unwrap();
    assert_eq!(device.capture_calls.load(Ordering::SeqCst), 1);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.camera, CameraState::Idle);
    assert_eq!(snapshot.last_photo.map(|p| p.url), Some(photo.url));
    assert!(snapshot.hearts.photo_taken);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_returns_to_idle() {
    let device = Arc::new(FakeDevice::new(false));
    device.capture_fails.store(true, Ordering::SeqCst);
    let session = start(&device);
    settle().await;

    assert!(matches!(
        session.capture().await,
        Err(ActionError::Api(ApiError::Network(_)))
    ));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.camera, CameraState::Idle);
    assert!(snapshot.last_photo.is_none());
    assert!(!snapshot.hearts.photo_taken);
    assert_eq!(
        snapshot.last_failure.map(|f| f.action),
        Some(ActionKind::Capture)
    );
}

#[tokio::test(start_paused = true)]
async fn test_preview_url_from_service() {
    let device = Arc::new(FakeDevice::new(false));
    let session = start(&device);
    assert!(session.is_enabled(Feature::Preview));
    assert_eq!(
        session.preview_url().map(|u| u.path().to_string()),
        Some("/camera/stream".to_string())
    );
}

// ============================================================================
// Daily quests and bonus
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_bonus_plays_once() {
    let device = Arc::new(FakeDevice::new(false));
    let session = start(&device);
    settle().await;

    assert!(!session.start_bonus().unwrap());

    session.touch().unwrap();
    session.water().await.unwrap();
    session.capture().await.unwrap();

    let snapshot = session.snapshot();
    assert!(snapshot.hearts.all_done());
    assert!(snapshot.bonus_available);

    let mut events = session.subscribe();
    assert!(session.start_bonus().unwrap());
    assert_eq!(session.snapshot().mood, Mood::Excited);
    assert_eq!(session.snapshot().bonus_phase, Some(BonusPhase::FlyingIn));
    assert!(session.snapshot().bonus_triggered_today);

    // mid-sequence re-entry
    assert!(!session.start_bonus().unwrap());

    sleep(Duration::from_millis(5_100)).await;
    let phases: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            PlantEvent::BonusPhaseChanged(phase) => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            Some(BonusPhase::FlyingIn),
            Some(BonusPhase::Staying),
            Some(BonusPhase::Leaving),
            None,
        ]
    );

    sleep(Duration::from_secs(1)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.bonus_phase, None);
    assert_eq!(snapshot.mood, Mood::Content);
    assert!(snapshot.hearts.all_done());
    assert!(!snapshot.bonus_available);
    assert!(!session.start_bonus().unwrap());
}
