//! PlantSession - the orchestrator
//!
//! Owns one [`PlantState`] behind a mutex and drives it from three sources:
//! the status poller, user actions, and purpose-keyed timers. The lock is
//! never held across an `.await`; network calls happen between a `begin_*`
//! and a `finish_*` transition, each of which is applied atomically.
//!
//! After every transition the session publishes a fresh [`PlantSnapshot`]
//! on a watch channel and forwards the transition's [`PlantEvent`]s on a
//! broadcast channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sprout_api::{
    ApiError, CapturedPhoto, ClientConfig, DeviceStatus, PlantClient, PlantService, Url,
    WaterOutcome,
};
use sprout_state::{Outcome, PlantEvent, PlantSnapshot, PlantState, TimerPurpose, TimerRequest};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::poller::{PollerStats, StatusPoller};
use crate::timers::TimerTable;
use crate::{ActionError, Feature, SdkError, SessionConfig};

/// State and timers, always locked together
struct Core {
    state: PlantState,
    timers: TimerTable,
}

struct Inner {
    config: SessionConfig,
    service: Option<Arc<dyn PlantService>>,
    runtime: Handle,
    core: Mutex<Core>,
    snapshot_tx: watch::Sender<PlantSnapshot>,
    event_tx: broadcast::Sender<PlantEvent>,
    closed: AtomicBool,
}

/// Current instant on the tokio clock (follows paused time in tests)
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl Inner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Carry out an outcome's timer requests and publish its events
    fn apply(self: &Arc<Self>, core: &mut Core, outcome: Outcome) {
        for request in outcome.timers {
            match request {
                TimerRequest::Schedule { purpose, after } => {
                    self.schedule(&mut core.timers, purpose, after)
                }
                TimerRequest::Cancel(purpose) => core.timers.cancel(purpose),
            }
        }

        self.snapshot_tx.send_replace(core.state.snapshot());

        for event in outcome.events {
            // no subscribers is fine
            let _ = self.event_tx.send(event);
        }
    }

    fn schedule(self: &Arc<Self>, timers: &mut TimerTable, purpose: TimerPurpose, after: Duration) {
        let generation = timers.next_generation();
        let weak: Weak<Inner> = Arc::downgrade(self);

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(purpose, generation);
            }
        });

        timers.arm(purpose, generation, handle);
    }

    fn fire(self: &Arc<Self>, purpose: TimerPurpose, generation: u64) {
        let mut core = self.core.lock();
        if self.is_closed() || !core.timers.claim(purpose, generation) {
            return;
        }
        let outcome = core.state.on_timer(purpose, now());
        self.apply(&mut core, outcome);
    }

    /// Poll sink; false stops the poller
    fn on_status(self: &Arc<Self>, status: DeviceStatus) -> bool {
        let mut core = self.core.lock();
        if self.is_closed() {
            return false;
        }
        debug!("Applying status sample: {:?}", status);
        let outcome = core.state.apply_status(&status, now());
        self.apply(&mut core, outcome);
        true
    }

    /// Run a transition unless the session is closed
    fn transition<T>(
        self: &Arc<Self>,
        f: impl FnOnce(&mut PlantState) -> Result<(T, Outcome), ActionError>,
    ) -> Result<T, ActionError> {
        let mut core = self.core.lock();
        if self.is_closed() {
            return Err(ActionError::Shutdown);
        }
        let (value, outcome) = f(&mut core.state)?;
        self.apply(&mut core, outcome);
        Ok(value)
    }

    /// Service for an authenticated action, if configured
    fn action_service(&self, feature: Feature) -> Result<Arc<dyn PlantService>, ActionError> {
        self.service
            .as_ref()
            .filter(|service| service.actions_enabled())
            .cloned()
            .ok_or(ActionError::NotConfigured(feature))
    }
}

/// A running plant-care session
///
/// # Example
///
/// ```rust,no_run
/// use sprout_api::ClientConfig;
/// use sprout_sdk::{PlantSession, SessionConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let session = PlantSession::start(ClientConfig::from_env(), SessionConfig::default())?;
/// let mut snapshots = session.watch();
///
/// session.touch()?;
/// session.water().await?;
///
/// while snapshots.changed().await.is_ok() {
///     println!("mood: {:?}", snapshots.borrow().mood);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PlantSession {
    inner: Arc<Inner>,
    poller: Mutex<Option<StatusPoller>>,
}

impl PlantSession {
    /// Start a session against the HTTP service described by `client`
    ///
    /// Without a base address the session runs offline: nothing is polled
    /// and only local actions (touch, bonus) work. That is not an error.
    /// Must be called from within a tokio runtime.
    pub fn start(client: ClientConfig, config: SessionConfig) -> Result<Self, SdkError> {
        let service: Option<Arc<dyn PlantService>> = match PlantClient::new(&client) {
            Ok(client) => Some(Arc::new(client)),
            Err(ApiError::NotConfigured(what)) => {
                info!("No {} configured, running offline", what);
                None
            }
            Err(e) => return Err(e.into()),
        };

        Self::launch(service, config)
    }

    /// Start a session against any [`PlantService`] implementation
    pub fn with_service(
        service: Arc<dyn PlantService>,
        config: SessionConfig,
    ) -> Result<Self, SdkError> {
        Self::launch(Some(service), config)
    }

    /// Start a session with no device at all
    pub fn offline(config: SessionConfig) -> Result<Self, SdkError> {
        Self::launch(None, config)
    }

    fn launch(
        service: Option<Arc<dyn PlantService>>,
        config: SessionConfig,
    ) -> Result<Self, SdkError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| SdkError::Runtime(e.to_string()))?;

        let state = PlantState::new(config.emotion, config.watering_cooldown_secs);
        let (snapshot_tx, _) = watch::channel(state.snapshot());
        let (event_tx, _) = broadcast::channel(config.event_buffer_size);

        let inner = Arc::new(Inner {
            config,
            service,
            runtime,
            core: Mutex::new(Core {
                state,
                timers: TimerTable::new(),
            }),
            snapshot_tx,
            event_tx,
            closed: AtomicBool::new(false),
        });

        let poller = inner.service.clone().map(|service| {
            let weak = Arc::downgrade(&inner);
            StatusPoller::start(
                &inner.runtime,
                service,
                inner.config.poll_interval,
                move |status| match weak.upgrade() {
                    Some(inner) => inner.on_status(status),
                    None => false,
                },
            )
        });

        info!(
            "Plant session started (polling: {}, actions: {})",
            poller.is_some(),
            inner.service.as_ref().is_some_and(|s| s.actions_enabled()),
        );

        Ok(Self {
            inner,
            poller: Mutex::new(poller),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Whether `feature` is available with the current configuration
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Polling => self.inner.service.is_some(),
            Feature::Watering | Feature::Capture => {
                self.inner.action_service(feature).is_ok()
            }
            Feature::Preview => self.preview_url().is_some(),
        }
    }

    /// The polling task is alive
    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .as_ref()
            .is_some_and(StatusPoller::is_running)
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.is_closed()
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlantSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver that sees every published snapshot
    pub fn watch(&self) -> watch::Receiver<PlantSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Receiver for one-shot events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlantEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Poller counters; `None` when offline
    pub fn poller_stats(&self) -> Option<PollerStats> {
        self.poller.lock().as_ref().map(StatusPoller::stats)
    }

    /// Number of timers currently pending
    pub fn pending_timers(&self) -> usize {
        self.inner.core.lock().timers.pending()
    }

    /// Authenticated live-preview URL, when base and key are configured
    pub fn preview_url(&self) -> Option<Url> {
        self.inner
            .action_service(Feature::Preview)
            .ok()
            .and_then(|service| service.preview_url())
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Local touch: happy for the touch window, completes the touch quest
    pub fn touch(&self) -> Result<(), ActionError> {
        self.inner
            .transition(|state| Ok(((), state.touch(now()))))
    }

    /// Request a watering pulse
    ///
    /// Refused without a request while the cooldown runs or another watering
    /// is showing. The water cue is shown optimistically and withdrawn if
    /// the device does not water. A cooldown refusal from the device is
    /// returned as [`WaterOutcome::CoolingDown`] and starts the local
    /// cooldown without completing the quest.
    pub async fn water(&self) -> Result<WaterOutcome, ActionError> {
        let service = self.inner.action_service(Feature::Watering)?;

        self.inner.transition(|state| {
            let outcome = state.begin_watering(now())?;
            Ok(((), outcome))
        })?;

        let result = service.water(self.inner.config.water_duration).await;

        {
            let mut core = self.inner.core.lock();
            if !self.inner.is_closed() {
                let outcome = core.state.finish_watering(&result, now());
                self.inner.apply(&mut core, outcome);
            }
        }

        Ok(result?)
    }

    /// Request a photo
    ///
    /// A second request while one is outstanding is rejected with
    /// [`ActionError::CameraBusy`]; nothing is queued.
    pub async fn capture(&self) -> Result<CapturedPhoto, ActionError> {
        let service = self.inner.action_service(Feature::Capture)?;

        self.inner.transition(|state| {
            state.begin_capture()?;
            Ok(((), Outcome::new()))
        })?;

        let result = service.capture().await;

        {
            let mut core = self.inner.core.lock();
            if !self.inner.is_closed() {
                let outcome = core.state.finish_capture(&result);
                self.inner.apply(&mut core, outcome);
            }
        }

        Ok(result?)
    }

    /// Start the bonus sequence. Returns false (and changes nothing) unless
    /// all hearts are full, no sequence is playing, and it has not played
    /// yet this session.
    pub fn start_bonus(&self) -> Result<bool, ActionError> {
        self.inner.transition(|state| {
            Ok(match state.start_bonus(now()) {
                Some(outcome) => (true, outcome),
                None => (false, Outcome::new()),
            })
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Stop polling and every timer. Idempotent.
    ///
    /// Responses to requests still in flight are discarded.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(poller) = self.poller.lock().take() {
            poller.stop();
        }

        let mut core = self.inner.core.lock();
        let outcome = core.state.teardown();
        self.inner.apply(&mut core, outcome);
        core.timers.cancel_all();

        info!("Plant session shut down");
    }
}

impl Drop for PlantSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PlantSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlantSession")
            .field("online", &self.inner.service.is_some())
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}
