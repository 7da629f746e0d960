//! The location acquisition state machine.
//!
//! ```text
//! Idle --start_*--> Single | Interval(ms) | Subscribed --stop--> Idle
//!                   Single --reading resolved--> Idle
//! ```
//!
//! Every teardown bumps an epoch counter. Requests capture the epoch when
//! they are issued and their results are dropped if it has moved on, so a
//! slow response can never land after `stop()` or after a newer mode took
//! over.
//!
//! Interval polling awaits each request before waiting for the next tick and
//! skips ticks missed in the meantime, so at most one interval request is
//! outstanding. A `read_once` issued by hand alongside a running interval is
//! not serialized against it: whichever of the two resolves last wins.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_channel::Receiver;
use log::{debug, info, trace, warn};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::provider::ChannelLocationDelegate;
use crate::{
    LocationError, LocationEvent, LocationResult, PermissionGate, PermissionProvider,
    PermissionState, PositionProvider, Reading, Subscription, WatchConfig,
};

/// The strategy currently used to obtain readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AcquisitionMode {
    /// Nothing is being acquired.
    #[default]
    Idle,
    /// One request is in flight; returns to `Idle` when it resolves.
    Single,
    /// Polling on a recurring timer with the given period in milliseconds.
    Interval(u64),
    /// Receiving readings pushed by the provider.
    Subscribed,
}

/// Controller state as seen by a display sink.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationSnapshot {
    /// Permission state recorded by the gate.
    pub permission: PermissionState,
    /// Active acquisition mode.
    pub mode: AcquisitionMode,
    /// Latest applied reading.
    pub reading: Option<Reading>,
    /// Latest failure; takes display precedence over `reading`.
    pub failure: Option<LocationError>,
}

impl LocationSnapshot {
    /// The failure rendered as a user-facing message.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// What a resolved single-shot request does to the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settle {
    Keep,
    FinishSingle,
}

enum ActiveHandle {
    Task(JoinHandle<()>),
    Subscription {
        registration: Box<dyn Subscription>,
        pump: JoinHandle<()>,
    },
}

impl ActiveHandle {
    fn release(self) {
        match self {
            Self::Task(task) => task.abort(),
            Self::Subscription { registration, pump } => {
                registration.remove();
                pump.abort();
            }
        }
    }
}

#[derive(Default)]
struct State {
    mode: AcquisitionMode,
    epoch: u64,
    active: Option<ActiveHandle>,
    reading: Option<Reading>,
    failure: Option<LocationError>,
}

impl State {
    /// Release the active handle, return to `Idle` and start a new epoch.
    fn teardown(&mut self) -> u64 {
        if let Some(active) = self.active.take() {
            active.release();
        }
        if self.mode != AcquisitionMode::Idle {
            debug!("location acquisition {:?} -> Idle", self.mode);
        }
        self.mode = AcquisitionMode::Idle;
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }
}

struct Shared {
    provider: Arc<dyn PositionProvider>,
    gate: PermissionGate,
    state: Mutex<State>,
    updates: watch::Sender<LocationSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State) {
        self.updates.send_replace(LocationSnapshot {
            permission: self.gate.state(),
            mode: state.mode,
            reading: state.reading.clone(),
            failure: state.failure.clone(),
        });
    }

    /// Apply a resolved request if `epoch` is still current.
    ///
    /// Returns `false` when the result was stale and has been discarded.
    fn apply(&self, epoch: u64, result: LocationResult<Reading>, settle: Settle) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            trace!(
                "discarding location result from epoch {epoch} (current {})",
                state.epoch
            );
            return false;
        }

        match result {
            Ok(reading) => {
                state.reading = Some(reading);
                state.failure = None;
            }
            Err(err) => state.failure = Some(err),
        }
        if settle == Settle::FinishSingle && state.mode == AcquisitionMode::Single {
            debug!("location acquisition Single -> Idle");
            state.mode = AcquisitionMode::Idle;
            state.active = None;
        }
        self.publish(&state);
        true
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = state.active.take() {
            active.release();
        }
    }
}

/// Owns one acquisition mode at a time and publishes the latest reading or failure.
///
/// Cloning yields another handle to the same controller. Dropping the last
/// handle tears down the active mode. Operations that start background work
/// must be called from inside a Tokio runtime.
#[derive(Clone)]
pub struct LocationController {
    shared: Arc<Shared>,
}

impl fmt::Debug for LocationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("LocationController")
            .field("permission", &self.shared.gate.state())
            .field("mode", &state.mode)
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

impl LocationController {
    /// Creates an idle controller whose permission is still unrequested.
    pub fn new<P>(provider: Arc<P>) -> Self
    where
        P: PermissionProvider + PositionProvider + 'static,
    {
        let permission: Arc<dyn PermissionProvider> = provider.clone();
        let (updates, _) = watch::channel(LocationSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                provider,
                gate: PermissionGate::new(permission),
                state: Mutex::new(State::default()),
                updates,
            }),
        }
    }

    /// Resolve location permission through the gate.
    ///
    /// A denial stops any active mode and records
    /// [`LocationError::PermissionDenied`]; a grant clears a previously
    /// recorded permission failure. Safe to call again after a user retry.
    pub async fn request_permission(&self) -> PermissionState {
        let outcome = self.shared.gate.request().await;

        let mut state = self.shared.lock();
        let permission = match outcome {
            Ok(PermissionState::Granted) => {
                if matches!(
                    state.failure,
                    Some(LocationError::PermissionDenied | LocationError::Permission(_))
                ) {
                    state.failure = None;
                }
                PermissionState::Granted
            }
            Ok(denied) => {
                info!("location acquisition disabled: permission {denied:?}");
                state.teardown();
                state.failure = Some(LocationError::PermissionDenied);
                denied
            }
            Err(err) => {
                state.failure = Some(LocationError::Permission(err));
                self.shared.gate.state()
            }
        };
        self.shared.publish(&state);
        permission
    }

    fn ensure_granted(&self) -> LocationResult<()> {
        match self.shared.gate.state() {
            PermissionState::Granted => Ok(()),
            PermissionState::Denied => Err(LocationError::PermissionDenied),
            PermissionState::Unrequested => Err(LocationError::PermissionNotRequested),
        }
    }

    fn runtime() -> LocationResult<Handle> {
        Handle::try_current().map_err(|_| LocationError::NoRuntime)
    }

    /// Request a single position without changing the acquisition mode.
    ///
    /// The result is always returned to the caller. It is applied to the
    /// controller only if no teardown happened while it was in flight:
    /// starting a mode, or stopping one that is active. `stop()` while already
    /// `Idle` is a no-op and does not discard it.
    ///
    /// # Errors
    ///
    /// Returns the permission error if acquisition is not allowed, or the
    /// provider's error.
    pub async fn read_once(&self) -> LocationResult<Reading> {
        self.ensure_granted()?;
        let epoch = self.shared.lock().epoch;

        let result = self.shared.provider.current_position().await;
        if let Err(err) = &result {
            warn!("single location read failed: {err}");
        }
        self.shared.apply(epoch, result.clone(), Settle::Keep);
        result
    }

    /// Enter [`AcquisitionMode::Single`]: issue one background request and
    /// return to `Idle` once it resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if permission is not granted or no runtime is running.
    pub fn start_single(&self) -> LocationResult<()> {
        self.ensure_granted()?;
        let runtime = Self::runtime()?;

        let mut state = self.shared.lock();
        let epoch = state.teardown();
        let shared = Arc::downgrade(&self.shared);
        let task = runtime.spawn(async move {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let result = shared.provider.current_position().await;
            if let Err(err) = &result {
                warn!("location read failed: {err}");
            }
            shared.apply(epoch, result, Settle::FinishSingle);
        });

        debug!("location acquisition Idle -> Single");
        state.mode = AcquisitionMode::Single;
        state.active = Some(ActiveHandle::Task(task));
        self.shared.publish(&state);
        Ok(())
    }

    /// Enter [`AcquisitionMode::Interval`]: poll every `period_ms` until stopped.
    ///
    /// The first request is issued immediately. A failed tick is recorded but
    /// polling continues.
    ///
    /// # Errors
    ///
    /// Returns an error if permission is not granted, `period_ms` is zero, or
    /// no runtime is running.
    pub fn start_interval(&self, period_ms: u64) -> LocationResult<()> {
        self.ensure_granted()?;
        if period_ms == 0 {
            return Err(LocationError::InvalidConfig(
                "interval period must be at least 1 ms".into(),
            ));
        }
        let runtime = Self::runtime()?;

        let mut state = self.shared.lock();
        let epoch = state.teardown();
        let task = runtime.spawn(poll_interval(
            Arc::downgrade(&self.shared),
            epoch,
            Duration::from_millis(period_ms),
        ));

        debug!("location acquisition Idle -> Interval({period_ms})");
        state.mode = AcquisitionMode::Interval(period_ms);
        state.active = Some(ActiveHandle::Task(task));
        self.shared.publish(&state);
        Ok(())
    }

    /// Enter [`AcquisitionMode::Subscribed`]: register for pushed readings.
    ///
    /// If registration fails the failure is recorded and the controller stays
    /// `Idle`.
    ///
    /// # Errors
    ///
    /// Returns an error if permission is not granted, no runtime is running,
    /// or the provider rejects the registration.
    pub fn start_subscription(&self, config: &WatchConfig) -> LocationResult<()> {
        self.ensure_granted()?;
        let runtime = Self::runtime()?;

        let mut state = self.shared.lock();
        let epoch = state.teardown();
        let (delegate, receiver) = ChannelLocationDelegate::new();

        match self.shared.provider.watch_position(config, Arc::new(delegate)) {
            Ok(registration) => {
                let pump = runtime.spawn(pump_events(Arc::downgrade(&self.shared), epoch, receiver));
                debug!("location acquisition Idle -> Subscribed ({config:?})");
                state.mode = AcquisitionMode::Subscribed;
                state.active = Some(ActiveHandle::Subscription { registration, pump });
                self.shared.publish(&state);
                Ok(())
            }
            Err(err) => {
                warn!("location subscription failed: {err}");
                state.failure = Some(err.clone());
                self.shared.publish(&state);
                Err(err)
            }
        }
    }

    /// Tear down the active mode and return to `Idle`.
    ///
    /// Results still in flight are discarded. Does nothing when already idle.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if state.mode == AcquisitionMode::Idle && state.active.is_none() {
            return;
        }
        state.teardown();
        self.shared.publish(&state);
    }

    /// The active acquisition mode.
    #[must_use]
    pub fn mode(&self) -> AcquisitionMode {
        self.shared.lock().mode
    }

    /// The latest applied reading.
    #[must_use]
    pub fn reading(&self) -> Option<Reading> {
        self.shared.lock().reading.clone()
    }

    /// The latest recorded failure.
    #[must_use]
    pub fn failure(&self) -> Option<LocationError> {
        self.shared.lock().failure.clone()
    }

    /// The permission state recorded by the gate.
    #[must_use]
    pub fn permission(&self) -> PermissionState {
        self.shared.gate.state()
    }

    /// The current state as a single value.
    #[must_use]
    pub fn snapshot(&self) -> LocationSnapshot {
        let state = self.shared.lock();
        LocationSnapshot {
            permission: self.shared.gate.state(),
            mode: state.mode,
            reading: state.reading.clone(),
            failure: state.failure.clone(),
        }
    }

    /// Receive a snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocationSnapshot> {
        self.shared.updates.subscribe()
    }
}

async fn poll_interval(shared: Weak<Shared>, epoch: u64, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let result = shared.provider.current_position().await;
        if let Err(err) = &result {
            warn!("interval location read failed: {err}");
        }
        if !shared.apply(epoch, result, Settle::Keep) {
            break;
        }
    }
}

async fn pump_events(shared: Weak<Shared>, epoch: u64, receiver: Receiver<LocationEvent>) {
    while let Ok(event) = receiver.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if let LocationEvent::Failure(err) = &event {
            warn!("location subscription reported: {err}");
        }
        if !shared.apply(epoch, event.into(), Settle::Keep) {
            break;
        }
    }
}
