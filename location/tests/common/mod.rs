//! Scripted provider shared by the controller tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use geokit_location::{
    Coordinates, LocationDelegate, LocationError, LocationEvent, LocationResult, PermissionError,
    PermissionProvider, PermissionStatus, PositionProvider, Reading, Subscription, WatchConfig,
};

/// Provider calls in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Position,
    Watch(WatchConfig),
    Remove,
}

#[derive(Debug, Default)]
pub struct Tracker {
    calls: Mutex<Vec<Call>>,
    live_subscriptions: AtomicUsize,
    max_live_subscriptions: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Tracker {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Decrements the in-flight count even when the request future is dropped.
struct InFlight(Arc<Tracker>);

impl InFlight {
    fn enter(tracker: &Arc<Tracker>) -> Self {
        let now = tracker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        tracker.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(tracker.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockSubscription {
    tracker: Arc<Tracker>,
}

impl Subscription for MockSubscription {
    fn remove(self: Box<Self>) {
        self.tracker.record(Call::Remove);
        self.tracker.live_subscriptions.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockProvider {
    permissions: Mutex<VecDeque<Result<PermissionStatus, PermissionError>>>,
    positions: Mutex<VecDeque<LocationResult<Reading>>>,
    latency: Duration,
    watch_failure: Mutex<Option<LocationError>>,
    delegates: Mutex<Vec<Arc<dyn LocationDelegate>>>,
    tracker: Arc<Tracker>,
}

impl MockProvider {
    /// A provider that grants permission and resolves requests immediately.
    pub fn new() -> Self {
        Self {
            permissions: Mutex::new(VecDeque::new()),
            positions: Mutex::new(VecDeque::new()),
            latency: Duration::ZERO,
            watch_failure: Mutex::new(None),
            delegates: Mutex::new(Vec::new()),
            tracker: Arc::new(Tracker::default()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue permission answers; once exhausted the provider grants.
    pub fn with_permissions(
        self,
        answers: impl IntoIterator<Item = Result<PermissionStatus, PermissionError>>,
    ) -> Self {
        self.permissions.lock().unwrap().extend(answers);
        self
    }

    /// Queue position results; once exhausted requests fail with `NotAvailable`.
    pub fn with_positions(self, results: impl IntoIterator<Item = LocationResult<Reading>>) -> Self {
        self.positions.lock().unwrap().extend(results);
        self
    }

    pub fn fail_watch(&self, error: LocationError) {
        *self.watch_failure.lock().unwrap() = Some(error);
    }

    pub fn queue_position(&self, result: LocationResult<Reading>) {
        self.positions.lock().unwrap().push_back(result);
    }

    /// Push an event through the most recently registered delegate.
    pub fn push(&self, event: LocationEvent) {
        let delegate = self.delegates.lock().unwrap().last().cloned();
        delegate.expect("no delegate registered").on_event(event);
    }

    /// Push an event through the delegate registered `index`-th.
    pub fn push_to(&self, index: usize, event: LocationEvent) {
        let delegate = self.delegates.lock().unwrap()[index].clone();
        delegate.on_event(event);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.tracker.calls.lock().unwrap().clone()
    }

    pub fn position_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Position).count()
    }

    pub fn removals(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Remove).count()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.tracker.live_subscriptions.load(Ordering::SeqCst)
    }

    pub fn max_live_subscriptions(&self) -> usize {
        self.tracker.max_live_subscriptions.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.tracker.max_in_flight.load(Ordering::SeqCst)
    }
}

impl PermissionProvider for MockProvider {
    fn request_permission(&self) -> BoxFuture<'_, Result<PermissionStatus, PermissionError>> {
        let answer = self
            .permissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(PermissionStatus::Granted));
        Box::pin(async move { answer })
    }
}

impl PositionProvider for MockProvider {
    fn current_position(&self) -> BoxFuture<'_, LocationResult<Reading>> {
        self.tracker.record(Call::Position);
        let guard = InFlight::enter(&self.tracker);
        let result = self
            .positions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LocationError::NotAvailable));
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            drop(guard);
            result
        })
    }

    fn watch_position(
        &self,
        config: &WatchConfig,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Subscription>> {
        self.tracker.record(Call::Watch(config.clone()));
        if let Some(error) = self.watch_failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.delegates.lock().unwrap().push(delegate);
        let live = self.tracker.live_subscriptions.fetch_add(1, Ordering::SeqCst) + 1;
        self.tracker
            .max_live_subscriptions
            .fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(MockSubscription {
            tracker: self.tracker.clone(),
        }))
    }
}

/// A reading whose latitude identifies it.
pub fn reading(id: u32) -> Reading {
    let mut coords = Coordinates::new(f64::from(id), -f64::from(id));
    coords.speed = Some(1.5);
    coords.altitude = Some(12.0);
    Reading::new(coords, 1_700_000_000_000 + u64::from(id) * 1000)
}

/// Let spawned tasks run under paused time.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
