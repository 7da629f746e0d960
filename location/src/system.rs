//! Provider backed by the host platform's location service.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures::future::{BoxFuture, Either, select};
use futures::pin_mut;
use futures_timer::Delay;
use log::{debug, warn};

use crate::shutdown::{ShutdownHandle, ShutdownReceiver};
use crate::{
    LocationDelegate, LocationError, LocationEvent, LocationResult, PermissionError,
    PermissionProvider, PermissionStatus, PositionProvider, Reading, Subscription, WatchConfig,
    sys,
};

/// Lower bound on the watch poll period, so a zero interval cannot spin.
const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Location provider for the current platform.
///
/// Uses GeoClue2 on Linux and the WinRT `Geolocator` on Windows; other
/// targets report [`LocationError::NotAvailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProvider;

impl PermissionProvider for SystemProvider {
    fn request_permission(&self) -> BoxFuture<'_, Result<PermissionStatus, PermissionError>> {
        Box::pin(geokit_permission::request())
    }
}

impl PositionProvider for SystemProvider {
    fn current_position(&self) -> BoxFuture<'_, LocationResult<Reading>> {
        Box::pin(async { sys::get_location(&WatchConfig::default()).await })
    }

    fn watch_position(
        &self,
        config: &WatchConfig,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Subscription>> {
        let (handle, shutdown) = ShutdownHandle::new();
        let config = config.clone();

        thread::Builder::new()
            .name("geokit-watch".into())
            .spawn(move || futures::executor::block_on(watch_loop(&config, &*delegate, &shutdown)))
            .map_err(|e| LocationError::Unknown(format!("failed to spawn watch thread: {e}")))?;

        Ok(Box::new(SystemSubscription { handle }))
    }
}

/// Polls the platform until shutdown, forwarding every result to `delegate`.
async fn watch_loop(
    config: &WatchConfig,
    delegate: &dyn LocationDelegate,
    shutdown: &ShutdownReceiver,
) {
    let interval = Duration::from_millis(config.min_interval_ms.max(MIN_POLL_INTERVAL_MS));
    debug!("system location watch started, polling every {interval:?}");

    while !shutdown.is_shutdown() {
        let event = match sys::get_location(config).await {
            Ok(reading) => LocationEvent::Reading(reading),
            Err(err) => {
                warn!("system location poll failed: {err}");
                LocationEvent::Failure(err)
            }
        };
        if shutdown.is_shutdown() {
            break;
        }
        delegate.on_event(event);

        let delay = Delay::new(interval);
        let stopped = shutdown.wait();
        pin_mut!(delay, stopped);
        if let Either::Right(_) = select(delay, stopped).await {
            break;
        }
    }

    debug!("system location watch stopped");
}

#[derive(Debug)]
struct SystemSubscription {
    handle: ShutdownHandle,
}

impl Subscription for SystemSubscription {
    fn remove(self: Box<Self>) {
        self.handle.shutdown();
    }
}
