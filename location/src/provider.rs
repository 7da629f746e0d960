use std::fmt;
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError, unbounded};
use futures::future::BoxFuture;
use log::{debug, warn};

use crate::{LocationError, LocationResult, Reading, WatchConfig};

/// An event pushed by a provider to a subscribed delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A new position sample.
    Reading(Reading),
    /// The provider failed to produce a sample.
    Failure(LocationError),
}

impl From<LocationEvent> for LocationResult<Reading> {
    fn from(event: LocationEvent) -> Self {
        match event {
            LocationEvent::Reading(reading) => Ok(reading),
            LocationEvent::Failure(error) => Err(error),
        }
    }
}

/// Receives events from a position subscription.
///
/// Providers may call [`on_event`](Self::on_event) from any thread.
pub trait LocationDelegate: Send + Sync {
    /// Called for each pushed event.
    fn on_event(&self, event: LocationEvent);
}

/// A live registration returned by [`PositionProvider::watch_position`].
pub trait Subscription: Send {
    /// Stops the provider from pushing further events.
    fn remove(self: Box<Self>);
}

/// A capability that produces device positions.
pub trait PositionProvider: Send + Sync {
    /// Request a single position, suspending until the provider resolves it.
    fn current_position(&self) -> BoxFuture<'_, LocationResult<Reading>>;

    /// Register `delegate` for push-based updates.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot start pushing updates.
    fn watch_position(
        &self,
        config: &WatchConfig,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Subscription>>;
}

/// Delegate that forwards pushed events into a single-consumer channel.
pub(crate) struct ChannelLocationDelegate {
    sender: Sender<LocationEvent>,
}

impl ChannelLocationDelegate {
    pub(crate) fn new() -> (Self, Receiver<LocationEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl fmt::Debug for ChannelLocationDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelLocationDelegate").finish()
    }
}

impl LocationDelegate for ChannelLocationDelegate {
    fn on_event(&self, event: LocationEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            // The subscription was torn down; late events are expected.
            Err(TrySendError::Closed(_)) => debug!("dropping location event after teardown"),
            Err(err) => warn!("dropping location event: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinates;

    #[test]
    fn forwards_events_in_order() {
        let (delegate, receiver) = ChannelLocationDelegate::new();
        let first = Reading::new(Coordinates::new(1.0, 2.0), 1);
        delegate.on_event(LocationEvent::Reading(first.clone()));
        delegate.on_event(LocationEvent::Failure(LocationError::Timeout));

        assert_eq!(receiver.try_recv(), Ok(LocationEvent::Reading(first)));
        assert_eq!(
            receiver.try_recv(),
            Ok(LocationEvent::Failure(LocationError::Timeout))
        );
    }

    #[test]
    fn closed_channel_swallows_events() {
        let (delegate, receiver) = ChannelLocationDelegate::new();
        drop(receiver);
        delegate.on_event(LocationEvent::Failure(LocationError::NotAvailable));
    }
}
