//! Location acquisition.
//!
//! This crate wraps a platform location service behind the
//! [`PositionProvider`] trait and drives it with a [`LocationController`]
//! that owns exactly one acquisition mode at a time: a single-shot request,
//! an interval poll, or a push-based subscription.
//!
//! ```ignore
//! use std::sync::Arc;
//! use geokit_location::{LocationController, PermissionState, SystemProvider, WatchConfig};
//!
//! let controller = LocationController::new(Arc::new(SystemProvider));
//! if controller.request_permission().await == PermissionState::Granted {
//!     controller.start_subscription(&WatchConfig::default())?;
//! }
//! let mut updates = controller.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     println!("{:?}", snapshot.reading);
//! }
//! ```

#![warn(missing_docs)]

mod controller;
mod provider;
mod shutdown;
mod system;

/// Platform-specific implementations.
pub mod sys;

use serde::{Deserialize, Serialize};

pub use controller::{AcquisitionMode, LocationController, LocationSnapshot};
pub use geokit_permission::{
    PermissionError, PermissionGate, PermissionProvider, PermissionState, PermissionStatus,
};
pub use provider::{LocationDelegate, LocationEvent, PositionProvider, Subscription};
pub use system::SystemProvider;

/// Position and motion of the device at the time of a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Altitude in meters above sea level, if available.
    pub altitude: Option<f64>,
    /// Ground speed in meters per second, if available.
    pub speed: Option<f64>,
    /// Horizontal accuracy radius in meters, if available.
    pub accuracy: Option<f64>,
    /// Direction of travel in degrees clockwise from true north, if available.
    pub heading: Option<f64>,
}

impl Coordinates {
    /// Creates coordinates with only latitude and longitude known.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            speed: None,
            accuracy: None,
            heading: None,
        }
    }
}

/// A timestamped geolocation sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Where the device was.
    pub coords: Coordinates,
    /// Timestamp as Unix epoch milliseconds.
    pub timestamp: u64,
}

impl Reading {
    /// Creates a reading from coordinates and a Unix epoch millisecond timestamp.
    #[must_use]
    pub const fn new(coords: Coordinates, timestamp: u64) -> Self {
        Self { coords, timestamp }
    }
}

/// Desired accuracy of a position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Accuracy {
    /// Accurate to the nearest three kilometers.
    Lowest,
    /// Accurate to the nearest kilometer.
    Low,
    /// Accurate to within one hundred meters.
    #[default]
    Balanced,
    /// Accurate to within ten meters.
    High,
    /// The best level of accuracy available.
    Highest,
    /// The highest possible accuracy, using additional sensor data.
    BestForNavigation,
}

/// Options for a push-based position subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Desired accuracy of pushed readings.
    pub accuracy: Accuracy,
    /// Minimum time between pushed readings, in milliseconds.
    pub min_interval_ms: u64,
    /// Minimum distance the device must move between pushed readings, in meters.
    pub min_distance_meters: f64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Balanced,
            min_interval_ms: 1000,
            min_distance_meters: 0.0,
        }
    }
}

/// Errors that can occur when acquiring location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// Location permission was not granted.
    #[error("Permission to access location was denied")]
    PermissionDenied,
    /// Acquisition was attempted before permission was requested.
    #[error("location permission has not been requested")]
    PermissionNotRequested,
    /// The permission provider failed.
    #[error("location permission request failed: {0}")]
    Permission(#[from] PermissionError),
    /// Location services are disabled on the device.
    #[error("location services disabled")]
    ServiceDisabled,
    /// Location request timed out.
    #[error("location request timed out")]
    Timeout,
    /// Location is not available.
    #[error("location not available")]
    NotAvailable,
    /// An argument was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The operation needs a Tokio runtime and none is running.
    #[error("no async runtime available")]
    NoRuntime,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Result type for location operations.
pub type LocationResult<T> = Result<T, LocationError>;
