//! # Geokit
//!
//! Device geolocation for applications: permission gating, a location
//! acquisition controller with single-shot, interval and subscription modes,
//! and a small themed display layer for rendering its state.
//!
//! ## Features
//!
//! - `permission`: the permission gate and platform permission requests.
//! - `location`: the acquisition controller and the system provider; enables `permission`.
//! - `display`: theme configuration and panel rendering for display sinks;
//!   enables `location`. This is the default feature.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! geokit = { version = "0.1", features = ["location"] }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use geokit::location::{LocationController, PermissionState, SystemProvider};
//!
//! async fn track() {
//!     let controller = LocationController::new(Arc::new(SystemProvider));
//!     if controller.request_permission().await == PermissionState::Granted {
//!         let _ = controller.start_interval(5000);
//!     }
//! }
//! ```

#[cfg(feature = "display")]
pub mod display;

#[cfg(feature = "location")]
pub use geokit_location as location;

#[cfg(feature = "permission")]
pub use geokit_permission as permission;
