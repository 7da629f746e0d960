//! Location permission handling.
//!
//! This crate provides the [`PermissionGate`], a one-shot check against a
//! [`PermissionProvider`] that decides whether location acquisition may
//! proceed, plus the host platform's own permission functions.

#![warn(missing_docs)]

mod gate;

/// Platform-specific implementations.
pub mod sys;

use futures::future::BoxFuture;

pub use gate::PermissionGate;

/// The raw answer reported by a permission provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    /// Permission has been granted by the user.
    Granted,
    /// Permission has been denied by the user.
    Denied,
    /// Permission is restricted (e.g., parental controls).
    Restricted,
    /// Permission has not been requested yet.
    NotDetermined,
}

/// Permission state as tracked for the session.
///
/// Starts as [`Unrequested`](Self::Unrequested) and only ever moves to
/// [`Granted`](Self::Granted) or [`Denied`](Self::Denied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PermissionState {
    /// The gate has not resolved yet.
    #[default]
    Unrequested,
    /// Acquisition may proceed.
    Granted,
    /// Acquisition must not be attempted.
    Denied,
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => Self::Granted,
            PermissionStatus::Denied
            | PermissionStatus::Restricted
            | PermissionStatus::NotDetermined => Self::Denied,
        }
    }
}

/// Errors that can occur when requesting permissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// Location permission is not supported on this platform.
    #[error("permission not supported on this platform")]
    NotSupported,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// A capability that can ask the user for location permission.
pub trait PermissionProvider: Send + Sync {
    /// Ask for location permission, suspending until the user or platform answers.
    fn request_permission(&self) -> BoxFuture<'_, Result<PermissionStatus, PermissionError>>;
}

/// Check the current location permission status without requesting it.
pub async fn check() -> PermissionStatus {
    sys::check().await
}

/// Request location permission from the user.
///
/// If the permission has already been granted or denied, this returns
/// the current status without showing a prompt.
///
/// # Errors
/// Returns a `PermissionError` if:
/// - Location permission is not supported on this platform.
/// - An underlying platform error occurs.
pub async fn request() -> Result<PermissionStatus, PermissionError> {
    sys::request().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_granted_status_grants() {
        assert_eq!(
            PermissionState::from(PermissionStatus::Granted),
            PermissionState::Granted
        );
        for status in [
            PermissionStatus::Denied,
            PermissionStatus::Restricted,
            PermissionStatus::NotDetermined,
        ] {
            assert_eq!(PermissionState::from(status), PermissionState::Denied);
        }
    }

    #[tokio::test]
    async fn check_agrees_with_request() {
        let status = check().await;
        match request().await {
            Ok(requested) => assert_eq!(requested, status),
            Err(_) => assert_eq!(status, PermissionStatus::NotDetermined),
        }
    }

    #[test]
    fn state_starts_unrequested() {
        assert_eq!(PermissionState::default(), PermissionState::Unrequested);
    }
}
