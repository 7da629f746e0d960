//! Platform-specific permission implementations.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
pub(crate) use windows::{check, request};

#[cfg(target_os = "linux")]
pub(crate) use linux::{check, request};

// Fallback for platforms without a location permission backend
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub(crate) async fn check() -> crate::PermissionStatus {
    crate::PermissionStatus::NotDetermined
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub(crate) async fn request() -> Result<crate::PermissionStatus, crate::PermissionError> {
    Err(crate::PermissionError::NotSupported)
}
