//! Platform-specific location implementations.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
pub(crate) use windows::get_location;

#[cfg(target_os = "linux")]
pub(crate) use linux::get_location;

// Fallback for platforms without a location backend
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub(crate) async fn get_location(
    _config: &crate::WatchConfig,
) -> Result<crate::Reading, crate::LocationError> {
    Err(crate::LocationError::NotAvailable)
}

/// Current time as Unix epoch milliseconds.
#[cfg(target_os = "linux")]
pub(crate) fn timestamp_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
