//! Windows permission implementation using WinRT.

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator};

use crate::{PermissionError, PermissionStatus};

pub(crate) async fn check() -> PermissionStatus {
    request().await.unwrap_or(PermissionStatus::NotDetermined)
}

pub(crate) async fn request() -> Result<PermissionStatus, PermissionError> {
    // RequestAccessAsync both checks and prompts if needed
    let status = Geolocator::RequestAccessAsync()
        .map_err(|e| PermissionError::Unknown(e.message().to_string()))?
        .get()
        .map_err(|e| PermissionError::Unknown(e.message().to_string()))?;

    Ok(match status {
        GeolocationAccessStatus::Allowed => PermissionStatus::Granted,
        GeolocationAccessStatus::Denied => PermissionStatus::Denied,
        _ => PermissionStatus::NotDetermined,
    })
}
