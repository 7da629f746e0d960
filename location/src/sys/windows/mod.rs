//! Windows location implementation using WinRT Geolocator.

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator, PositionAccuracy};

use crate::{Accuracy, Coordinates, LocationError, Reading, WatchConfig};

/// Offset between the Windows epoch (1601) and the Unix epoch, in 100ns ticks.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

fn platform_error(e: &windows::core::Error) -> LocationError {
    LocationError::Unknown(e.message().to_string())
}

pub(crate) async fn get_location(config: &WatchConfig) -> Result<Reading, LocationError> {
    // RequestAccessAsync also serves as the permission check on Windows
    let access = Geolocator::RequestAccessAsync()
        .map_err(|e| platform_error(&e))?
        .get()
        .map_err(|e| platform_error(&e))?;

    match access {
        GeolocationAccessStatus::Allowed => {}
        GeolocationAccessStatus::Denied => return Err(LocationError::PermissionDenied),
        _ => return Err(LocationError::NotAvailable),
    }

    let geolocator = Geolocator::new().map_err(|e| platform_error(&e))?;
    let desired = match config.accuracy {
        Accuracy::High | Accuracy::Highest | Accuracy::BestForNavigation => PositionAccuracy::High,
        Accuracy::Lowest | Accuracy::Low | Accuracy::Balanced => PositionAccuracy::Default,
    };
    geolocator
        .SetDesiredAccuracy(desired)
        .map_err(|e| platform_error(&e))?;
    geolocator
        .SetMovementThreshold(config.min_distance_meters.max(0.0))
        .map_err(|e| platform_error(&e))?;

    let position = geolocator
        .GetGeopositionAsync()
        .map_err(|e| platform_error(&e))?
        .get()
        .map_err(|e| platform_error(&e))?;

    let coord = position.Coordinate().map_err(|e| platform_error(&e))?;
    let pos = coord
        .Point()
        .and_then(|point| point.Position())
        .map_err(|e| platform_error(&e))?;

    let ticks = coord
        .Timestamp()
        .map_err(|e| platform_error(&e))?
        .UniversalTime;
    let timestamp = u64::try_from((ticks - UNIX_EPOCH_TICKS) / 10_000).unwrap_or(0);

    let optional = |value: windows::core::Result<windows::Foundation::IReference<f64>>| {
        value.and_then(|v| v.Value()).ok().filter(|v| v.is_finite())
    };

    Ok(Reading {
        coords: Coordinates {
            latitude: pos.Latitude,
            longitude: pos.Longitude,
            altitude: Some(pos.Altitude),
            speed: optional(coord.Speed()),
            accuracy: coord.Accuracy().ok(),
            heading: optional(coord.Heading()),
        },
        timestamp,
    })
}
