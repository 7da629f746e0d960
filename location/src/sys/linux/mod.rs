//! Linux location implementation using the GeoClue2 D-Bus service.

use zbus::Connection;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::{Accuracy, Coordinates, LocationError, Reading, WatchConfig};

const GEOCLUE_BUS: &str = "org.freedesktop.GeoClue2";
const GEOCLUE_MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const GEOCLUE_MANAGER_IFACE: &str = "org.freedesktop.GeoClue2.Manager";
const GEOCLUE_CLIENT_IFACE: &str = "org.freedesktop.GeoClue2.Client";
const GEOCLUE_LOCATION_IFACE: &str = "org.freedesktop.GeoClue2.Location";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
const DESKTOP_ID: &str = "geokit";

/// GeoClue accuracy level for a requested accuracy.
const fn accuracy_level(accuracy: Accuracy) -> u32 {
    match accuracy {
        Accuracy::Lowest => 1,
        Accuracy::Low => 4,
        Accuracy::Balanced => 5,
        Accuracy::High => 6,
        Accuracy::Highest | Accuracy::BestForNavigation => 8,
    }
}

fn unknown(context: &str) -> impl Fn(zbus::Error) -> LocationError + '_ {
    move |e| LocationError::Unknown(format!("{context}: {e}"))
}

async fn set_client_property(
    connection: &Connection,
    client_path: &OwnedObjectPath,
    property: &str,
    value: Value<'_>,
) -> Result<(), LocationError> {
    connection
        .call_method(
            Some(GEOCLUE_BUS),
            client_path.as_str(),
            Some(PROPERTIES_IFACE),
            "Set",
            &(GEOCLUE_CLIENT_IFACE, property, value),
        )
        .await
        .map(drop)
        .map_err(unknown(property))
}

pub(crate) async fn get_location(config: &WatchConfig) -> Result<Reading, LocationError> {
    let connection = Connection::system()
        .await
        .map_err(unknown("D-Bus connection failed"))?;

    let (client_path,): (OwnedObjectPath,) = connection
        .call_method(
            Some(GEOCLUE_BUS),
            GEOCLUE_MANAGER_PATH,
            Some(GEOCLUE_MANAGER_IFACE),
            "GetClient",
            &(),
        )
        .await
        .map_err(|_| LocationError::ServiceDisabled)?
        .body()
        .deserialize()
        .map_err(unknown("failed to parse client path"))?;

    // GeoClue refuses to start clients without a desktop id
    set_client_property(&connection, &client_path, "DesktopId", Value::from(DESKTOP_ID)).await?;
    set_client_property(
        &connection,
        &client_path,
        "RequestedAccuracyLevel",
        Value::from(accuracy_level(config.accuracy)),
    )
    .await?;
    // Whole meters; negative or fractional thresholds round towards zero
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let threshold = config.min_distance_meters.max(0.0) as u32;
    set_client_property(
        &connection,
        &client_path,
        "DistanceThreshold",
        Value::from(threshold),
    )
    .await?;

    connection
        .call_method(
            Some(GEOCLUE_BUS),
            client_path.as_str(),
            Some(GEOCLUE_CLIENT_IFACE),
            "Start",
            &(),
        )
        .await
        .map_err(|e| match e {
            zbus::Error::MethodError(ref name, ..) if name.as_str().ends_with("AccessDenied") => {
                LocationError::PermissionDenied
            }
            e => unknown("failed to start GeoClue client")(e),
        })?;

    let result = read_location(&connection, &client_path).await;

    let _ = connection
        .call_method(
            Some(GEOCLUE_BUS),
            client_path.as_str(),
            Some(GEOCLUE_CLIENT_IFACE),
            "Stop",
            &(),
        )
        .await;

    result
}

async fn read_location(
    connection: &Connection,
    client_path: &OwnedObjectPath,
) -> Result<Reading, LocationError> {
    let location_reply: OwnedValue = connection
        .call_method(
            Some(GEOCLUE_BUS),
            client_path.as_str(),
            Some(PROPERTIES_IFACE),
            "Get",
            &(GEOCLUE_CLIENT_IFACE, "Location"),
        )
        .await
        .map_err(unknown("failed to get location"))?
        .body()
        .deserialize()
        .map_err(unknown("failed to parse location path"))?;

    let location_path: OwnedObjectPath = location_reply
        .downcast_ref::<ObjectPath>()
        .map(|p| p.to_owned().into())
        .map_err(|_| LocationError::NotAvailable)?;

    // GeoClue publishes "/" until it has a first fix
    if location_path.as_str() == "/" {
        return Err(LocationError::NotAvailable);
    }

    let get_property = |prop: &'static str| {
        let location_path = &location_path;
        async move {
            let reply: OwnedValue = connection
                .call_method(
                    Some(GEOCLUE_BUS),
                    location_path.as_str(),
                    Some(PROPERTIES_IFACE),
                    "Get",
                    &(GEOCLUE_LOCATION_IFACE, prop),
                )
                .await?
                .body()
                .deserialize()?;
            Ok::<f64, zbus::Error>(reply.downcast_ref::<f64>().unwrap_or(f64::NAN))
        }
    };

    let latitude = get_property("Latitude")
        .await
        .map_err(unknown("failed to get latitude"))?;
    let longitude = get_property("Longitude")
        .await
        .map_err(unknown("failed to get longitude"))?;

    // Optional fields; GeoClue reports unknown speed and heading as -1
    let known = |value: Option<f64>| value.filter(|v| v.is_finite() && *v >= 0.0);
    let altitude = get_property("Altitude")
        .await
        .ok()
        .filter(|v| v.is_finite() && *v > -f64::MAX);
    let accuracy = known(get_property("Accuracy").await.ok());
    let speed = known(get_property("Speed").await.ok());
    let heading = known(get_property("Heading").await.ok());

    Ok(Reading {
        coords: Coordinates {
            latitude,
            longitude,
            altitude,
            speed,
            accuracy,
            heading,
        },
        timestamp: super::timestamp_now(),
    })
}
