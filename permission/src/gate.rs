use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::{PermissionError, PermissionProvider, PermissionState};

/// Resolves location permission once at startup and remembers the answer.
///
/// The gate may be asked again after an explicit user action; each call
/// re-queries the provider and records its new answer.
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    state: Mutex<PermissionState>,
}

impl PermissionGate {
    /// Creates a gate in the [`PermissionState::Unrequested`] state.
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(PermissionState::Unrequested),
        }
    }

    /// Asks the provider for location permission and records the outcome.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the stored state is left unchanged.
    pub async fn request(&self) -> Result<PermissionState, PermissionError> {
        let status = match self.provider.request_permission().await {
            Ok(status) => status,
            Err(err) => {
                warn!("location permission request failed: {err}");
                return Err(err);
            }
        };

        let state = PermissionState::from(status);
        info!("location permission resolved: {status:?} -> {state:?}");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        Ok(state)
    }

    /// Returns the last recorded permission state.
    #[must_use]
    pub fn state(&self) -> PermissionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` once the provider has granted permission.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.state() == PermissionState::Granted
    }
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
