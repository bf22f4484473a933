//! Location resolution.
//!
//! Turns a typed pincode or a device position into a [`LocationState`]
//! and keeps the saved state honest: a saved pincode is re-checked against
//! the backend once per session (and always once it is older than the
//! configured max age).

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use freshcart_core::{DeliveryMode, Pincode, PincodeError};

use crate::backend::{BackendClient, BackendError};
use crate::config::LocationConfig;
use crate::models::{Coordinates, LocationState};
use crate::storage::{ClientStore, StorageError};

/// Errors from location operations.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Invalid pincode: {0}")]
    InvalidPincode(#[from] PincodeError),

    #[error("Invalid coordinates")]
    InvalidCoordinates,

    #[error("Could not detect your location in time")]
    DetectionTimedOut,

    #[error("Local delivery is not available for this location")]
    NoLocalDelivery,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Progress of an automatic detection, observable while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionPhase {
    Detecting,
    /// Soft deadline passed; the UI should offer manual entry. The lookup
    /// keeps running.
    ManualEntrySuggested,
    Detected,
    Failed,
}

impl DetectionPhase {
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Detected | Self::Failed)
    }
}

/// Resolves and maintains the visitor's location.
#[derive(Clone)]
pub struct LocationResolver {
    backend: BackendClient,
    config: LocationConfig,
}

impl LocationResolver {
    #[must_use]
    pub const fn new(backend: BackendClient, config: LocationConfig) -> Self {
        Self { backend, config }
    }

    #[must_use]
    pub const fn config(&self) -> LocationConfig {
        self.config
    }

    /// Apply a pincode typed by the visitor.
    ///
    /// The pincode is validated before anything is sent to the backend.
    /// On failure the previously saved state is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPincode` for malformed input, or the backend error if
    /// the pincode could not be checked.
    #[instrument(skip(self, store))]
    pub async fn set_user_pincode(
        &self,
        store: &ClientStore,
        raw: &str,
    ) -> Result<LocationState, LocationError> {
        let pincode = Pincode::parse(raw)?;
        self.apply(store, pincode, false).await
    }

    /// Detect the visitor's pincode from a device position.
    ///
    /// Runs under two deadlines. Past the soft one `progress` moves to
    /// [`DetectionPhase::ManualEntrySuggested`] and the lookup carries on;
    /// past the hard one the attempt fails. The attempt is recorded so the
    /// storefront does not try again on its own.
    ///
    /// # Errors
    ///
    /// Returns `DetectionTimedOut` after the hard deadline, or whatever the
    /// lookup itself failed with.
    #[instrument(skip(self, store, progress))]
    pub async fn detect_location(
        &self,
        store: &ClientStore,
        position: Coordinates,
        progress: &watch::Sender<DetectionPhase>,
    ) -> Result<LocationState, LocationError> {
        store.mark_auto_detection_attempted().await?;

        if !position.is_valid() {
            progress.send_replace(DetectionPhase::Failed);
            return Err(LocationError::InvalidCoordinates);
        }

        let result = race_deadlines(self.lookup(store, position), self.config, progress).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Location detection failed");
        }
        result
    }

    /// The saved location, revalidated if needed.
    ///
    /// A saved pincode is checked with the backend once per session, or
    /// again whenever the saved state is older than the max age. A failed
    /// check clears the saved state; it is not retried.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    #[instrument(skip(self, store))]
    pub async fn load(&self, store: &ClientStore) -> Result<Option<LocationState>, LocationError> {
        let Some(saved) = store.location().await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let stale = saved.is_stale(now, self.config.max_age);
        if !stale && store.location_revalidated().await? {
            return Ok(Some(saved));
        }

        let Some(pincode) = saved.pincode.clone() else {
            store.mark_location_revalidated().await?;
            return Ok(Some(saved));
        };

        match self.backend.check_pincode(&pincode).await {
            Ok(check) => {
                let state = saved.refreshed(pincode, check, now);
                store.save_location(&state).await?;
                store.mark_location_revalidated().await?;
                Ok(Some(state))
            }
            Err(e) => {
                tracing::info!(error = %e, pincode = %pincode, "Saved pincode failed revalidation, clearing");
                store.clear_location().await?;
                Ok(None)
            }
        }
    }

    /// Switch between global fulfilment and the local warehouse.
    ///
    /// # Errors
    ///
    /// Returns `NoLocalDelivery` when leaving global mode without a local
    /// warehouse to fall back on.
    #[instrument(skip(self, store))]
    pub async fn set_global_mode(
        &self,
        store: &ClientStore,
        enabled: bool,
    ) -> Result<LocationState, LocationError> {
        let mut state = match store.location().await? {
            Some(state) => state,
            None => LocationState {
                saved_at: Utc::now(),
                ..LocationState::default()
            },
        };

        if !enabled && state.delivery_mode != DeliveryMode::Custom {
            return Err(LocationError::NoLocalDelivery);
        }

        state.is_global_mode = enabled;
        store.save_location(&state).await?;
        Ok(state)
    }

    /// Remember that the visitor closed the location modal.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn dismiss_modal(&self, store: &ClientStore) -> Result<(), LocationError> {
        store.mark_location_modal_dismissed().await?;
        Ok(())
    }

    /// Forget the saved location.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(&self, store: &ClientStore) -> Result<(), LocationError> {
        store.clear_location().await?;
        Ok(())
    }

    async fn lookup(
        &self,
        store: &ClientStore,
        position: Coordinates,
    ) -> Result<LocationState, LocationError> {
        let resolved = self
            .backend
            .reverse_geocode(position.lat, position.lng)
            .await?;
        let pincode = Pincode::parse(resolved.pincode.trim())?;
        self.apply(store, pincode, true).await
    }

    async fn apply(
        &self,
        store: &ClientStore,
        pincode: Pincode,
        detected: bool,
    ) -> Result<LocationState, LocationError> {
        let check = self.backend.check_pincode(&pincode).await?;
        let state = LocationState::from_check(pincode, check, detected, Utc::now());

        if state.is_disabled() {
            tracing::info!(pincode = ?state.pincode, "Local delivery paused for pincode");
        }

        store.save_location(&state).await?;
        store.mark_location_revalidated().await?;
        Ok(state)
    }
}

/// Run `lookup` under the soft and hard detection deadlines.
async fn race_deadlines<T>(
    lookup: impl Future<Output = Result<T, LocationError>>,
    config: LocationConfig,
    progress: &watch::Sender<DetectionPhase>,
) -> Result<T, LocationError> {
    tokio::pin!(lookup);
    let soft = tokio::time::sleep(config.soft_timeout);
    let hard = tokio::time::sleep(config.hard_timeout);
    tokio::pin!(soft);
    tokio::pin!(hard);

    let mut soft_passed = false;
    loop {
        tokio::select! {
            result = &mut lookup => {
                let phase = if result.is_ok() {
                    DetectionPhase::Detected
                } else {
                    DetectionPhase::Failed
                };
                progress.send_replace(phase);
                return result;
            }
            () = &mut soft, if !soft_passed => {
                soft_passed = true;
                progress.send_replace(DetectionPhase::ManualEntrySuggested);
            }
            () = &mut hard => {
                progress.send_replace(DetectionPhase::Failed);
                return Err(LocationError::DetectionTimedOut);
            }
        }
    }
}

/// Running detections, one per visitor.
///
/// Lets a later request see how a detection that outlived its original
/// request is getting on.
#[derive(Clone, Default)]
pub struct DetectionTracker {
    inner: Arc<Mutex<HashMap<String, watch::Receiver<DetectionPhase>>>>,
}

impl DetectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a detection for `visitor`, replacing any older one.
    pub fn track(&self, visitor: &str) -> watch::Sender<DetectionPhase> {
        let (tx, rx) = watch::channel(DetectionPhase::Detecting);
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(visitor.to_string(), rx);
        tx
    }

    /// Current phase for `visitor`. Finished detections are forgotten once
    /// reported.
    #[must_use]
    pub fn phase(&self, visitor: &str) -> Option<DetectionPhase> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let phase = *map.get(visitor)?.borrow();
        if phase.is_finished() {
            map.remove(visitor);
        }
        Some(phase)
    }
}
