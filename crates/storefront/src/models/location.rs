//! Visitor location state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freshcart_core::{DeliveryMode, Pincode};

use crate::backend::{PincodeCheck, WarehouseSummary};

/// Customer position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Whether both values are finite and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Where the visitor is and how their orders will be fulfilled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationState {
    pub pincode: Option<Pincode>,
    /// True when the pincode came from geolocation rather than typing.
    pub is_location_detected: bool,
    pub delivery_mode: DeliveryMode,
    pub delivery_message: String,
    pub matched_warehouse: Option<WarehouseSummary>,
    /// Visitor chose global fulfilment even if a local warehouse exists.
    pub is_global_mode: bool,
    pub saved_at: DateTime<Utc>,
}

impl Default for LocationState {
    fn default() -> Self {
        Self {
            pincode: None,
            is_location_detected: false,
            delivery_mode: DeliveryMode::Global,
            delivery_message: String::new(),
            matched_warehouse: None,
            is_global_mode: false,
            saved_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl LocationState {
    /// State after the backend accepted a pincode.
    #[must_use]
    pub fn from_check(
        pincode: Pincode,
        check: PincodeCheck,
        detected: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            pincode: Some(pincode),
            is_location_detected: detected,
            is_global_mode: check.mode == DeliveryMode::Global,
            delivery_mode: check.mode,
            delivery_message: check.message,
            matched_warehouse: check.warehouse,
            saved_at: now,
        }
    }

    /// Apply a fresh backend answer for the saved pincode.
    ///
    /// Keeps how the pincode was obtained and an explicit global-mode choice.
    #[must_use]
    pub fn refreshed(&self, pincode: Pincode, check: PincodeCheck, now: DateTime<Utc>) -> Self {
        let mut state = Self::from_check(pincode, check, self.is_location_detected, now);
        state.is_global_mode |= self.is_global_mode;
        state
    }

    /// Whether the saved state is older than `max_age`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now.signed_duration_since(self.saved_at) > max_age
    }

    /// Whether shopping is blocked behind the "delivery paused" overlay.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.delivery_mode.is_disabled()
    }

    /// Pincode to use for warehouse-scoped listings, if any.
    ///
    /// `None` in global mode, when the local warehouse is disabled, or when
    /// no pincode is known.
    #[must_use]
    pub fn custom_pincode(&self) -> Option<&Pincode> {
        match self.delivery_mode {
            DeliveryMode::Custom if !self.is_global_mode => self.pincode.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use freshcart_core::WarehouseId;

    use super::*;

    fn check(mode: DeliveryMode) -> PincodeCheck {
        PincodeCheck {
            mode,
            message: "Delivery in 30 minutes".to_string(),
            warehouse: Some(WarehouseSummary {
                id: WarehouseId::new("W1"),
                name: "Koramangala".to_string(),
            }),
        }
    }

    #[test]
    fn test_refresh_keeps_global_choice() {
        let pincode = Pincode::parse("560034").unwrap();
        let saved = LocationState {
            pincode: Some(pincode.clone()),
            is_location_detected: true,
            delivery_mode: DeliveryMode::Custom,
            is_global_mode: true,
            ..LocationState::default()
        };

        let now = Utc::now();
        let state = saved.refreshed(pincode, check(DeliveryMode::Custom), now);
        assert!(state.is_global_mode);
        assert!(state.is_location_detected);
        assert_eq!(state.saved_at, now);
        assert!(state.custom_pincode().is_none());
    }

    #[test]
    fn test_refresh_follows_backend_when_no_choice_was_made() {
        let pincode = Pincode::parse("560034").unwrap();
        let saved = LocationState {
            pincode: Some(pincode.clone()),
            delivery_mode: DeliveryMode::Global,
            ..LocationState::default()
        };

        let state = saved.refreshed(pincode, check(DeliveryMode::Custom), Utc::now());
        assert!(!state.is_global_mode);
        assert_eq!(state.delivery_mode, DeliveryMode::Custom);
    }

    #[test]
    fn test_from_check_custom() {
        let now = Utc::now();
        let state = LocationState::from_check(
            Pincode::parse("560034").unwrap(),
            check(DeliveryMode::Custom),
            false,
            now,
        );

        assert!(!state.is_global_mode);
        assert_eq!(state.custom_pincode().map(Pincode::as_str), Some("560034"));
        assert_eq!(state.saved_at, now);
    }

    #[test]
    fn test_disabled_is_distinct_from_global() {
        let state = LocationState::from_check(
            Pincode::parse("560034").unwrap(),
            check(DeliveryMode::CustomDisabled),
            true,
            Utc::now(),
        );

        assert!(state.is_disabled());
        assert!(!state.is_global_mode);
        assert!(state.custom_pincode().is_none());
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates { lat: 19.07, lng: 72.87 }.is_valid());
        assert!(!Coordinates { lat: 91.0, lng: 0.0 }.is_valid());
        assert!(!Coordinates { lat: 0.0, lng: f64::NAN }.is_valid());
    }

    #[test]
    fn test_staleness() {
        let now = Utc::now();
        let state = LocationState {
            saved_at: now - chrono::Duration::hours(25),
            ..LocationState::default()
        };
        assert!(state.is_stale(now, chrono::Duration::hours(24)));
        assert!(!state.is_stale(now, chrono::Duration::hours(48)));
    }

    #[test]
    fn test_round_trips_through_json() {
        let state = LocationState::from_check(
            Pincode::parse("110001").unwrap(),
            check(DeliveryMode::Custom),
            true,
            Utc::now(),
        );
        let json = serde_json::to_string(&state).unwrap();
        let back: LocationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
