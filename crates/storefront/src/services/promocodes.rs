//! Promocode suggestions for the cart.
//!
//! The backend already applies minimum-order and category rules. On top of
//! that the storefront keeps only codes active right now, shows the three
//! most valuable, and nudges towards the nearest almost-applicable code.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use freshcart_core::{Money, UserId};

use crate::backend::{BackendClient, CartItem, PromoCode, PromoCodeLists};

/// Number of applicable codes shown.
pub const MAX_SUGGESTIONS: usize = 3;

/// What the cart page offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoSuggestions {
    pub available: Vec<PromoCode>,
    /// The code closest to becoming applicable, if any.
    pub almost_available: Option<PromoCode>,
}

/// Whether a code is usable at `now`.
///
/// Excluded when flagged inactive, before its start, or after its end.
/// Missing bounds are open.
#[must_use]
pub fn is_active(promo: &PromoCode, now: DateTime<Utc>) -> bool {
    if promo.is_active == Some(false) {
        return false;
    }
    if promo.start_date.is_some_and(|start| now < start) {
        return false;
    }
    if promo.end_date.is_some_and(|end| now > end) {
        return false;
    }
    true
}

/// Turn the backend's lists into suggestions.
#[must_use]
pub fn select(lists: PromoCodeLists, now: DateTime<Utc>) -> PromoSuggestions {
    let mut available: Vec<PromoCode> = lists
        .available
        .into_iter()
        .filter(|promo| is_active(promo, now))
        .collect();
    // Stable sort keeps backend order among equal discounts
    available.sort_by(|a, b| b.potential_discount.cmp(&a.potential_discount));
    available.truncate(MAX_SUGGESTIONS);

    let almost_available = lists
        .almost_available
        .into_iter()
        .filter(|promo| promo.amount_needed.is_some_and(|needed| needed > Money::ZERO))
        .min_by_key(|promo| promo.amount_needed.unwrap_or(Money::MAX));

    PromoSuggestions {
        available,
        almost_available,
    }
}

/// Fetches and filters promocode suggestions.
#[derive(Clone)]
pub struct PromoCodeService {
    backend: BackendClient,
}

impl PromoCodeService {
    #[must_use]
    pub const fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Suggestions for the current cart.
    ///
    /// A backend failure yields no suggestions; promocodes are optional and
    /// must never break the cart page.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn suggestions(
        &self,
        cart_total: Money,
        user_id: Option<&UserId>,
        items: &[CartItem],
    ) -> PromoSuggestions {
        if items.is_empty() {
            return PromoSuggestions::default();
        }

        match self
            .backend
            .available_promocodes(cart_total, user_id, items)
            .await
        {
            Ok(lists) => select(lists, Utc::now()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch promocodes");
                PromoSuggestions::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use freshcart_core::DiscountType;

    use super::*;

    fn promo(code: &str, discount: i64) -> PromoCode {
        PromoCode {
            code: code.to_string(),
            description: None,
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::from(discount),
            potential_discount: Decimal::from(discount),
            amount_needed: None,
            min_order_value: None,
            is_active: None,
            start_date: None,
            end_date: None,
        }
    }

    fn almost(code: &str, needed: Option<i64>) -> PromoCode {
        PromoCode {
            amount_needed: needed.map(Decimal::from),
            ..promo(code, 50)
        }
    }

    #[test]
    fn test_inactive_flag_excludes() {
        let now = Utc::now();
        let p = PromoCode {
            is_active: Some(false),
            ..promo("OFF", 10)
        };
        assert!(!is_active(&p, now));
        assert!(is_active(&promo("ON", 10), now));
    }

    #[test]
    fn test_date_window() {
        let now = Utc::now();
        let future = PromoCode {
            start_date: Some(now + Duration::days(1)),
            ..promo("SOON", 10)
        };
        let expired = PromoCode {
            end_date: Some(now - Duration::seconds(1)),
            ..promo("GONE", 10)
        };
        let current = PromoCode {
            start_date: Some(now - Duration::days(1)),
            end_date: Some(now + Duration::days(1)),
            ..promo("NOW", 10)
        };

        assert!(!is_active(&future, now));
        assert!(!is_active(&expired, now));
        assert!(is_active(&current, now));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc::now();
        let edge = PromoCode {
            start_date: Some(now),
            end_date: Some(now),
            ..promo("EDGE", 10)
        };
        assert!(is_active(&edge, now));
    }

    #[test]
    fn test_select_sorts_and_caps() {
        let lists = PromoCodeLists {
            available: vec![
                promo("A", 10),
                promo("B", 40),
                promo("C", 25),
                promo("D", 5),
                promo("E", 30),
            ],
            almost_available: vec![],
        };

        let picked = select(lists, Utc::now());
        let codes: Vec<&str> = picked.available.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, ["B", "E", "C"]);
    }

    #[test]
    fn test_select_filters_before_capping() {
        let now = Utc::now();
        let lists = PromoCodeLists {
            available: vec![
                PromoCode {
                    is_active: Some(false),
                    ..promo("BIG", 100)
                },
                promo("A", 10),
            ],
            almost_available: vec![],
        };

        let picked = select(lists, now);
        assert_eq!(picked.available.len(), 1);
        assert_eq!(picked.available[0].code, "A");
    }

    #[test]
    fn test_almost_available_picks_smallest_positive_gap() {
        let lists = PromoCodeLists {
            available: vec![],
            almost_available: vec![
                almost("FAR", Some(300)),
                almost("ZERO", Some(0)),
                almost("NONE", None),
                almost("NEAR", Some(40)),
                almost("MID", Some(120)),
            ],
        };

        let picked = select(lists, Utc::now());
        assert_eq!(
            picked.almost_available.map(|p| p.code),
            Some("NEAR".to_string())
        );
    }

    #[test]
    fn test_almost_available_none_when_no_positive_gap() {
        let lists = PromoCodeLists {
            available: vec![],
            almost_available: vec![almost("ZERO", Some(0)), almost("NEG", Some(-5))],
        };
        assert!(select(lists, Utc::now()).almost_available.is_none());
    }
}
