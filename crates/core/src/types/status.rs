//! Delivery and payment enums shared between the storefront and the CLI.

use serde::{Deserialize, Serialize};

/// How orders for the visitor's location are fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    /// A warehouse local to the pincode serves it.
    Custom,
    /// No local warehouse; the default longer-lead-time path is used.
    #[default]
    Global,
    /// A local warehouse exists but is currently switched off.
    CustomDisabled,
}

impl DeliveryMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Global => "global",
            Self::CustomDisabled => "custom-disabled",
        }
    }

    /// Whether the storefront should block shopping behind an overlay.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        matches!(self, Self::CustomDisabled)
    }
}

/// Payment method chosen at checkout. Affects the delivery charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Online,
    Cod,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Cod => "cod",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "cod" => Ok(Self::Cod),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Discount kind carried by a promocode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percentage,
    Fixed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_mode_wire_names() {
        let mode: DeliveryMode = serde_json::from_str("\"custom-disabled\"").unwrap();
        assert_eq!(mode, DeliveryMode::CustomDisabled);
        assert!(mode.is_disabled());
        assert_eq!(
            serde_json::to_string(&DeliveryMode::Custom).unwrap(),
            "\"custom\""
        );
        assert!(!DeliveryMode::Global.is_disabled());
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("COD".parse::<PaymentMethod>(), Ok(PaymentMethod::Cod));
        assert_eq!("online".parse::<PaymentMethod>(), Ok(PaymentMethod::Online));
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}
