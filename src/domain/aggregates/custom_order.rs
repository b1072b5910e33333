//! Custom clothing order lifecycle and pricing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a design-to-garment request.
///
/// `pending → {approved, rejected}`; `approved → processing → shipped →
/// delivered`; `cancelled` is reachable from any non-terminal state. Every
/// status mutation goes through [`CustomOrderStatus::transition`], so the
/// legality rules are the same whether an order is approved, rejected, or
/// moved by the generic status endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomOrderStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl CustomOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Delivered | Self::Cancelled)
    }

    pub fn can_transition(self, to: Self) -> bool {
        use CustomOrderStatus::*;
        match (self, to) {
            (Pending, Approved) | (Pending, Rejected) => true,
            (Approved, Processing) => true,
            (Processing, Shipped) => true,
            (Shipped, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn transition(self, to: Self) -> Result<Self, TransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self.as_str(), to: to.as_str() })
        }
    }
}

impl fmt::Display for CustomOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CustomOrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

impl std::error::Error for TransitionError {}
impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal transition from '{}' to '{}'", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status '{}'", self.0)
    }
}

/// Base price per garment type. Unknown types fall back to 30.00.
pub fn base_price(clothing_type: &str) -> Decimal {
    match clothing_type {
        "tshirt" => dec!(25.99),
        "dress" => dec!(45.99),
        "pants" => dec!(35.99),
        "jacket" => dec!(55.99),
        _ => dec!(30.00),
    }
}

pub fn quote_price(clothing_type: &str, quantity: i32) -> Decimal {
    base_price(clothing_type) * Decimal::from(quantity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use CustomOrderStatus::*;

    #[test]
    fn price_table() {
        assert_eq!(base_price("tshirt"), dec!(25.99));
        assert_eq!(base_price("dress"), dec!(45.99));
        assert_eq!(base_price("pants"), dec!(35.99));
        assert_eq!(base_price("jacket"), dec!(55.99));
        assert_eq!(base_price("kimono"), dec!(30.00));
    }

    #[test]
    fn quote_multiplies_by_quantity() {
        assert_eq!(quote_price("dress", 2), dec!(91.98));
        assert_eq!(quote_price("tshirt", 1), dec!(25.99));
        // Non-positive quantities are treated as a single garment.
        assert_eq!(quote_price("jacket", 0), dec!(55.99));
    }

    #[test]
    fn happy_path_transitions() {
        assert_eq!(Pending.transition(Approved), Ok(Approved));
        assert_eq!(Approved.transition(Processing), Ok(Processing));
        assert_eq!(Processing.transition(Shipped), Ok(Shipped));
        assert_eq!(Shipped.transition(Delivered), Ok(Delivered));
    }

    #[test]
    fn reject_only_from_pending() {
        assert!(Pending.can_transition(Rejected));
        assert!(!Approved.can_transition(Rejected));
        assert!(!Delivered.can_transition(Rejected));
    }

    #[test]
    fn cancel_from_any_live_state() {
        for from in [Pending, Approved, Processing, Shipped] {
            assert!(from.can_transition(Cancelled), "{from} should cancel");
        }
        for from in [Rejected, Delivered, Cancelled] {
            assert!(!from.can_transition(Cancelled), "{from} is terminal");
        }
    }

    #[test]
    fn no_backwards_moves() {
        assert!(!Delivered.can_transition(Pending));
        assert!(!Shipped.can_transition(Processing));
        assert!(!Approved.can_transition(Pending));
    }

    #[test]
    fn status_round_trip() {
        for s in [Pending, Approved, Rejected, Processing, Shipped, Delivered, Cancelled] {
            assert_eq!(s.as_str().parse::<CustomOrderStatus>(), Ok(s));
        }
        assert!("paused".parse::<CustomOrderStatus>().is_err());
    }
}
