//! Value objects shared across the commerce domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived shelf-health indicator. Always recomputed from quantity and
/// reorder threshold, never set independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn derive(quantity: i32, reorder_threshold: i32) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= reorder_threshold {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in-stock",
            Self::LowStock => "low-stock",
            Self::OutOfStock => "out-of-stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer contact details embedded into orders at write time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Delivery destination embedded into orders at write time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

const FALLBACK: &str = "Not provided";

fn or_fallback(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => FALLBACK.to_string(),
    }
}

impl CustomerInfo {
    /// Builds a snapshot, substituting "Not provided" for missing sub-fields.
    pub fn snapshot(name: Option<String>, email: Option<String>, phone: Option<String>) -> Self {
        Self {
            name: or_fallback(name),
            email: or_fallback(email),
            phone: or_fallback(phone),
        }
    }
}

impl Default for CustomerInfo {
    fn default() -> Self {
        Self::snapshot(None, None, None)
    }
}

impl DeliveryInfo {
    pub fn snapshot(
        address: Option<String>,
        city: Option<String>,
        postal_code: Option<String>,
        country: Option<String>,
    ) -> Self {
        Self {
            address: or_fallback(address),
            city: or_fallback(city),
            postal_code: or_fallback(postal_code),
            country: or_fallback(country),
        }
    }
}

impl Default for DeliveryInfo {
    fn default() -> Self {
        Self::snapshot(None, None, None, None)
    }
}

/// One order line, denormalized at order-creation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: String,
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
    pub size: String,
    pub color: String,
    pub image: String,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(StockStatus::derive(0, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::derive(-3, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::derive(1, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(5, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(6, 5), StockStatus::InStock);
    }

    #[test]
    fn stock_status_zero_threshold() {
        assert_eq!(StockStatus::derive(1, 0), StockStatus::InStock);
        assert_eq!(StockStatus::derive(0, 0), StockStatus::OutOfStock);
    }

    #[test]
    fn snapshot_fallbacks() {
        let c = CustomerInfo::snapshot(Some("Ada".into()), None, Some("  ".into()));
        assert_eq!(c.name, "Ada");
        assert_eq!(c.email, "Not provided");
        assert_eq!(c.phone, "Not provided");
    }

    #[test]
    fn line_total() {
        let line = OrderLine {
            item_id: "1".into(),
            title: "Denim Jacket".into(),
            quantity: 3,
            price: dec!(55.99),
            size: "L".into(),
            color: "blue".into(),
            image: "uploads/inventory/jacket.png".into(),
        };
        assert_eq!(line.line_total(), dec!(167.97));
    }
}
