//! Promotion discount arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

/// A discount rule holds exactly one of a flat value or a percentage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Discount {
    Flat(Decimal),
    Percentage(Decimal),
}

impl Discount {
    /// Resolves the two optional columns into a single rule, rejecting
    /// records where both or neither are set.
    pub fn from_fields(
        discount_value: Option<Decimal>,
        discount_percentage: Option<Decimal>,
    ) -> Result<Self, DiscountError> {
        match (discount_value, discount_percentage) {
            (Some(v), None) => {
                if v < Decimal::ZERO {
                    return Err(DiscountError::Negative);
                }
                Ok(Self::Flat(v))
            }
            (None, Some(p)) => {
                if p < Decimal::ZERO || p > dec!(100) {
                    return Err(DiscountError::PercentageOutOfRange);
                }
                Ok(Self::Percentage(p))
            }
            (Some(_), Some(_)) => Err(DiscountError::BothSet),
            (None, None) => Err(DiscountError::NeitherSet),
        }
    }

    /// Price after applying the discount. Flat discounts floor at zero.
    pub fn apply(&self, base: Decimal) -> Decimal {
        match self {
            Self::Flat(v) => (base - v).max(Decimal::ZERO),
            Self::Percentage(p) => base * (dec!(100) - p) / dec!(100),
        }
    }
}

/// Effective price for a purchase, honoring the validity window and the
/// minimum-purchase threshold. Inapplicable promotions leave the base
/// price unchanged.
pub fn discounted_price(
    base: Decimal,
    discount: Discount,
    valid_until: DateTime<Utc>,
    min_purchase: Option<Decimal>,
    now: DateTime<Utc>,
) -> Decimal {
    if now > valid_until {
        return base;
    }
    if let Some(min) = min_purchase {
        if base < min {
            return base;
        }
    }
    discount.apply(base)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    BothSet,
    NeitherSet,
    Negative,
    PercentageOutOfRange,
}

impl std::error::Error for DiscountError {}
impl fmt::Display for DiscountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothSet => write!(f, "discount value and percentage are mutually exclusive"),
            Self::NeitherSet => write!(f, "either a discount value or a percentage is required"),
            Self::Negative => write!(f, "discount value must not be negative"),
            Self::PercentageOutOfRange => write!(f, "discount percentage must be between 0 and 100"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn exactly_one_field() {
        assert_eq!(
            Discount::from_fields(Some(dec!(5)), None),
            Ok(Discount::Flat(dec!(5)))
        );
        assert_eq!(
            Discount::from_fields(None, Some(dec!(20))),
            Ok(Discount::Percentage(dec!(20)))
        );
        assert_eq!(
            Discount::from_fields(Some(dec!(5)), Some(dec!(20))),
            Err(DiscountError::BothSet)
        );
        assert_eq!(Discount::from_fields(None, None), Err(DiscountError::NeitherSet));
    }

    #[test]
    fn flat_floors_at_zero() {
        assert_eq!(Discount::Flat(dec!(10)).apply(dec!(45.99)), dec!(35.99));
        assert_eq!(Discount::Flat(dec!(50)).apply(dec!(45.99)), Decimal::ZERO);
    }

    #[test]
    fn percentage_is_exact() {
        assert_eq!(Discount::Percentage(dec!(20)).apply(dec!(50)), dec!(40));
        assert_eq!(Discount::Percentage(dec!(100)).apply(dec!(50)), Decimal::ZERO);
        assert_eq!(Discount::Percentage(Decimal::ZERO).apply(dec!(50)), dec!(50));
    }

    #[test]
    fn expired_or_below_minimum_keeps_base() {
        let now = Utc::now();
        let expired = now - Duration::days(1);
        let live = now + Duration::days(7);
        let pct = Discount::Percentage(dec!(10));
        assert_eq!(discounted_price(dec!(100), pct, expired, None, now), dec!(100));
        assert_eq!(
            discounted_price(dec!(100), pct, live, Some(dec!(150)), now),
            dec!(100)
        );
        assert_eq!(
            discounted_price(dec!(100), pct, live, Some(dec!(50)), now),
            dec!(90)
        );
    }
}
