use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::{entity::coupons, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percent,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "percent",
            DiscountType::Fixed => "fixed",
        }
    }

    pub fn validate_value(self, value: i64) -> Result<(), AppError> {
        match self {
            DiscountType::Percent if !(1..=100).contains(&value) => Err(AppError::BadRequest(
                "percent discount must be between 1 and 100".into(),
            )),
            DiscountType::Fixed if value <= 0 => Err(AppError::BadRequest(
                "fixed discount must be greater than 0".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percent" => Ok(DiscountType::Percent),
            "fixed" => Ok(DiscountType::Fixed),
            _ => Err(AppError::BadRequest(format!("Invalid discount type: {s}"))),
        }
    }
}

/// Highest unit price or compare-at price a product may carry.
pub const MAX_PRICE: i64 = 10_000_000_000;

/// `amount * percent / 100`, with `percent` clamped to 0..=100. Computed in i128
/// so large amounts cannot overflow.
fn percent_of(amount: i64, percent: i64) -> i64 {
    (i128::from(amount) * i128::from(percent.clamp(0, 100)) / 100) as i64
}

/// Amount taken off `subtotal`. Never exceeds the subtotal.
pub fn coupon_discount(kind: DiscountType, value: i64, subtotal: i64) -> i64 {
    let subtotal = subtotal.max(0);
    match kind {
        DiscountType::Percent => percent_of(subtotal, value),
        DiscountType::Fixed => value.clamp(0, subtotal),
    }
}

/// Why a coupon cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponRejection {
    Inactive,
    NotStarted,
    Expired,
    UsageLimitReached,
    MinimumNotMet { min_order_amount: i64 },
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponRejection::Inactive => f.write_str("coupon is not active"),
            CouponRejection::NotStarted => f.write_str("coupon is not yet valid"),
            CouponRejection::Expired => f.write_str("coupon has expired"),
            CouponRejection::UsageLimitReached => f.write_str("coupon usage limit reached"),
            CouponRejection::MinimumNotMet { min_order_amount } => {
                write!(f, "minimum order amount is {min_order_amount}")
            }
        }
    }
}

impl From<CouponRejection> for AppError {
    fn from(value: CouponRejection) -> Self {
        AppError::BadRequest(value.to_string())
    }
}

/// Check a coupon against a subtotal and return the discount it grants.
pub fn evaluate_coupon(
    coupon: &coupons::Model,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<i64, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if coupon.starts_at.is_some_and(|starts| now < starts) {
        return Err(CouponRejection::NotStarted);
    }
    if coupon.expires_at.is_some_and(|expires| now >= expires) {
        return Err(CouponRejection::Expired);
    }
    if coupon
        .max_uses
        .is_some_and(|max| coupon.used_count >= max)
    {
        return Err(CouponRejection::UsageLimitReached);
    }
    if subtotal < coupon.min_order_amount {
        return Err(CouponRejection::MinimumNotMet {
            min_order_amount: coupon.min_order_amount,
        });
    }

    let kind = coupon
        .discount_type
        .parse::<DiscountType>()
        .unwrap_or(DiscountType::Fixed);
    Ok(coupon_discount(kind, coupon.discount_value, subtotal))
}

/// Unit price after a personalized percentage discount, rounded in the shop's favour.
pub fn offer_unit_price(price: i64, discount_percent: i32) -> i64 {
    price - percent_of(price, i64::from(discount_percent))
}

/// Percentage saved relative to the compare-at price, if the product is on sale.
pub fn sale_discount_percent(price: i64, compare_at_price: Option<i64>) -> Option<i64> {
    match compare_at_price {
        Some(compare) if compare > price && compare > 0 => {
            let saved = (i128::from(compare) - i128::from(price)) * 100 / i128::from(compare);
            Some(saved.clamp(0, 100) as i64)
        }
        _ => None,
    }
}

/// Normalize a coupon code for storage and lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn coupon(kind: &str, value: i64) -> coupons::Model {
        let now = Utc::now().fixed_offset();
        coupons::Model {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            code: "SAVE10".into(),
            discount_type: kind.into(),
            discount_value: value,
            min_order_amount: 0,
            max_uses: None,
            used_count: 0,
            starts_at: None,
            expires_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percent_discount_floors() {
        assert_eq!(coupon_discount(DiscountType::Percent, 10, 999), 99);
        assert_eq!(coupon_discount(DiscountType::Percent, 100, 500), 500);
    }

    #[test]
    fn fixed_discount_is_capped_by_subtotal() {
        assert_eq!(coupon_discount(DiscountType::Fixed, 300, 1000), 300);
        assert_eq!(coupon_discount(DiscountType::Fixed, 3000, 1000), 1000);
    }

    #[test]
    fn evaluate_reports_each_rejection() {
        let now = Utc::now();

        let mut c = coupon("percent", 10);
        c.is_active = false;
        assert_eq!(evaluate_coupon(&c, 1000, now), Err(CouponRejection::Inactive));

        let mut c = coupon("percent", 10);
        c.starts_at = Some((now + Duration::hours(1)).fixed_offset());
        assert_eq!(evaluate_coupon(&c, 1000, now), Err(CouponRejection::NotStarted));

        let mut c = coupon("percent", 10);
        c.expires_at = Some(now.fixed_offset());
        assert_eq!(evaluate_coupon(&c, 1000, now), Err(CouponRejection::Expired));

        let mut c = coupon("percent", 10);
        c.max_uses = Some(2);
        c.used_count = 2;
        assert_eq!(
            evaluate_coupon(&c, 1000, now),
            Err(CouponRejection::UsageLimitReached)
        );

        let mut c = coupon("fixed", 100);
        c.min_order_amount = 5000;
        assert_eq!(
            evaluate_coupon(&c, 1000, now),
            Err(CouponRejection::MinimumNotMet {
                min_order_amount: 5000
            })
        );
    }

    #[test]
    fn evaluate_returns_discount_for_valid_coupon() {
        let c = coupon("percent", 15);
        assert_eq!(evaluate_coupon(&c, 2000, Utc::now()), Ok(300));
    }

    #[test]
    fn offer_price_and_sale_percent() {
        assert_eq!(offer_unit_price(1999, 25), 1500);
        assert_eq!(offer_unit_price(1000, 0), 1000);
        assert_eq!(sale_discount_percent(700, Some(1000)), Some(30));
        assert_eq!(sale_discount_percent(1000, Some(1000)), None);
        assert_eq!(sale_discount_percent(1000, None), None);
    }

    #[test]
    fn large_amounts_do_not_overflow() {
        assert_eq!(sale_discount_percent(0, Some(i64::MAX / 50)), Some(100));
        assert_eq!(sale_discount_percent(i64::MAX / 2, Some(i64::MAX)), Some(50));
        assert_eq!(
            coupon_discount(DiscountType::Percent, 50, i64::MAX),
            i64::MAX / 2
        );
        assert_eq!(offer_unit_price(i64::MAX, 100), 0);
    }

    #[test]
    fn validates_discount_values() {
        assert!(DiscountType::Percent.validate_value(0).is_err());
        assert!(DiscountType::Percent.validate_value(101).is_err());
        assert!(DiscountType::Percent.validate_value(50).is_ok());
        assert!(DiscountType::Fixed.validate_value(0).is_err());
        assert!(DiscountType::Fixed.validate_value(1).is_ok());
    }

    #[test]
    fn codes_are_uppercased() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }
}
