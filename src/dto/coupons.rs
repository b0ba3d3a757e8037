use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{domain::pricing::DiscountType, models::Coupon};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_amount: Option<i64>,
    pub max_uses: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCouponRequest {
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub min_order_amount: Option<i64>,
    pub max_uses: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub store_id: Uuid,
    pub code: String,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponValidation {
    pub coupon: Coupon,
    pub discount_amount: i64,
    pub total_after_discount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CouponList {
    #[schema(value_type = Vec<Coupon>)]
    pub items: Vec<Coupon>,
}
