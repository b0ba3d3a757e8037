use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{OrderStatus, PaymentMethod},
    models::{Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub store_id: Uuid,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub offer_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    pub invoice_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShipmentRequest {
    pub courier: String,
    pub tracking_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingEvent {
    pub status: String,
    pub location: Option<String>,
    pub instructions: Option<String>,
    pub occurred_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderTracking {
    pub order_id: Uuid,
    pub courier: Option<String>,
    pub tracking_number: String,
    pub current_status: String,
    pub current_location: Option<String>,
    pub updated_at: Option<String>,
    pub events: Vec<TrackingEvent>,
    pub fetched_at: DateTime<Utc>,
}
