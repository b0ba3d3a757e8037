use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreSummary {
    pub product_count: i64,
    pub low_stock_count: i64,
    pub orders_by_status: Vec<OrderStatusCount>,
    pub paid_revenue: i64,
    pub open_ticket_count: i64,
    pub abandoned_cart_count: i64,
    pub active_offer_count: i64,
}
