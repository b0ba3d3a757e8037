//! Store management for merchants. Every handler checks store ownership;
//! admins pass the check for any store.

use axum::{
    Router,
    routing::{get, patch, post},
};

pub mod catalog;
pub mod fulfillment;
pub mod stores;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stores", get(stores::list_stores).post(stores::create_store))
        .route("/stores/{store_id}", patch(stores::update_store))
        .route("/stores/{store_id}/summary", get(stores::summary))
        .route("/stores/{store_id}/settings", patch(stores::patch_settings))
        .route("/stores/{store_id}/sliders", post(stores::create_slider))
        .route(
            "/stores/{store_id}/sliders/{id}",
            patch(stores::update_slider).delete(stores::delete_slider),
        )
        .route("/stores/{store_id}/products", post(catalog::create_product))
        .route(
            "/stores/{store_id}/products/{id}",
            patch(catalog::update_product).delete(catalog::delete_product),
        )
        .route(
            "/stores/{store_id}/inventory/low-stock",
            get(catalog::list_low_stock),
        )
        .route(
            "/stores/{store_id}/inventory/{product_id}",
            patch(catalog::adjust_inventory),
        )
        .route(
            "/stores/{store_id}/coupons",
            get(catalog::list_coupons).post(catalog::create_coupon),
        )
        .route(
            "/stores/{store_id}/coupons/{id}",
            patch(catalog::update_coupon).delete(catalog::delete_coupon),
        )
        .route(
            "/stores/{store_id}/offers",
            get(catalog::list_offers).post(catalog::generate_offer),
        )
        .route(
            "/stores/{store_id}/offers/{id}/deactivate",
            post(catalog::deactivate_offer),
        )
        .route("/stores/{store_id}/orders", get(fulfillment::list_orders))
        .route("/stores/{store_id}/orders/{id}", get(fulfillment::get_order))
        .route(
            "/stores/{store_id}/orders/{id}/status",
            patch(fulfillment::update_order_status),
        )
        .route(
            "/stores/{store_id}/orders/{id}/shipment",
            patch(fulfillment::set_shipment),
        )
        .route(
            "/stores/{store_id}/abandoned-carts",
            get(fulfillment::list_abandoned_carts),
        )
        .route(
            "/stores/{store_id}/abandoned-carts/{id}/remind",
            post(fulfillment::remind_abandoned_cart),
        )
        .route("/stores/{store_id}/tickets", get(fulfillment::list_tickets))
        .route(
            "/stores/{store_id}/tickets/{id}/status",
            patch(fulfillment::update_ticket_status),
        )
}
