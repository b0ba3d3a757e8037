use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod merchant;
pub mod offers;
pub mod orders;
pub mod params;
pub mod products;
pub mod stores;
pub mod tickets;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/stores", stores::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/wishlist", wishlist::router())
        .nest("/coupons", coupons::router())
        .nest("/offers", offers::router())
        .nest("/orders", orders::router())
        .nest("/tickets", tickets::router())
        .nest("/merchant", merchant::router())
        .nest("/admin", admin::router())
}
