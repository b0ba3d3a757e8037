use sea_orm::{DbErr, SqlErr};

pub mod abandoned_cart_service;
pub mod admin_service;
pub mod assistant_service;
pub mod auth_service;
pub mod cart_service;
pub mod coupon_service;
pub mod dashboard_service;
pub mod offer_service;
pub mod order_service;
pub mod product_service;
pub mod settings_service;
pub mod store_service;
pub mod ticket_service;
pub mod wishlist_service;

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
