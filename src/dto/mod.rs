pub mod abandoned_carts;
pub mod admin;
pub mod assistant;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod dashboard;
pub mod offers;
pub mod orders;
pub mod products;
pub mod settings;
pub mod stores;
pub mod tickets;
pub mod wishlist;
