pub mod abandoned_carts;
pub mod audit_logs;
pub mod cart_items;
pub mod category_sliders;
pub mod coupons;
pub mod order_items;
pub mod orders;
pub mod personalized_offers;
pub mod products;
pub mod store_settings;
pub mod stores;
pub mod ticket_messages;
pub mod tickets;
pub mod users;
pub mod wishlist_items;

pub use abandoned_carts::Entity as AbandonedCarts;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use category_sliders::Entity as CategorySliders;
pub use coupons::Entity as Coupons;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use personalized_offers::Entity as PersonalizedOffers;
pub use products::Entity as Products;
pub use store_settings::Entity as StoreSettings;
pub use stores::Entity as Stores;
pub use ticket_messages::Entity as TicketMessages;
pub use tickets::Entity as Tickets;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
