//! Business rules that do not touch the database.

pub mod offer;
pub mod pricing;
pub mod slug;
pub mod status;

pub use status::{
    AbandonedCartStatus, OrderStatus, PaymentMethod, PaymentStatus, Role, TicketCategory,
    TicketPriority, TicketStatus,
};
