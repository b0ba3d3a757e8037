use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Implements `as_str`, `Display` and `FromStr` for a snake_case string enum.
macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(AppError::BadRequest(format!("Invalid {}: {}", $label, s))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Merchant,
    Admin,
}

string_enum!(Role, "role", {
    Customer => "customer",
    Merchant => "merchant",
    Admin => "admin",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Paid => "paid",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Paid, Processing)
                | (Paid, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// Stock has left the shelf once an order exists; it returns only on cancellation.
    pub fn restocks_on_cancel(self) -> bool {
        !matches!(
            self,
            OrderStatus::Shipped | OrderStatus::Delivered | OrderStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Unpaid => "unpaid",
    Paid => "paid",
    Refunded => "refunded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Card,
    Upi,
}

string_enum!(PaymentMethod, "payment method", {
    Cod => "cod",
    Card => "card",
    Upi => "upi",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

string_enum!(TicketStatus, "ticket status", {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

impl TicketStatus {
    /// Status after a reply. Closed tickets accept no replies.
    pub fn after_reply(self, by_staff: bool) -> Result<TicketStatus, AppError> {
        match (self, by_staff) {
            (TicketStatus::Closed, _) => {
                Err(AppError::BadRequest("Ticket is closed".into()))
            }
            (TicketStatus::Open, true) => Ok(TicketStatus::InProgress),
            (TicketStatus::Resolved, false) => Ok(TicketStatus::Open),
            (status, _) => Ok(status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Order,
    Payment,
    Product,
    Shipping,
    Other,
}

string_enum!(TicketCategory, "ticket category", {
    Order => "order",
    Payment => "payment",
    Product => "product",
    Shipping => "shipping",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Normal,
    High,
}

string_enum!(TicketPriority, "ticket priority", {
    Low => "low",
    Normal => "normal",
    High => "high",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AbandonedCartStatus {
    Active,
    Reminded,
    Recovered,
}

string_enum!(AbandonedCartStatus, "abandoned cart status", {
    Active => "active",
    Reminded => "reminded",
    Recovered => "recovered",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_machine() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Processing.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn parses_case_insensitively_and_rejects_unknown() {
        assert_eq!("In_Progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
        assert_eq!(" UPI ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        let err = "teleport".parse::<PaymentMethod>().unwrap_err();
        assert!(err.to_string().contains("payment method"));
    }

    #[test]
    fn every_variant_round_trips_through_its_label() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn ticket_reply_transitions() {
        assert_eq!(
            TicketStatus::Open.after_reply(true).unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!(
            TicketStatus::Open.after_reply(false).unwrap(),
            TicketStatus::Open
        );
        assert_eq!(
            TicketStatus::Resolved.after_reply(false).unwrap(),
            TicketStatus::Open
        );
        assert_eq!(
            TicketStatus::Resolved.after_reply(true).unwrap(),
            TicketStatus::Resolved
        );
        assert!(TicketStatus::Closed.after_reply(false).is_err());
    }

    #[test]
    fn cancellation_restock_rules() {
        assert!(OrderStatus::Pending.restocks_on_cancel());
        assert!(OrderStatus::Processing.restocks_on_cancel());
        assert!(!OrderStatus::Shipped.restocks_on_cancel());
    }
}
