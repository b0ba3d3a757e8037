use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::personalized_offers;

pub const TOKEN_BYTES: usize = 16;
pub const MIN_DISCOUNT_PERCENT: i32 = 1;
pub const MAX_DISCOUNT_PERCENT: i32 = 90;
pub const MAX_TTL_HOURS: i64 = 24 * 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Active,
    Used,
    Expired,
    Inactive,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Active => "active",
            OfferStatus::Used => "used",
            OfferStatus::Expired => "expired",
            OfferStatus::Inactive => "inactive",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            OfferStatus::Active => "offer is valid",
            OfferStatus::Used => "offer has already been used",
            OfferStatus::Expired => "offer has expired",
            OfferStatus::Inactive => "offer is no longer active",
        }
    }
}

/// Random lowercase hex token.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

pub fn looks_like_token(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// An offer is redeemable when `is_active && !is_used && now < expires_at`.
pub fn offer_status(offer: &personalized_offers::Model, now: DateTime<Utc>) -> OfferStatus {
    if offer.is_used {
        OfferStatus::Used
    } else if !offer.is_active {
        OfferStatus::Inactive
    } else if now >= offer.expires_at {
        OfferStatus::Expired
    } else {
        OfferStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn offer(expires_in: Duration) -> personalized_offers::Model {
        let now = Utc::now();
        personalized_offers::Model {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            token: generate_token(),
            discount_percent: 20,
            expires_at: (now + expires_in).fixed_offset(),
            is_active: true,
            is_used: false,
            used_at: None,
            order_id: None,
            created_by: Uuid::new_v4(),
            created_at: now.fixed_offset(),
        }
    }

    #[test]
    fn tokens_are_hex_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 32);
        assert!(looks_like_token(&a));
        assert_ne!(a, b);
        assert_eq!(a, a.to_lowercase());
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!looks_like_token("abc"));
        assert!(!looks_like_token(&"z".repeat(32)));
    }

    #[test]
    fn status_follows_flags_and_expiry() {
        let now = Utc::now();
        assert_eq!(offer_status(&offer(Duration::hours(1)), now), OfferStatus::Active);
        assert_eq!(
            offer_status(&offer(Duration::hours(-1)), now),
            OfferStatus::Expired
        );

        let mut used = offer(Duration::hours(1));
        used.is_used = true;
        used.is_active = false;
        assert_eq!(offer_status(&used, now), OfferStatus::Used);

        let mut inactive = offer(Duration::hours(1));
        inactive.is_active = false;
        assert_eq!(offer_status(&inactive, now), OfferStatus::Inactive);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let o = offer(Duration::hours(1));
        let at_expiry = o.expires_at.with_timezone(&Utc);
        assert_eq!(offer_status(&o, at_expiry), OfferStatus::Expired);
    }
}
