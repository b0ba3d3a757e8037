use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::offer::OfferStatus,
    models::{PersonalizedOffer, Product},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOfferRequest {
    /// Either the customer's id or email identifies the recipient.
    pub customer_id: Option<Uuid>,
    pub customer_email: Option<String>,
    pub product_id: Uuid,
    pub discount_percent: i32,
    pub expires_in_hours: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfferValidation {
    pub offer: PersonalizedOffer,
    pub product: Product,
    pub offer_price: i64,
    pub valid: bool,
    pub status: OfferStatus,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OfferList {
    #[schema(value_type = Vec<PersonalizedOffer>)]
    pub items: Vec<PersonalizedOffer>,
}
