use serde::Serialize;
use utoipa::ToSchema;

use crate::models::AbandonedCart;

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AbandonedCartList {
    #[schema(value_type = Vec<AbandonedCart>)]
    pub items: Vec<AbandonedCart>,
}
