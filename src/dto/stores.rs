use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    pub name: String,
    pub description: Option<String>,
    pub support_email: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub support_email: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreList {
    pub items: Vec<Store>,
}
