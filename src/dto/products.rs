use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub stock: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    /// Absent keeps the current value; `null` clears it and ends the sale.
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<i64>)]
    pub compare_at_price: Option<Option<i64>>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_at_price_distinguishes_absent_from_null() {
        let absent: UpdateProductRequest = serde_json::from_str(r#"{"price": 10}"#).unwrap();
        assert_eq!(absent.compare_at_price, None);

        let cleared: UpdateProductRequest =
            serde_json::from_str(r#"{"compare_at_price": null}"#).unwrap();
        assert_eq!(cleared.compare_at_price, Some(None));

        let set: UpdateProductRequest =
            serde_json::from_str(r#"{"compare_at_price": 1200}"#).unwrap();
        assert_eq!(set.compare_at_price, Some(Some(1200)));
    }
}
