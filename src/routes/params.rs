use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{AbandonedCartStatus, OrderStatus, TicketPriority, TicketStatus, offer::OfferStatus};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

// Query structs repeat `page`/`per_page` instead of flattening `Pagination`:
// serde_urlencoded cannot parse numbers through `#[serde(flatten)]`.
macro_rules! paginated {
    ($($name:ident),+ $(,)?) => {
        $(impl $name {
            pub fn pagination(&self) -> Pagination {
                Pagination {
                    page: self.page,
                    per_page: self.per_page,
                }
            }
        })+
    };
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches name or description.
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub in_stock: Option<bool>,
    pub on_sale: Option<bool>,
    #[param(value_type = Option<String>)]
    pub sort_by: Option<ProductSortBy>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClearanceQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Minimum discount percentage, default 30.
    pub min_discount: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<OrderStatus>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub threshold: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OfferListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<OfferStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AbandonedCartQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub idle_minutes: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<AbandonedCartStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<TicketStatus>,
    #[param(value_type = Option<String>)]
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub action: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClearCartQuery {
    pub store_id: Option<Uuid>,
}

paginated!(
    ProductQuery,
    ClearanceQuery,
    OrderListQuery,
    LowStockQuery,
    OfferListQuery,
    AbandonedCartQuery,
    TicketListQuery,
    AuditLogQuery,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_and_offsets() {
        let p = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (3, 100, 200));

        let p = Pagination {
            page: Some(-4),
            per_page: Some(0),
        };
        assert_eq!(p.normalize(), (1, 1, 0));

        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(20),
        };
        let (page, per_page, offset) = p.normalize();
        assert_eq!((page, per_page), (i64::MAX, 20));
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn product_query_parses_from_urlencoded() {
        let q: ProductQuery = serde_urlencoded_like(
            "page=2&per_page=5&q=mug&in_stock=true&sort_by=price&sort_order=asc",
        );
        assert_eq!(q.pagination().normalize(), (2, 5, 5));
        assert_eq!(q.q.as_deref(), Some("mug"));
        assert_eq!(q.in_stock, Some(true));
        assert!(matches!(q.sort_by, Some(ProductSortBy::Price)));
        assert!(matches!(q.sort_order, Some(SortOrder::Asc)));
    }

    fn serde_urlencoded_like<T: serde::de::DeserializeOwned>(query: &str) -> T {
        let uri: axum::http::Uri = format!("/?{query}").parse().unwrap();
        axum::extract::Query::<T>::try_from_uri(&uri).unwrap().0
    }
}
