use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    domain::pricing::sale_discount_percent,
    dto::cart::{AddToCartRequest, CartItemDto, CartList},
    entity::cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    routes::params::ClearCartQuery,
    services::{abandoned_cart_service::refresh_snapshot_logged, product_service::find_purchasable},
    state::AppState,
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    store_id: Uuid,
    name: String,
    description: Option<String>,
    category: Option<String>,
    price: i64,
    compare_at_price: Option<i64>,
    stock: i32,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<CartWithProductRow> for CartItemDto {
    fn from(row: CartWithProductRow) -> Self {
        CartItemDto {
            id: row.cart_id,
            store_id: row.store_id,
            line_total: row.price * i64::from(row.quantity),
            quantity: row.quantity,
            product: Product {
                id: row.product_id,
                store_id: row.store_id,
                name: row.name,
                description: row.description,
                category: row.category,
                discount_percent: sale_discount_percent(row.price, row.compare_at_price),
                price: row.price,
                compare_at_price: row.compare_at_price,
                stock: row.stock,
                image_url: row.image_url,
                is_active: row.is_active,
                created_at: row.created_at,
            },
        }
    }
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.store_id, p.name, p.description, p.category, p.price,
               p.compare_at_price, p.stock, p.image_url, p.is_active, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let items: Vec<CartItemDto> = rows.into_iter().map(CartItemDto::from).collect();
    let subtotal = items.iter().map(|i| i.line_total).sum();
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "OK",
        CartList { items, subtotal },
        Some(Meta::unpaginated(total)),
    ))
}

pub async fn set_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = find_purchasable(state, payload.product_id).await?;
    if payload.quantity > product.stock {
        return Err(AppError::BadRequest(format!(
            "only {} left in stock",
            product.stock
        )));
    }

    let item = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        store_id: Set(product.store_id),
        product_id: Set(product.id),
        quantity: Set(payload.quantity),
        created_at: NotSet,
        updated_at: Set(Utc::now().into()),
    };
    let cart_item = CartItems::insert(item)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::ProductId])
                .update_columns([CartCol::Quantity, CartCol::StoreId, CartCol::UpdatedAt])
                .to_owned(),
        )
        .exec_with_returning(&state.orm)
        .await?;

    refresh_snapshot_logged(state, user.user_id, product.store_id).await;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", CartItem::from(cart_item), None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    CartItems::delete_by_id(existing.id).exec(&state.orm).await?;
    refresh_snapshot_logged(state, user.user_id, existing.store_id).await;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
    query: ClearCartQuery,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut finder = CartItems::find().filter(CartCol::UserId.eq(user.user_id));
    if let Some(store_id) = query.store_id {
        finder = finder.filter(CartCol::StoreId.eq(store_id));
    }
    let items = finder.all(&state.orm).await?;
    let mut store_ids: Vec<Uuid> = items.iter().map(|i| i.store_id).collect();
    store_ids.sort();
    store_ids.dedup();

    let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let removed = CartItems::delete_many()
        .filter(CartCol::Id.is_in(ids))
        .exec(&state.orm)
        .await?
        .rows_affected;

    for store_id in store_ids {
        refresh_snapshot_logged(state, user.user_id, store_id).await;
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_clear",
        "cart_items",
        serde_json::json!({ "store_id": query.store_id, "removed": removed }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    ))
}
