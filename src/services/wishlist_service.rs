use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::wishlist::{AddWishlistRequest, WishlistProductList},
    entity::{
        products::Entity as Products,
        wishlist_items::{ActiveModel as WishActive, Column as WishCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    services::product_service::find_purchasable,
    state::AppState,
};

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistProductList>> {
    let items: Vec<Product> = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .order_by_desc(WishCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(_, product)| product.map(Product::from))
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        WishlistProductList { items },
        Some(Meta::unpaginated(total)),
    ))
}

pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: AddWishlistRequest,
) -> AppResult<ApiResponse<Product>> {
    let product = find_purchasable(state, payload.product_id).await?;

    let existing = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .filter(WishCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?;

    if existing.is_none() {
        WishActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            product_id: Set(product.id),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;

        audit::record(
            &state.pool,
            Some(user.user_id),
            "wishlist_add",
            "wishlist_items",
            serde_json::json!({ "product_id": product.id }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Added to wishlist",
        Product::from(product),
        None,
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = WishlistItems::delete_many()
        .filter(WishCol::UserId.eq(user.user_id))
        .filter(WishCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "wishlist_remove",
        "wishlist_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
