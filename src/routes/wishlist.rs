use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::wishlist::{AddWishlistRequest, WishlistProductList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist).post(add_to_wishlist))
        .route("/{product_id}", delete(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "Wishlisted products", body = ApiResponse<WishlistProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistProductList>>> {
    let resp = wishlist_service::list_wishlist(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist",
    request_body = AddWishlistRequest,
    responses(
        (status = 200, description = "Add product to wishlist, idempotent", body = ApiResponse<Product>),
        (status = 400, description = "Product unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddWishlistRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = wishlist_service::add_to_wishlist(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Remove product from wishlist", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not in wishlist")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = wishlist_service::remove_from_wishlist(&state, &user, product_id).await?;
    Ok(Json(resp))
}
