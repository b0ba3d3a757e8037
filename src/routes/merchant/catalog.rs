use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    dto::{
        coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest},
        offers::{CreateOfferRequest, OfferList},
        products::{CreateProductRequest, InventoryAdjustRequest, ProductList, UpdateProductRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Coupon, PersonalizedOffer, Product},
    response::ApiResponse,
    routes::params::{LowStockQuery, OfferListQuery},
    services::{coupon_service, offer_service, product_service},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/merchant/stores/{store_id}/products",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::create_product(&state, &user, store_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/products/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, store_id, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/merchant/stores/{store_id}/products/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Product is referenced by orders")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, store_id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/inventory/low-stock",
    params(("store_id" = Uuid, Path, description = "Store ID"), LowStockQuery),
    responses(
        (status = 200, description = "Products at or below the stock threshold", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_low_stock(&state, &user, store_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/inventory/{product_id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Stock adjusted by delta", body = ApiResponse<Product>),
        (status = 400, description = "Stock would go negative"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::adjust_inventory(&state, &user, store_id, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/coupons",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store coupons", body = ApiResponse<CouponList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    let resp = coupon_service::list_coupons(&state, &user, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/merchant/stores/{store_id}/coupons",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = ApiResponse<Coupon>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Code already exists in this store")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Coupon>>)> {
    let resp = coupon_service::create_coupon(&state, &user, store_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/coupons/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = ApiResponse<Coupon>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let resp = coupon_service::update_coupon(&state, &user, store_id, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/merchant/stores/{store_id}/coupons/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    responses(
        (status = 200, description = "Coupon deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = coupon_service::delete_coupon(&state, &user, store_id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/offers",
    params(("store_id" = Uuid, Path, description = "Store ID"), OfferListQuery),
    responses(
        (status = 200, description = "Personalized offers issued by the store", body = ApiResponse<OfferList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn list_offers(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<OfferListQuery>,
) -> AppResult<Json<ApiResponse<OfferList>>> {
    let resp = offer_service::list_store_offers(&state, &user, store_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/merchant/stores/{store_id}/offers",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Single-use offer token issued to a customer", body = ApiResponse<PersonalizedOffer>),
        (status = 400, description = "Invalid discount or expiry"),
        (status = 404, description = "Product or customer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn generate_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<CreateOfferRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PersonalizedOffer>>)> {
    let resp = offer_service::generate_offer(&state, &user, store_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/merchant/stores/{store_id}/offers/{id}/deactivate",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    responses(
        (status = 200, description = "Offer deactivated", body = ApiResponse<PersonalizedOffer>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn deactivate_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<PersonalizedOffer>>> {
    let resp = offer_service::deactivate_offer(&state, &user, store_id, id).await?;
    Ok(Json(resp))
}
