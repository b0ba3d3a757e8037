use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::{
    dto::{
        assistant::{ChatRequest, ChatResponse},
        products::ProductList,
        settings::SliderList,
    },
    error::AppResult,
    middleware::auth::MaybeAuthUser,
    models::{Store, StoreSettings},
    response::ApiResponse,
    routes::params::{ClearanceQuery, ProductQuery},
    services::{assistant_service, product_service, settings_service, store_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(get_store))
        .route("/{slug}/settings", get(get_settings))
        .route("/{slug}/sliders", get(list_sliders))
        .route("/{slug}/products", get(list_products))
        .route("/{slug}/clearance", get(list_clearance))
        .route("/{slug}/assistant", post(chat))
}

#[utoipa::path(
    get,
    path = "/api/stores/{slug}",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "Public store profile", body = ApiResponse<Store>),
        (status = 404, description = "Not Found")
    ),
    tag = "Storefront"
)]
pub async fn get_store(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = store_service::get_store_by_slug(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{slug}/settings",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "Navbar menus, carousel and appearance", body = ApiResponse<StoreSettings>),
        (status = 404, description = "Not Found")
    ),
    tag = "Storefront"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<StoreSettings>>> {
    let resp = settings_service::get_settings(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{slug}/sliders",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "Active category sliders in display order", body = ApiResponse<SliderList>),
        (status = 404, description = "Not Found")
    ),
    tag = "Storefront"
)]
pub async fn list_sliders(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<SliderList>>> {
    let resp = settings_service::list_sliders(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{slug}/products",
    params(("slug" = String, Path, description = "Store slug"), ProductQuery),
    responses(
        (status = 200, description = "Search and filter active products", body = ApiResponse<ProductList>),
        (status = 404, description = "Not Found")
    ),
    tag = "Storefront"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, &slug, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{slug}/clearance",
    params(("slug" = String, Path, description = "Store slug"), ClearanceQuery),
    responses(
        (status = 200, description = "Deeply discounted products, deepest first", body = ApiResponse<ProductList>),
        (status = 404, description = "Not Found")
    ),
    tag = "Storefront"
)]
pub async fn list_clearance(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ClearanceQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_clearance(&state, &slug, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/stores/{slug}/assistant",
    params(("slug" = String, Path, description = "Store slug")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ApiResponse<ChatResponse>),
        (status = 400, description = "Invalid message"),
        (status = 404, description = "Not Found")
    ),
    tag = "Assistant"
)]
pub async fn chat(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatResponse>>> {
    let resp = assistant_service::chat(&state, &slug, user.as_ref(), payload).await?;
    Ok(Json(resp))
}
