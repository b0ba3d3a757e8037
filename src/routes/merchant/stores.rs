use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    dto::{
        dashboard::StoreSummary,
        settings::{CreateSliderRequest, PatchSettingsRequest, UpdateSliderRequest},
        stores::{CreateStoreRequest, StoreList, UpdateStoreRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{CategorySlider, Store, StoreSettings},
    response::ApiResponse,
    services::{dashboard_service, settings_service, store_service},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/merchant/stores",
    responses(
        (status = 200, description = "Stores the caller owns; every store for admins", body = ApiResponse<StoreList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StoreList>>> {
    let resp = store_service::list_my_stores(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/merchant/stores",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Store created with default settings", body = ApiResponse<Store>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn create_store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStoreRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Store>>)> {
    let resp = store_service::create_store(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = UpdateStoreRequest,
    responses(
        (status = 200, description = "Store updated", body = ApiResponse<Store>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn update_store(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<UpdateStoreRequest>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = store_service::update_store(&state, &user, store_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/summary",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Dashboard counters", body = ApiResponse<StoreSummary>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StoreSummary>>> {
    let resp = dashboard_service::summary(&state, &user, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/settings",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = PatchSettingsRequest,
    responses(
        (status = 200, description = "Settings replaced section by section", body = ApiResponse<StoreSettings>),
        (status = 400, description = "Invalid menus, slides or colors"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn patch_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<PatchSettingsRequest>,
) -> AppResult<Json<ApiResponse<StoreSettings>>> {
    let resp = settings_service::patch_settings(&state, &user, store_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/merchant/stores/{store_id}/sliders",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = CreateSliderRequest,
    responses(
        (status = 201, description = "Category slider created", body = ApiResponse<CategorySlider>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn create_slider(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<CreateSliderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CategorySlider>>)> {
    let resp = settings_service::create_slider(&state, &user, store_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/sliders/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Slider ID")
    ),
    request_body = UpdateSliderRequest,
    responses(
        (status = 200, description = "Category slider updated", body = ApiResponse<CategorySlider>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn update_slider(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateSliderRequest>,
) -> AppResult<Json<ApiResponse<CategorySlider>>> {
    let resp = settings_service::update_slider(&state, &user, store_id, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/merchant/stores/{store_id}/sliders/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Slider ID")
    ),
    responses(
        (status = 200, description = "Category slider deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn delete_slider(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = settings_service::delete_slider(&state, &user, store_id, id).await?;
    Ok(Json(resp))
}
