use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::AppResult, models::Product, response::ApiResponse, services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Get active product by ID", body = ApiResponse<Product>),
        (status = 404, description = "Not Found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}
