use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, OrderList, OrderTracking, OrderWithItems, PayOrderRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
        .route("/{id}/pay", post(pay_order))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/tracking", get(track_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Caller's orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed from the store's cart lines", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart, stock, coupon or offer rejected"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = PayOrderRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invoice mismatch, already paid or cancelled"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PayOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::pay_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Pending order cancelled and restocked", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Order is past pending"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/tracking",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Live courier tracking", body = ApiResponse<OrderTracking>),
        (status = 400, description = "Order not shipped"),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Courier API error"),
        (status = 503, description = "Tracking not configured")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn track_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderTracking>>> {
    let resp = order_service::track_order(&state, &user, id).await?;
    Ok(Json(resp))
}
