use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    dto::{
        abandoned_carts::AbandonedCartList,
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest, UpdateShipmentRequest},
        tickets::{TicketList, UpdateTicketStatusRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{AbandonedCart, Order, Ticket},
    response::ApiResponse,
    routes::params::{AbandonedCartQuery, OrderListQuery, TicketListQuery},
    services::{abandoned_cart_service, order_service, ticket_service},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/orders",
    params(("store_id" = Uuid, Path, description = "Store ID"), OrderListQuery),
    responses(
        (status = 200, description = "Store orders", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_store_orders(&state, &user, store_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/orders/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Store order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_store_order(&state, &user, store_id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/orders/{id}/status",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order moved along the status machine", body = ApiResponse<Order>),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &user, store_id, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/orders/{id}/shipment",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateShipmentRequest,
    responses(
        (status = 200, description = "Courier and tracking number recorded", body = ApiResponse<Order>),
        (status = 400, description = "Order cannot ship"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn set_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateShipmentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::set_shipment(&state, &user, store_id, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/abandoned-carts",
    params(("store_id" = Uuid, Path, description = "Store ID"), AbandonedCartQuery),
    responses(
        (status = 200, description = "Carts idle past the threshold", body = ApiResponse<AbandonedCartList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn list_abandoned_carts(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<AbandonedCartQuery>,
) -> AppResult<Json<ApiResponse<AbandonedCartList>>> {
    let resp = abandoned_cart_service::list_abandoned(&state, &user, store_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/merchant/stores/{store_id}/abandoned-carts/{id}/remind",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Abandoned cart ID")
    ),
    responses(
        (status = 200, description = "Reminder timestamp recorded", body = ApiResponse<AbandonedCart>),
        (status = 400, description = "Cart already recovered"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn remind_abandoned_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<AbandonedCart>>> {
    let resp = abandoned_cart_service::mark_reminded(&state, &user, store_id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/merchant/stores/{store_id}/tickets",
    params(("store_id" = Uuid, Path, description = "Store ID"), TicketListQuery),
    responses(
        (status = 200, description = "Support tickets for the store", body = ApiResponse<TicketList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = ticket_service::list_store_tickets(&state, &user, store_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/merchant/stores/{store_id}/tickets/{id}/status",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = UpdateTicketStatusRequest,
    responses(
        (status = 200, description = "Ticket status set", body = ApiResponse<Ticket>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Merchant"
)]
pub async fn update_ticket_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTicketStatusRequest>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    let resp = ticket_service::update_ticket_status(&state, &user, store_id, id, payload).await?;
    Ok(Json(resp))
}
