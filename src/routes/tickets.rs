use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::tickets::{CreateTicketRequest, ReplyTicketRequest, TicketList, TicketWithMessages},
    error::AppResult,
    middleware::auth::AuthUser,
    models::TicketMessage,
    response::ApiResponse,
    routes::params::TicketListQuery,
    services::ticket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_tickets).post(create_ticket))
        .route("/{id}", get(get_ticket))
        .route("/{id}/messages", post(reply))
}

#[utoipa::path(
    get,
    path = "/api/tickets",
    params(TicketListQuery),
    responses(
        (status = 200, description = "Caller's support tickets", body = ApiResponse<TicketList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn list_my_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = ticket_service::list_my_tickets(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened with its first message", body = ApiResponse<TicketWithMessages>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TicketWithMessages>>)> {
    let resp = ticket_service::create_ticket(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket with its messages", body = ApiResponse<TicketWithMessages>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TicketWithMessages>>> {
    let resp = ticket_service::get_ticket(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/messages",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = ReplyTicketRequest,
    responses(
        (status = 201, description = "Reply added", body = ApiResponse<TicketMessage>),
        (status = 400, description = "Ticket closed or empty body"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn reply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplyTicketRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TicketMessage>>)> {
    let resp = ticket_service::reply(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
