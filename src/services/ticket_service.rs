use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    domain::{TicketCategory, TicketPriority, TicketStatus},
    dto::tickets::{
        CreateTicketRequest, ReplyTicketRequest, TicketList, TicketWithMessages,
        UpdateTicketStatusRequest,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        stores::Entity as Stores,
        ticket_messages::{
            ActiveModel as MessageActive, Column as MessageCol, Entity as TicketMessages,
        },
        tickets::{ActiveModel as TicketActive, Column as TicketCol, Entity as Tickets, Model as TicketModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Ticket, TicketMessage},
    response::{ApiResponse, Meta},
    routes::params::TicketListQuery,
    services::store_service::ensure_store_owner,
    state::AppState,
};

const MAX_SUBJECT_CHARS: usize = 200;
const MAX_BODY_CHARS: usize = 5000;

pub async fn create_ticket(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTicketRequest,
) -> AppResult<ApiResponse<TicketWithMessages>> {
    let subject = payload.subject.trim().to_string();
    if subject.is_empty() || subject.chars().count() > MAX_SUBJECT_CHARS {
        return Err(AppError::BadRequest(format!(
            "subject must be 1 to {MAX_SUBJECT_CHARS} characters"
        )));
    }
    let body = validate_body(&payload.message)?;

    let store = Stores::find_by_id(payload.store_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(order_id) = payload.order_id {
        let owned = Orders::find()
            .filter(OrderCol::Id.eq(order_id))
            .filter(OrderCol::UserId.eq(user.user_id))
            .filter(OrderCol::StoreId.eq(store.id))
            .one(&state.orm)
            .await?;
        if owned.is_none() {
            return Err(AppError::BadRequest(
                "order does not belong to you in this store".into(),
            ));
        }
    }

    let txn = state.orm.begin().await?;
    let ticket = TicketActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store.id),
        user_id: Set(user.user_id),
        order_id: Set(payload.order_id),
        subject: Set(subject),
        category: Set(payload
            .category
            .unwrap_or(TicketCategory::Other)
            .as_str()
            .to_string()),
        priority: Set(payload
            .priority
            .unwrap_or(TicketPriority::Normal)
            .as_str()
            .to_string()),
        status: Set(TicketStatus::Open.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    let message = insert_message(&txn, &ticket, user, body).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_create",
        "tickets",
        serde_json::json!({ "ticket_id": ticket.id, "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket created",
        TicketWithMessages {
            ticket: Ticket::from(ticket),
            messages: vec![TicketMessage::from(message)],
        },
        None,
    ))
}

pub async fn list_my_tickets(
    state: &AppState,
    user: &AuthUser,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    let condition = Condition::all().add(TicketCol::UserId.eq(user.user_id));
    paginate_tickets(state, condition, query).await
}

pub async fn list_store_tickets(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    ensure_store_owner(state, user, store_id).await?;
    let condition = Condition::all().add(TicketCol::StoreId.eq(store_id));
    paginate_tickets(state, condition, query).await
}

async fn paginate_tickets(
    state: &AppState,
    mut condition: Condition,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status {
        condition = condition.add(TicketCol::Status.eq(status.as_str()));
    }
    if let Some(priority) = query.priority {
        condition = condition.add(TicketCol::Priority.eq(priority.as_str()));
    }

    let finder = Tickets::find()
        .filter(condition)
        .order_by_desc(TicketCol::UpdatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Ticket::from)
        .collect();

    Ok(ApiResponse::success(
        "Tickets",
        TicketList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_ticket(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<TicketWithMessages>> {
    let ticket = visible_ticket(state, user, id).await?;
    let messages = TicketMessages::find()
        .filter(MessageCol::TicketId.eq(ticket.id))
        .order_by_asc(MessageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(TicketMessage::from)
        .collect();

    Ok(ApiResponse::success(
        "Ticket",
        TicketWithMessages {
            ticket: Ticket::from(ticket),
            messages,
        },
        None,
    ))
}

pub async fn reply(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReplyTicketRequest,
) -> AppResult<ApiResponse<TicketMessage>> {
    let body = validate_body(&payload.body)?;
    let ticket = visible_ticket(state, user, id).await?;
    let by_staff = ticket.user_id != user.user_id;

    let current = ticket.status.parse::<TicketStatus>()?;
    let next = current.after_reply(by_staff)?;

    let txn = state.orm.begin().await?;
    let message = insert_message(&txn, &ticket, user, body).await?;
    let mut active: TicketActive = ticket.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let ticket = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_reply",
        "tickets",
        serde_json::json!({ "ticket_id": ticket.id, "status": ticket.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Reply added",
        TicketMessage::from(message),
        None,
    ))
}

pub async fn update_ticket_status(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
    payload: UpdateTicketStatusRequest,
) -> AppResult<ApiResponse<Ticket>> {
    ensure_store_owner(state, user, store_id).await?;
    let ticket = Tickets::find_by_id(id)
        .filter(TicketCol::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: TicketActive = ticket.into();
    active.status = Set(payload.status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let ticket = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_status_update",
        "tickets",
        serde_json::json!({ "ticket_id": ticket.id, "status": ticket.status }),
    )
    .await;

    Ok(ApiResponse::success("Ticket updated", Ticket::from(ticket), None))
}

/// Ticket readable by its author, the store owner, or an admin.
async fn visible_ticket(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<TicketModel> {
    let ticket = Tickets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if ticket.user_id == user.user_id || user.is_admin() {
        return Ok(ticket);
    }

    let store = Stores::find_by_id(ticket.store_id).one(&state.orm).await?;
    match store {
        Some(store) if store.owner_id == user.user_id => Ok(ticket),
        _ => Err(AppError::NotFound),
    }
}

async fn insert_message<C: ConnectionTrait>(
    conn: &C,
    ticket: &TicketModel,
    user: &AuthUser,
    body: String,
) -> AppResult<crate::entity::ticket_messages::Model> {
    let message = MessageActive {
        id: Set(Uuid::new_v4()),
        ticket_id: Set(ticket.id),
        author_id: Set(user.user_id),
        author_role: Set(user.role.as_str().to_string()),
        body: Set(body),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(message)
}

fn validate_body(body: &str) -> AppResult<String> {
    let body = body.trim();
    if body.is_empty() || body.chars().count() > MAX_BODY_CHARS {
        return Err(AppError::BadRequest(format!(
            "message must be 1 to {MAX_BODY_CHARS} characters"
        )));
    }
    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_trimmed_and_bounded() {
        assert_eq!(validate_body("  hello \n").unwrap(), "hello");
        assert!(validate_body("   ").is_err());
        assert!(validate_body(&"x".repeat(MAX_BODY_CHARS + 1)).is_err());
    }
}
