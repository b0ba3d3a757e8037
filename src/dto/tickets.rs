use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{TicketCategory, TicketPriority, TicketStatus},
    models::{Ticket, TicketMessage},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub store_id: Uuid,
    pub subject: String,
    pub message: String,
    pub category: Option<TicketCategory>,
    pub priority: Option<TicketPriority>,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyTicketRequest {
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketWithMessages {
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TicketList {
    #[schema(value_type = Vec<Ticket>)]
    pub items: Vec<Ticket>,
}
