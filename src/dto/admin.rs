use serde::Serialize;
use utoipa::ToSchema;

use crate::models::AuditLog;

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogList {
    pub items: Vec<AuditLog>,
}
