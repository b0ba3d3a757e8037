use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket_messages::Entity")]
    TicketMessages,
}

impl Related<super::ticket_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
