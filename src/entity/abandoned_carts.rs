use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "abandoned_carts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub items: Json,
    pub item_count: i32,
    pub total_amount: i64,
    pub status: String,
    pub last_activity_at: DateTimeWithTimeZone,
    pub reminder_sent_at: Option<DateTimeWithTimeZone>,
    pub recovered_order_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
