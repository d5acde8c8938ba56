use sea_orm::entity::prelude::*;

/// Payment record written at checkout. Linked to its order through
/// `transaction_id` only; there is no foreign key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub capture_method: String,
    pub amount: i64,
    pub transaction_id: String,
    pub customer_id: Option<String>,
    pub payment_id: String,
    pub status: String,
    pub response: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
