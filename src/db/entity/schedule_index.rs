use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

/// Denormalized projection of a schedule, carrying everything the dispatcher
/// needs to fire it without consulting the owning user shard.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule_index")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub schedule_id: Uuid,
    pub user_address: String,
    pub next_run: DateTimeUtc,
    pub recipient: String,
    pub amount: Decimal,
    pub currency: String,
    pub interval: String,
    pub interval_ms: Option<i64>,
    pub times_remaining: Option<i32>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
