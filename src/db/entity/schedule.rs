use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_address: String,
    pub name: Option<String>,
    pub recipient: String,
    pub amount: Decimal,
    pub currency: String,
    pub interval: String, // "daily", "weekly", "monthly", "yearly", "custom"
    pub interval_ms: Option<i64>,
    pub start_date: Date,
    pub time_of_day: Option<Time>,
    pub times_total: Option<i32>,
    pub times_remaining: Option<i32>,
    pub note: Option<String>,
    pub next_run: DateTimeUtc,
    pub active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
