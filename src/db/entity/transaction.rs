use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_address: String,
    #[serde(rename = "type")]
    pub kind: String, // "send_once" or "recurring"
    pub name: Option<String>,
    pub address: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String, // "completed" or "failed"
    pub tx_hash: Option<String>,
    pub schedule_id: Option<Uuid>,
    pub note: Option<String>,
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
