use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

/// Login nonce state for one user address. The nonce is single-use: it is
/// overwritten on every issue and cleared on the first successful verify.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_address: String,
    pub nonce: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
