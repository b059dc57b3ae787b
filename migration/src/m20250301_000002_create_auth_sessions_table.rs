use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(AuthSession::Table)
                .if_not_exists()
                .col(ColumnDef::new(AuthSession::UserAddress).string().not_null().primary_key())
                .col(ColumnDef::new(AuthSession::Nonce).string().null())
                .col(ColumnDef::new(AuthSession::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuthSession::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuthSession {
    #[sea_orm(iden = "auth_sessions")]
    Table,
    UserAddress,
    Nonce,
    UpdatedAt,
}
