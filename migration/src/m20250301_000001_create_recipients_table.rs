use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Recipient::Table)
                .if_not_exists()
                .col(ColumnDef::new(Recipient::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Recipient::UserAddress).string().not_null())
                .col(ColumnDef::new(Recipient::Name).string().not_null())
                .col(ColumnDef::new(Recipient::Wallet).string().not_null())
                .col(ColumnDef::new(Recipient::Note).text().null())
                .col(ColumnDef::new(Recipient::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Recipient::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_recipients_user_address")
                .table(Recipient::Table)
                .col(Recipient::UserAddress)
                .to_owned()
        ).await?;

        // One entry per wallet within a user's shard.
        manager.create_index(
            Index::create()
                .name("idx_recipients_user_wallet")
                .table(Recipient::Table)
                .col(Recipient::UserAddress)
                .col(Recipient::Wallet)
                .unique()
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Recipient::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Recipient {
    #[sea_orm(iden = "recipients")]
    Table,
    Id,
    UserAddress,
    Name,
    Wallet,
    Note,
    CreatedAt,
    UpdatedAt,
}
