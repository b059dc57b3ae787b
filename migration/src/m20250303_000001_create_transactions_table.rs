use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Transaction::Table)
                .if_not_exists()
                .col(ColumnDef::new(Transaction::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Transaction::UserAddress).string().not_null())
                .col(ColumnDef::new(Transaction::Kind).string_len(20).not_null())
                .col(ColumnDef::new(Transaction::Name).string().null())
                .col(ColumnDef::new(Transaction::Address).string().not_null())
                .col(ColumnDef::new(Transaction::Amount).decimal_len(20, 6).not_null())
                .col(ColumnDef::new(Transaction::Currency).string_len(10).not_null())
                .col(ColumnDef::new(Transaction::Status).string_len(20).not_null())
                .col(ColumnDef::new(Transaction::TxHash).string().null())
                .col(ColumnDef::new(Transaction::ScheduleId).uuid().null())
                .col(ColumnDef::new(Transaction::Note).text().null())
                .col(ColumnDef::new(Transaction::Timestamp).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_transactions_user_address")
                .table(Transaction::Table)
                .col(Transaction::UserAddress)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_transactions_timestamp")
                .table(Transaction::Table)
                .col(Transaction::Timestamp)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_transactions_schedule_id")
                .table(Transaction::Table)
                .col(Transaction::ScheduleId)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Transaction::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Transaction {
    #[sea_orm(iden = "transactions")]
    Table,
    Id,
    UserAddress,
    Kind,
    Name,
    Address,
    Amount,
    Currency,
    Status,
    TxHash,
    ScheduleId,
    Note,
    Timestamp,
}
