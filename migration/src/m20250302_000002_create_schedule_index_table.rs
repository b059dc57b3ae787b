use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(ScheduleIndex::Table)
                .if_not_exists()
                .col(ColumnDef::new(ScheduleIndex::ScheduleId).uuid().not_null().primary_key())
                .col(ColumnDef::new(ScheduleIndex::UserAddress).string().not_null())
                .col(ColumnDef::new(ScheduleIndex::NextRun).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(ScheduleIndex::Recipient).string().not_null())
                .col(ColumnDef::new(ScheduleIndex::Amount).decimal_len(20, 6).not_null())
                .col(ColumnDef::new(ScheduleIndex::Currency).string_len(10).not_null())
                .col(ColumnDef::new(ScheduleIndex::Interval).string_len(20).not_null())
                .col(ColumnDef::new(ScheduleIndex::IntervalMs).big_integer().null())
                .col(ColumnDef::new(ScheduleIndex::TimesRemaining).integer().null())
                .col(ColumnDef::new(ScheduleIndex::Name).string().null())
                .col(ColumnDef::new(ScheduleIndex::Note).text().null())
                .col(ColumnDef::new(ScheduleIndex::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_schedule_index_next_run")
                .table(ScheduleIndex::Table)
                .col(ScheduleIndex::NextRun)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ScheduleIndex::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ScheduleIndex {
    #[sea_orm(iden = "schedule_index")]
    Table,
    ScheduleId,
    UserAddress,
    NextRun,
    Recipient,
    Amount,
    Currency,
    Interval,
    IntervalMs,
    TimesRemaining,
    Name,
    Note,
    CreatedAt,
}
