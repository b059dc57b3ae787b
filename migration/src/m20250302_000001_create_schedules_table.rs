use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Schedule::Table)
                .if_not_exists()
                .col(ColumnDef::new(Schedule::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Schedule::UserAddress).string().not_null())
                .col(ColumnDef::new(Schedule::Name).string().null())
                .col(ColumnDef::new(Schedule::Recipient).string().not_null())
                .col(ColumnDef::new(Schedule::Amount).decimal_len(20, 6).not_null())
                .col(ColumnDef::new(Schedule::Currency).string_len(10).not_null())
                .col(ColumnDef::new(Schedule::Interval).string_len(20).not_null())
                .col(ColumnDef::new(Schedule::IntervalMs).big_integer().null())
                .col(ColumnDef::new(Schedule::StartDate).date().not_null())
                .col(ColumnDef::new(Schedule::TimeOfDay).time().null())
                .col(ColumnDef::new(Schedule::TimesTotal).integer().null())
                .col(ColumnDef::new(Schedule::TimesRemaining).integer().null())
                .col(ColumnDef::new(Schedule::Note).text().null())
                .col(ColumnDef::new(Schedule::NextRun).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Schedule::Active).boolean().not_null())
                .col(ColumnDef::new(Schedule::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Schedule::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_schedules_user_address")
                .table(Schedule::Table)
                .col(Schedule::UserAddress)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_schedules_next_run")
                .table(Schedule::Table)
                .col(Schedule::NextRun)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Schedule::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Schedule {
    #[sea_orm(iden = "schedules")]
    Table,
    Id,
    UserAddress,
    Name,
    Recipient,
    Amount,
    Currency,
    Interval,
    IntervalMs,
    StartDate,
    TimeOfDay,
    TimesTotal,
    TimesRemaining,
    Note,
    NextRun,
    Active,
    CreatedAt,
    UpdatedAt,
}
