use std::future::Future;
use std::time::Duration;

use sea_orm::{
    ActiveValue::Set,
    DatabaseConnection,
    EntityTrait,
    PaginatorTrait,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::db::entity::schedule_index;
use crate::error::{ AppError, Result };

const SCAN_PAGE_SIZE: u64 = 200;

/// Global schedule_id -> dispatch-record store. A derived projection owned by
/// the dispatcher: the user shard stays authoritative and can rebuild it, but
/// the index must never hold a schedule the shard has not acknowledged.
pub struct ScheduleIndexStore {
    db: DatabaseConnection,
    op_timeout: Duration,
}

impl ScheduleIndexStore {
    pub fn new(db: DatabaseConnection, op_timeout: Duration) -> Self {
        Self { db, op_timeout }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout("index operation timed out".to_string())),
        }
    }

    /// Insert or overwrite the entry for a schedule.
    pub async fn put(&self, entry: schedule_index::Model) -> Result<()> {
        self.bounded(async {
            let row = schedule_index::ActiveModel {
                schedule_id: Set(entry.schedule_id),
                user_address: Set(entry.user_address),
                next_run: Set(entry.next_run),
                recipient: Set(entry.recipient),
                amount: Set(entry.amount),
                currency: Set(entry.currency),
                interval: Set(entry.interval),
                interval_ms: Set(entry.interval_ms),
                times_remaining: Set(entry.times_remaining),
                name: Set(entry.name),
                note: Set(entry.note),
                created_at: Set(entry.created_at),
            };

            schedule_index::Entity
                ::insert(row)
                .on_conflict(
                    OnConflict::column(schedule_index::Column::ScheduleId)
                        .update_columns([
                            schedule_index::Column::NextRun,
                            schedule_index::Column::TimesRemaining,
                            schedule_index::Column::Recipient,
                            schedule_index::Column::Amount,
                            schedule_index::Column::Currency,
                            schedule_index::Column::Interval,
                            schedule_index::Column::IntervalMs,
                            schedule_index::Column::Name,
                            schedule_index::Column::Note,
                        ])
                        .to_owned()
                )
                .exec(&self.db).await?;

            Ok(())
        }).await
    }

    /// Remove the entry for a retired or cancelled schedule. Deleting an
    /// absent key is not an error.
    pub async fn delete(&self, schedule_id: Uuid) -> Result<()> {
        self.bounded(async {
            schedule_index::Entity::delete_by_id(schedule_id).exec(&self.db).await?;
            Ok(())
        }).await
    }

    /// Paginated scan over every live entry. No ordering guarantee; callers
    /// tolerate entries appearing in any page.
    pub async fn list_all(&self) -> Result<Vec<schedule_index::Model>> {
        self.bounded(async {
            let mut entries = Vec::new();
            let mut pages = schedule_index::Entity::find().paginate(&self.db, SCAN_PAGE_SIZE);

            while let Some(page) = pages.fetch_and_next().await? {
                entries.extend(page);
            }

            Ok(entries)
        }).await
    }
}
