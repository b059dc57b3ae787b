use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::Set,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
};
use sea_orm::prelude::{ DateTimeUtc, Decimal };
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::entity::{ auth_session, recipient, schedule, transaction };
use crate::error::{ AppError, Result };

/// Locates the per-user state shards. Every user address maps to exactly one
/// shard; two requests for the same (lowercased) address always receive
/// handles backed by the same write lock, so writes within a shard are
/// serialized while distinct shards proceed in parallel.
pub struct ShardManager {
    db: DatabaseConnection,
    op_timeout: Duration,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ShardManager {
    pub fn new(db: DatabaseConnection, op_timeout: Duration) -> Self {
        Self {
            db,
            op_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the shard handle for a user address. Addresses are lowercased so
    /// checksummed and bare hex spellings reach the same shard.
    pub async fn shard(&self, address: &str) -> UserShard {
        let address = address.to_lowercase();

        let write_lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(address.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };

        UserShard {
            db: self.db.clone(),
            address,
            write_lock,
            op_timeout: self.op_timeout,
        }
    }
}

/// Handle to one user's shard: recipients, schedules, transactions, and the
/// login nonce. Mutations take the shard's write lock; reads go straight to
/// storage and observe the latest committed write.
#[derive(Clone)]
pub struct UserShard {
    db: DatabaseConnection,
    address: String,
    write_lock: Arc<Mutex<()>>,
    op_timeout: Duration,
}

/// Patch for an existing recipient. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct RecipientPatch {
    pub wallet: Option<String>,
    pub name: Option<String>,
    pub note: Option<String>,
}

/// Fields for a new schedule row; id and bookkeeping timestamps are assigned
/// by the shard.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: Option<String>,
    pub recipient: String,
    pub amount: Decimal,
    pub currency: String,
    pub interval: String,
    pub interval_ms: Option<i64>,
    pub start_date: chrono::NaiveDate,
    pub time_of_day: Option<chrono::NaiveTime>,
    pub times_total: Option<i32>,
    pub note: Option<String>,
    pub next_run: DateTimeUtc,
}

/// Dispatcher-side patch applied after a fire (or an explicit cancel).
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub next_run: Option<DateTimeUtc>,
    pub times_remaining: Option<i32>,
    pub active: Option<bool>,
}

/// Fields for a new transaction record. Records are append-only.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: crate::enums::TxKind,
    pub name: Option<String>,
    pub address: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: crate::enums::TxStatus,
    pub tx_hash: Option<String>,
    pub schedule_id: Option<Uuid>,
    pub note: Option<String>,
}

impl UserShard {
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Bound a storage operation to the configured shard-op timeout.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout("shard operation timed out".to_string())),
        }
    }

    // ─── Recipients ──────────────────────────────────────────────────

    pub async fn list_recipients(&self) -> Result<Vec<recipient::Model>> {
        self.bounded(async {
            let recipients = recipient::Entity
                ::find()
                .filter(recipient::Column::UserAddress.eq(&self.address))
                .order_by_asc(recipient::Column::Name)
                .all(&self.db).await?;

            Ok(recipients)
        }).await
    }

    pub async fn add_recipient(
        &self,
        name: String,
        wallet: String,
        note: Option<String>
    ) -> Result<recipient::Model> {
        let _guard = self.write_lock.lock().await;
        let wallet = wallet.to_lowercase();

        self.bounded(async {
            let existing = recipient::Entity
                ::find()
                .filter(recipient::Column::UserAddress.eq(&self.address))
                .filter(recipient::Column::Wallet.eq(&wallet))
                .one(&self.db).await?;

            if existing.is_some() {
                return Err(AppError::Duplicate(format!("recipient wallet {} already saved", wallet)));
            }

            let now = Utc::now();
            let row = recipient::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_address: Set(self.address.clone()),
                name: Set(name),
                wallet: Set(wallet),
                note: Set(note),
                created_at: Set(now),
                updated_at: Set(now),
            };

            let row = row.insert(&self.db).await?;
            Ok(row)
        }).await
    }

    pub async fn update_recipient(
        &self,
        old_wallet: &str,
        patch: RecipientPatch
    ) -> Result<recipient::Model> {
        let _guard = self.write_lock.lock().await;
        let old_wallet = old_wallet.to_lowercase();

        self.bounded(async {
            let row = recipient::Entity
                ::find()
                .filter(recipient::Column::UserAddress.eq(&self.address))
                .filter(recipient::Column::Wallet.eq(&old_wallet))
                .one(&self.db).await?
                .ok_or_else(|| AppError::NotFound(format!("recipient {} not found", old_wallet)))?;

            if let Some(new_wallet) = patch.wallet.as_ref().map(|w| w.to_lowercase()) {
                if new_wallet != old_wallet {
                    let clash = recipient::Entity
                        ::find()
                        .filter(recipient::Column::UserAddress.eq(&self.address))
                        .filter(recipient::Column::Wallet.eq(&new_wallet))
                        .one(&self.db).await?;

                    if clash.is_some() {
                        return Err(
                            AppError::Duplicate(
                                format!("recipient wallet {} already saved", new_wallet)
                            )
                        );
                    }
                }
            }

            let mut active: recipient::ActiveModel = row.into();
            if let Some(wallet) = patch.wallet {
                active.wallet = Set(wallet.to_lowercase());
            }
            if let Some(name) = patch.name {
                active.name = Set(name);
            }
            if let Some(note) = patch.note {
                active.note = Set(Some(note));
            }
            active.updated_at = Set(Utc::now());

            let row = active.update(&self.db).await?;
            Ok(row)
        }).await
    }

    pub async fn delete_recipient(&self, wallet: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let wallet = wallet.to_lowercase();

        self.bounded(async {
            let result = recipient::Entity
                ::delete_many()
                .filter(recipient::Column::UserAddress.eq(&self.address))
                .filter(recipient::Column::Wallet.eq(&wallet))
                .exec(&self.db).await?;

            if result.rows_affected == 0 {
                return Err(AppError::NotFound(format!("recipient {} not found", wallet)));
            }

            Ok(())
        }).await
    }

    // ─── Login nonce ─────────────────────────────────────────────────

    pub async fn current_nonce(&self) -> Result<Option<String>> {
        self.bounded(async {
            let session = auth_session::Entity::find_by_id(self.address.clone()).one(&self.db).await?;
            Ok(session.and_then(|s| s.nonce))
        }).await
    }

    /// Store a freshly issued nonce, overwriting any prior unconsumed one.
    pub async fn store_nonce(&self, nonce: String) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.bounded(async {
            let existing = auth_session::Entity::find_by_id(self.address.clone()).one(&self.db).await?;

            match existing {
                Some(session) => {
                    let mut active: auth_session::ActiveModel = session.into();
                    active.nonce = Set(Some(nonce));
                    active.updated_at = Set(Utc::now());
                    active.update(&self.db).await?;
                }
                None => {
                    let session = auth_session::ActiveModel {
                        user_address: Set(self.address.clone()),
                        nonce: Set(Some(nonce)),
                        updated_at: Set(Utc::now()),
                    };
                    session.insert(&self.db).await?;
                }
            }

            Ok(())
        }).await
    }

    /// Consume the stored nonce after a successful signature verify.
    pub async fn clear_nonce(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.bounded(async {
            let session = auth_session::Entity::find_by_id(self.address.clone()).one(&self.db).await?;

            if let Some(session) = session {
                let mut active: auth_session::ActiveModel = session.into();
                active.nonce = Set(None);
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await?;
            }

            Ok(())
        }).await
    }

    // ─── Schedules ───────────────────────────────────────────────────

    pub async fn append_schedule(&self, new: NewSchedule) -> Result<schedule::Model> {
        let _guard = self.write_lock.lock().await;

        self.bounded(async {
            let now = Utc::now();
            let times_remaining = new.times_total;

            let row = schedule::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_address: Set(self.address.clone()),
                name: Set(new.name),
                recipient: Set(new.recipient.to_lowercase()),
                amount: Set(new.amount),
                currency: Set(new.currency),
                interval: Set(new.interval),
                interval_ms: Set(new.interval_ms),
                start_date: Set(new.start_date),
                time_of_day: Set(new.time_of_day),
                times_total: Set(new.times_total),
                times_remaining: Set(times_remaining),
                note: Set(new.note),
                next_run: Set(new.next_run),
                active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            };

            let row = row.insert(&self.db).await?;
            Ok(row)
        }).await
    }

    pub async fn update_schedule(&self, id: Uuid, patch: SchedulePatch) -> Result<schedule::Model> {
        let _guard = self.write_lock.lock().await;

        self.bounded(async {
            let row = schedule::Entity
                ::find_by_id(id)
                .filter(schedule::Column::UserAddress.eq(&self.address))
                .one(&self.db).await?
                .ok_or_else(|| AppError::NotFound(format!("schedule {} not found", id)))?;

            let mut active: schedule::ActiveModel = row.into();
            if let Some(next_run) = patch.next_run {
                active.next_run = Set(next_run);
            }
            if let Some(times_remaining) = patch.times_remaining {
                active.times_remaining = Set(Some(times_remaining));
            }
            if let Some(is_active) = patch.active {
                active.active = Set(is_active);
            }
            active.updated_at = Set(Utc::now());

            let row = active.update(&self.db).await?;
            Ok(row)
        }).await
    }

    pub async fn delete_schedule(&self, id: Uuid) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.bounded(async {
            let result = schedule::Entity
                ::delete_many()
                .filter(schedule::Column::Id.eq(id))
                .filter(schedule::Column::UserAddress.eq(&self.address))
                .exec(&self.db).await?;

            if result.rows_affected == 0 {
                return Err(AppError::NotFound(format!("schedule {} not found", id)));
            }

            Ok(())
        }).await
    }

    pub async fn get_schedule(&self, id: Uuid) -> Result<schedule::Model> {
        self.bounded(async {
            schedule::Entity
                ::find_by_id(id)
                .filter(schedule::Column::UserAddress.eq(&self.address))
                .one(&self.db).await?
                .ok_or_else(|| AppError::NotFound(format!("schedule {} not found", id)))
        }).await
    }

    pub async fn list_schedules(&self) -> Result<Vec<schedule::Model>> {
        self.bounded(async {
            let schedules = schedule::Entity
                ::find()
                .filter(schedule::Column::UserAddress.eq(&self.address))
                .order_by_asc(schedule::Column::NextRun)
                .all(&self.db).await?;

            Ok(schedules)
        }).await
    }

    // ─── Transactions ────────────────────────────────────────────────

    pub async fn append_transaction(&self, new: NewTransaction) -> Result<transaction::Model> {
        let _guard = self.write_lock.lock().await;

        self.bounded(async {
            let row = transaction::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_address: Set(self.address.clone()),
                kind: Set(new.kind.to_string()),
                name: Set(new.name),
                address: Set(new.address.to_lowercase()),
                amount: Set(new.amount),
                currency: Set(new.currency),
                status: Set(new.status.to_string()),
                tx_hash: Set(new.tx_hash),
                schedule_id: Set(new.schedule_id),
                note: Set(new.note),
                timestamp: Set(Utc::now()),
            };

            let row = row.insert(&self.db).await?;
            Ok(row)
        }).await
    }

    pub async fn list_transactions(&self) -> Result<Vec<transaction::Model>> {
        self.bounded(async {
            let transactions = transaction::Entity
                ::find()
                .filter(transaction::Column::UserAddress.eq(&self.address))
                .order_by_desc(transaction::Column::Timestamp)
                .all(&self.db).await?;

            Ok(transactions)
        }).await
    }
}
