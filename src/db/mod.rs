pub mod entity;
pub use entity::*;

mod shard;
pub use shard::{ NewSchedule, NewTransaction, RecipientPatch, SchedulePatch, ShardManager, UserShard };

mod index;
pub use index::ScheduleIndexStore;
