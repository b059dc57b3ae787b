pub mod auth_session;
pub mod recipient;
pub mod schedule;
pub mod schedule_index;
pub mod transaction;

pub use auth_session::Entity as AuthSession;
pub use recipient::Entity as Recipient;
pub use schedule::Entity as Schedule;
pub use schedule_index::Entity as ScheduleIndex;
pub use transaction::Entity as Transaction;
