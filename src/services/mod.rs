pub mod auth_service;
pub mod executor_client;
pub mod intent_service;
pub mod recipient_service;
pub mod schedule_service;
pub mod transaction_service;

pub use auth_service::AuthService;
pub use executor_client::{ DispatchPayload, ExecutorClient, ExecutorResponse };
pub use intent_service::{ CanonicalIntent, HttpIntentParser, IntentOutcome, IntentParser, IntentService, ParsedIntent };
pub use recipient_service::{ RecipientService, ResolveOutcome };
pub use schedule_service::{ CreateScheduleRequest, ScheduleService };
pub use transaction_service::{ StoreTransactionRequest, TransactionService };
