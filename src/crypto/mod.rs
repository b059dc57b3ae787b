pub mod worker_auth;

pub use worker_auth::{ WorkerAuth, AUTH_HEADER, TIMESTAMP_HEADER };
