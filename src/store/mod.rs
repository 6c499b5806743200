//! Persistence layer — SQLite-backed storage for the profile, daily plans,
//! and weekly reviews.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Store, StoreStats};
