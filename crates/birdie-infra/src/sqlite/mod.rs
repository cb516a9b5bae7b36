//! SQLite storage layer.
//!
//! Repository implementations backed by a JSON document table with WAL mode
//! and split read/write connection pools.

pub mod document;
pub mod pool;
pub mod session;
pub mod user;
