//! Conversation handling: session persistence, per-user ingestion
//! exclusion, and inbound event dispatch.

pub mod guard;
pub mod router;
pub mod session;
