//! HTTP layer: the LINE webhook endpoint and a health check.

pub mod error;
pub mod handlers;
pub mod router;
