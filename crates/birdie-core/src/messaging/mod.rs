//! Messaging platform port and reply builders.

pub mod platform;
pub mod replies;
