//! Shared domain types for the Birdie coaching bot.
//!
//! Skills, sessions, portfolios, analysis results, inbound events, outbound
//! messages, configuration, and the error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, base64.

pub mod analysis;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod portfolio;
pub mod session;
pub mod skill;
