//! LINE Messaging API adapter: outbound client and webhook handling.

pub mod client;
pub mod types;
pub mod webhook;
