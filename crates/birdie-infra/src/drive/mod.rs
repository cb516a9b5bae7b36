//! Google Drive adapter for the object store port.

pub mod auth;
pub mod client;
