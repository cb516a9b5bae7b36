//! Business logic and port trait definitions for Birdie.
//!
//! This crate defines the "ports" (repository, messaging, storage, media and
//! analysis traits) that the infrastructure layer implements, plus the
//! conversation state handling and the video ingestion pipeline built on
//! them. It depends only on `birdie-types` -- never on `birdie-infra` or any
//! database/IO crate.

pub mod analysis;
pub mod conversation;
pub mod media;
pub mod messaging;
pub mod pipeline;
pub mod ports;
pub mod repository;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
