//! Infrastructure layer for Birdie.
//!
//! Implements the port traits defined in `birdie-core`: SQLite document
//! storage, the LINE Messaging API, Google Drive, the motion-analysis HTTP
//! service and ffmpeg. Also loads configuration and credentials.

pub mod analysis;
pub mod config;
pub mod drive;
pub mod line;
pub mod media;
pub mod secret;
pub mod sqlite;
