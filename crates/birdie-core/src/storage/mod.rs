//! Object storage port.

pub mod object_store;
