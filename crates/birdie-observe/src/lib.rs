//! Observability setup for Birdie: log formatting and optional trace export.

pub mod tracing_setup;
