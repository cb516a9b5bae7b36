//! HTTP adapter for the motion-analysis service.

pub mod http;
