//! Motion-analysis port and the retrying client around it.

pub mod backend;
pub mod client;
