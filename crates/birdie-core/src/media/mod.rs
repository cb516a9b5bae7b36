//! Video artifacts: the transcoder port and scoped temp files.

pub mod temp;
pub mod transcoder;
