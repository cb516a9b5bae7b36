//! External video tooling.

pub mod ffmpeg;
