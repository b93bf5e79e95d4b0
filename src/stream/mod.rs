//! Live data streaming
//!
//! The streaming sketch prints one `<timestamp> <value>` line per sample.
//! A background thread decodes those lines into bounded buffers which the
//! foreground summarizes and charts.

pub mod acquire;
pub mod buffer;
pub mod monitor;
pub mod render;

pub use monitor::{run_stream, StreamOptions};
