//! Controllers for the Arduino sketches
//!
//! Each sketch understands a handful of newline-terminated commands. The
//! controllers here wrap a [`SerialConnection`](crate::serial::SerialConnection)
//! and expose those commands as methods.

pub mod boards;
pub mod dimmer;
pub mod switch;

pub use dimmer::{Brightness, Dimmer};
pub use switch::{LightSwitch, SwitchCommand};
