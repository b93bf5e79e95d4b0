//! Light switch sketch: `on`, `off` and `status` commands

use crate::error::{ArduinoError, Result};
use crate::serial::SerialConnection;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCommand {
    On,
    Off,
    Status,
}

impl SwitchCommand {
    /// Wire token for the command
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchCommand::On => "on",
            SwitchCommand::Off => "off",
            SwitchCommand::Status => "status",
        }
    }
}

impl fmt::Display for SwitchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwitchCommand {
    type Err = ArduinoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(SwitchCommand::On),
            "off" => Ok(SwitchCommand::Off),
            "status" => Ok(SwitchCommand::Status),
            other => Err(ArduinoError::UnknownSwitchCommand(other.to_string())),
        }
    }
}

/// Controller for the light switch sketch
pub struct LightSwitch<P> {
    conn: SerialConnection<P>,
}

impl<P: Read + Write> LightSwitch<P> {
    pub fn new(conn: SerialConnection<P>) -> Self {
        Self { conn }
    }

    pub fn send(&mut self, command: SwitchCommand) -> Result<String> {
        match command {
            SwitchCommand::On => self.turn_on(),
            SwitchCommand::Off => self.turn_off(),
            SwitchCommand::Status => self.status(),
        }
    }

    pub fn turn_on(&mut self) -> Result<String> {
        self.conn.send_rec(SwitchCommand::On.as_str())
    }

    pub fn turn_off(&mut self) -> Result<String> {
        self.conn.send_rec(SwitchCommand::Off.as_str())
    }

    pub fn status(&mut self) -> Result<String> {
        self.conn.send_rec(SwitchCommand::Status.as_str())
    }
}
