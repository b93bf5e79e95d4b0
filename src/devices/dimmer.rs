//! Dimmer sketch: the board reads a decimal level, writes it to the PWM pin
//! and answers `ok`.

use crate::error::{ArduinoError, Result};
use crate::serial::SerialConnection;
use colored::Colorize;
use std::fmt;
use std::io::{BufRead, Read, Write};
use std::str::FromStr;

/// PWM duty level, 0 (off) to 255 (full)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Brightness = Brightness(0);
    pub const MAX: Brightness = Brightness(255);

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Brightness {
    type Error = ArduinoError;

    fn try_from(level: i64) -> Result<Self> {
        u8::try_from(level)
            .map(Brightness)
            .map_err(|_| ArduinoError::InvalidBrightness(level))
    }
}

impl FromStr for Brightness {
    type Err = ArduinoError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let level: i64 = trimmed
            .parse()
            .map_err(|_| ArduinoError::UnparsableBrightness(trimmed.to_string()))?;
        Brightness::try_from(level)
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Controller for the dimmer sketch
pub struct Dimmer<P> {
    conn: SerialConnection<P>,
}

impl<P: Read + Write> Dimmer<P> {
    pub fn new(conn: SerialConnection<P>) -> Self {
        Self { conn }
    }

    /// Send a level and return the board's acknowledgement
    pub fn set_level(&mut self, level: Brightness) -> Result<String> {
        self.conn.send_rec(&level.to_string())
    }

    /// Read levels line by line from `input` and send each one.
    ///
    /// Bad lines are reported and skipped. Stops at end of input or on `q`.
    /// Returns how many levels were sent.
    pub fn run_interactive<R: BufRead>(&mut self, input: R) -> Result<usize> {
        let mut sent = 0;

        for line in input.lines() {
            let line = line?;
            let entry = line.trim();
            if entry.is_empty() {
                continue;
            }
            if entry.eq_ignore_ascii_case("q") || entry.eq_ignore_ascii_case("quit") {
                break;
            }

            match entry.parse::<Brightness>() {
                Ok(level) => {
                    let reply = self.set_level(level)?;
                    println!("{} {} -> {}", "[TX]".cyan().bold(), level, reply);
                    sent += 1;
                }
                Err(e) => {
                    eprintln!("{} {}", "[WARNING]".yellow().bold(), e);
                }
            }
        }

        Ok(sent)
    }
}
