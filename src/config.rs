//! Tool configuration
//!
//! Settings are read from an optional TOML file. Every key has a default so a
//! partial file (or no file at all) is valid:
//!
//! ```toml
//! baud_rate = 9600
//! stream_baud_rate = 250000
//! handshake_ms = 2000
//! matcher = { manufacturer = "arduino" }
//!
//! [plot]
//! y_min = 400.0
//! y_max = 600.0
//! ```

use crate::error::{ArduinoError, Result};
use crate::serial::discovery::PortMatcher;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Baud rate the command sketches (switch, dimmer) are built with
pub const DEFAULT_BAUD: u32 = 9600;

/// Baud rate of the streaming sketch
pub const DEFAULT_STREAM_BAUD: u32 = 250_000;

/// Maximum reply length in bytes, matching the sketch's BUFFERSIZE
pub const DEFAULT_REPLY_CAP: usize = 255;

/// Samples kept for plotting
pub const DEFAULT_BUFFER_CAPACITY: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub baud_rate: u32,
    pub stream_baud_rate: u32,
    /// Time to wait after opening the port; the board resets on connect
    pub handshake_ms: u64,
    pub read_timeout_ms: u64,
    pub reply_cap: usize,
    pub buffer_capacity: usize,
    /// Chart redraw interval
    pub refresh_ms: u64,
    /// Summary print interval
    pub summary_ms: u64,
    pub matcher: PortMatcher,
    pub plot: PlotSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub y_min: f64,
    pub y_max: f64,
    pub width: u32,
    pub height: u32,
    /// X span used until enough samples arrive to autoscale
    pub idle_x_span: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD,
            stream_baud_rate: DEFAULT_STREAM_BAUD,
            handshake_ms: 2000,
            read_timeout_ms: 1000,
            reply_cap: DEFAULT_REPLY_CAP,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            refresh_ms: 20,
            summary_ms: 500,
            matcher: PortMatcher::default(),
            plot: PlotSettings::default(),
        }
    }
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            y_min: 400.0,
            y_max: 600.0,
            width: 1000,
            height: 450,
            idle_x_span: 30.0,
        }
    }
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ArduinoError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ArduinoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(ArduinoError::Config("buffer_capacity must be positive".into()));
        }
        if self.reply_cap == 0 {
            return Err(ArduinoError::Config("reply_cap must be positive".into()));
        }
        if self.refresh_ms == 0 || self.summary_ms == 0 {
            return Err(ArduinoError::Config("refresh intervals must be positive".into()));
        }
        if self.plot.y_min >= self.plot.y_max {
            return Err(ArduinoError::Config(format!(
                "plot y_min ({}) must be below y_max ({})",
                self.plot.y_min, self.plot.y_max
            )));
        }
        Ok(())
    }

    pub fn handshake_delay(&self) -> Duration {
        Duration::from_millis(self.handshake_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_millis(self.summary_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.stream_baud_rate, 250_000);
        assert_eq!(config.reply_cap, 255);
        assert_eq!(config.buffer_capacity, 2000);
        assert_eq!(config.handshake_delay(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("baud_rate = 115200\n[plot]\ny_max = 1023.0\n").unwrap();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.stream_baud_rate, 250_000);
        assert_eq!(config.plot.y_max, 1023.0);
        assert_eq!(config.plot.y_min, 400.0);
    }

    #[test]
    fn test_matcher_variants() {
        let config = Config::parse("matcher = { device = \"/dev/cu.usbserial-1130\" }").unwrap();
        assert_eq!(
            config.matcher,
            PortMatcher::Device("/dev/cu.usbserial-1130".to_string())
        );

        let config = Config::parse("matcher = \"known_boards\"").unwrap();
        assert_eq!(config.matcher, PortMatcher::KnownBoards);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::parse("buffer_capacity = 0").is_err());
        assert!(Config::parse("[plot]\ny_min = 10.0\ny_max = 5.0").is_err());
        assert!(Config::parse("baud_rate = \"fast\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "handshake_ms = 500").unwrap();
        writeln!(file, "buffer_capacity = 16").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.handshake_delay(), Duration::from_millis(500));
        assert_eq!(config.buffer_capacity, 16);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/arduino.toml")).unwrap_err();
        assert!(matches!(err, ArduinoError::Config(_)));
    }
}
