//! Serial port configuration and line-oriented exchange
//!
//! The sketches speak newline-terminated ASCII: one request line, one reply
//! line. Replies are capped at [`DEFAULT_REPLY_CAP`](crate::config::DEFAULT_REPLY_CAP)
//! bytes, mirroring the sketch's receive buffer.

use crate::config::{DEFAULT_BAUD, DEFAULT_REPLY_CAP};
use crate::error::{ArduinoError, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyACM0, COM3)
    pub port_path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Read timeout; a read that times out returns what it has so far
    pub timeout: Duration,
    pub reply_cap: usize,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: String::from("/dev/ttyACM0"),
            baud_rate: DEFAULT_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_secs(1),
            reply_cap: DEFAULT_REPLY_CAP,
        }
    }
}

impl PortConfig {
    /// Create a new configuration with 9600 8N1 settings
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reply_cap(mut self, reply_cap: usize) -> Self {
        self.reply_cap = reply_cap;
        self
    }
}

/// Line-oriented connection to a board.
///
/// Generic over the transport so the exchange logic works the same on a real
/// port and on an in-memory one.
pub struct SerialConnection<P = Box<dyn SerialPort>> {
    port: P,
    name: String,
    reply_cap: usize,
}

impl SerialConnection {
    /// Open a serial connection with the given configuration
    pub fn open(config: &PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()?;

        log::debug!(
            "Opened {} at {} baud (timeout {:?})",
            config.port_path,
            config.baud_rate,
            config.timeout
        );

        Ok(Self {
            port,
            name: config.port_path.clone(),
            reply_cap: config.reply_cap,
        })
    }

    /// Discard anything the board printed while resetting
    pub fn clear_input(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

impl<P: Read + Write> SerialConnection<P> {
    /// Wrap an already-open transport
    #[cfg(test)]
    pub fn from_transport(port: P, name: &str) -> Self {
        Self {
            port,
            name: name.to_string(),
            reply_cap: DEFAULT_REPLY_CAP,
        }
    }

    /// Port name this connection was opened on
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Longest line `read_line` returns before giving up on a delimiter
    pub fn reply_cap(&self) -> usize {
        self.reply_cap
    }

    /// Wait for the board to come out of reset after the port was opened
    pub fn wait_for_handshake(&self, delay: Duration) {
        if !delay.is_zero() {
            log::debug!("Waiting {:?} for {} to reset", delay, self.name);
            std::thread::sleep(delay);
        }
    }

    /// Read until `delimiter` (kept in the output) or until `cap` bytes.
    ///
    /// A read timeout or end of stream ends the read early; the bytes read so
    /// far are returned, possibly none.
    pub fn read_until(&mut self, delimiter: u8, cap: usize) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut byte = [0u8; 1];

        while buffer.len() < cap {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    buffer.push(byte[0]);
                    if byte[0] == delimiter {
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::TimedOut => break,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(buffer)
    }

    /// Read one newline-terminated line, capped at the reply size
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        let cap = self.reply_cap;
        self.read_until(b'\n', cap)
    }

    /// Write `msg` followed by a newline
    pub fn write_line(&mut self, msg: &str) -> Result<()> {
        self.port.write_all(msg.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;
        Ok(())
    }

    /// Send one command line and block for the one-line reply.
    ///
    /// The reply is returned without its line terminator.
    pub fn send_rec(&mut self, msg: &str) -> Result<String> {
        self.write_line(msg)?;
        log::debug!("[{}] sent {:?}", self.name, msg);

        let raw = self.read_line()?;
        if raw.is_empty() {
            return Err(ArduinoError::NoReply {
                command: msg.to_string(),
                port: self.name.clone(),
            });
        }

        let reply = String::from_utf8_lossy(&raw)
            .trim_end_matches(&['\r', '\n'][..])
            .to_string();
        log::debug!("[{}] received {:?}", self.name, reply);
        Ok(reply)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::io::{self, Cursor, Read, Write};
    use std::sync::{Arc, Mutex};

    /// In-memory port: reads come from a fixed script, writes are recorded
    #[derive(Clone)]
    pub struct MockPort {
        input: Arc<Mutex<Cursor<Vec<u8>>>>,
        pub written: Arc<Mutex<Vec<u8>>>,
        /// Report a timeout instead of EOF once the script is exhausted
        timeout_at_end: bool,
    }

    impl MockPort {
        pub fn new(input: &[u8]) -> Self {
            Self {
                input: Arc::new(Mutex::new(Cursor::new(input.to_vec()))),
                written: Arc::new(Mutex::new(Vec::new())),
                timeout_at_end: false,
            }
        }

        pub fn timing_out(input: &[u8]) -> Self {
            Self {
                timeout_at_end: true,
                ..Self::new(input)
            }
        }

        pub fn written_str(&self) -> String {
            String::from_utf8_lossy(&self.written.lock().unwrap()).to_string()
        }
    }

    impl Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.input.lock().unwrap().read(buf)?;
            if n == 0 && self.timeout_at_end {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
            }
            Ok(n)
        }
    }

    impl Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
