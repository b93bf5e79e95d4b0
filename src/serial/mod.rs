//! Serial port communication with Arduino sketches
//!
//! This module provides functionality for:
//! - Finding the port an Arduino is attached to
//! - Opening it and waiting out the board reset
//! - Exchanging newline-terminated command and reply lines

pub mod discovery;
pub mod port;

pub use discovery::find_arduino;
pub use port::{PortConfig, SerialConnection};

use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// Resolve the port, open it at `baud_rate` and wait for the board handshake.
///
/// An explicit `port` skips discovery.
pub fn connect_arduino(
    config: &Config,
    port: Option<&str>,
    baud_rate: u32,
) -> Result<SerialConnection> {
    let path = match port {
        Some(p) => p.to_string(),
        None => {
            let selection = find_arduino(&config.matcher)?;
            println!("{} Using {}", "[*]".cyan().bold(), selection.port);
            selection.port.path
        }
    };

    let port_config = PortConfig::new(&path)
        .with_baud_rate(baud_rate)
        .with_timeout(config.read_timeout())
        .with_reply_cap(config.reply_cap);

    let mut conn = SerialConnection::open(&port_config)?;
    conn.wait_for_handshake(config.handshake_delay());
    conn.clear_input()?;

    println!(
        "{} Connected to {} at {} baud",
        "[OK]".green().bold(),
        path.white().bold(),
        baud_rate
    );

    Ok(conn)
}
