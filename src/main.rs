//! Arduino Serial Tools
//!
//! Small utilities for Arduino sketches that speak newline-terminated ASCII
//! over a USB serial port.
//!
//! # Features
//!
//! - **Port discovery**: find the Arduino among the OS serial ports
//! - **Light switch**: `on`, `off` and `status` commands
//! - **Dimmer**: send PWM levels 0-255, one-shot or interactively
//! - **Streaming**: buffer `<timestamp> <value>` samples in the background,
//!   print running min/mean/max and keep an SVG chart up to date
//!
//! # Usage
//!
//! ```bash
//! # List serial ports, flagging Arduinos
//! arduino-serial ports
//!
//! # Turn the LED on
//! arduino-serial switch on
//!
//! # Dim to half brightness, or read levels from stdin
//! arduino-serial dim 128
//! arduino-serial dim
//!
//! # Stream samples and keep a live chart
//! arduino-serial stream --plot live.svg
//! ```

mod config;
mod devices;
mod error;
mod serial;
mod stream;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use devices::{Brightness, Dimmer, LightSwitch, SwitchCommand};
use serial::discovery;
use stream::StreamOptions;

/// Arduino Serial Tools
///
/// Talk to Arduino sketches over a serial port
#[derive(Parser)]
#[command(name = "arduino-serial")]
#[command(version = "0.1.0")]
#[command(about = "Serial utilities for Arduino light switch, dimmer and streaming sketches")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port path, skips auto-detection (e.g., /dev/ttyACM0)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Baud rate (overrides the configured rate for the command)
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Milliseconds to wait for the board to reset after opening the port
    #[arg(long, global = true)]
    handshake_ms: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available serial ports
    Ports,

    /// Show which port would be used
    Detect,

    /// Send one line and print the reply
    Send {
        /// Text to send (a newline is appended)
        text: String,
    },

    /// Turn the LED on, wait, then turn it off
    Blink {
        /// Milliseconds between on and off
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
    },

    /// Light switch sketch command
    Switch {
        /// on, off or status
        command: SwitchCommand,
    },

    /// Dimmer sketch; without a level, read levels from stdin
    Dim {
        /// Brightness 0-255
        level: Option<Brightness>,
    },

    /// Stream `<timestamp> <value>` samples until Ctrl+C
    Stream {
        /// Keep an SVG chart of the buffered samples at this path
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Number of samples kept
        #[arg(long)]
        capacity: Option<usize>,

        /// Chart redraw interval in milliseconds
        #[arg(long)]
        refresh_ms: Option<u64>,

        /// Do not print the periodic summary
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(ms) = cli.handshake_ms {
        config.handshake_ms = ms;
    }

    match cli.command {
        Commands::Ports => discovery::print_ports(&config.matcher)?,
        Commands::Detect => handle_detect(&config)?,
        Commands::Send { ref text } => handle_send(&cli, &config, text)?,
        Commands::Blink { delay_ms } => handle_blink(&cli, &config, delay_ms)?,
        Commands::Switch { command } => handle_switch(&cli, &config, command)?,
        Commands::Dim { level } => handle_dim(&cli, &config, level)?,
        Commands::Stream {
            ref plot,
            capacity,
            refresh_ms,
            quiet,
        } => {
            if let Some(capacity) = capacity {
                config.buffer_capacity = capacity;
            }
            if let Some(ms) = refresh_ms {
                config.refresh_ms = ms;
            }
            config.validate()?;

            let options = StreamOptions {
                plot: plot.clone(),
                quiet,
            };
            handle_stream(&cli, &config, &options)?;
        }
    }

    Ok(())
}

fn connect(cli: &Cli, config: &Config, default_baud: u32) -> Result<serial::SerialConnection> {
    let baud_rate = cli.baud.unwrap_or(default_baud);
    serial::connect_arduino(config, cli.port.as_deref(), baud_rate)
        .context("Failed to connect to the Arduino")
}

fn print_reply(command: &str, reply: &str) {
    println!("{} {}", "[TX]".cyan().bold(), command);
    println!("{} {}", "[RX]".green().bold(), reply.white());
}

fn handle_detect(config: &Config) -> Result<()> {
    println!(
        "{} Detecting Arduino ({})...",
        "[*]".cyan().bold(),
        config.matcher
    );

    match discovery::find_arduino(&config.matcher) {
        Ok(selection) => {
            println!("\n{} {}", "[OK]".green().bold(), selection.port);
            if selection.is_ambiguous() {
                println!(
                    "{} {} ports matched, the first one is used",
                    "[WARNING]".yellow().bold(),
                    selection.candidates
                );
            }
            println!("\n{}", "To switch the LED on:".cyan());
            println!("  arduino-serial switch on -p {}", selection.port.path.white());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "[ERROR]".red().bold(), e);
            println!("\n{}", "Troubleshooting:".white().bold());
            println!("  1. Check the USB cable carries data");
            println!("  2. Check permissions: sudo usermod -aG dialout $USER");
            println!("  3. Pass the port explicitly with -p");
            Err(e.into())
        }
    }
}

fn handle_send(cli: &Cli, config: &Config, text: &str) -> Result<()> {
    let mut conn = connect(cli, config, config.baud_rate)?;
    let reply = conn.send_rec(text)?;
    print_reply(text, &reply);
    Ok(())
}

fn handle_blink(cli: &Cli, config: &Config, delay_ms: u64) -> Result<()> {
    let mut switch = LightSwitch::new(connect(cli, config, config.baud_rate)?);

    let reply = switch.turn_on()?;
    print_reply(SwitchCommand::On.as_str(), &reply);

    std::thread::sleep(Duration::from_millis(delay_ms));

    let reply = switch.turn_off()?;
    print_reply(SwitchCommand::Off.as_str(), &reply);
    Ok(())
}

fn handle_switch(cli: &Cli, config: &Config, command: SwitchCommand) -> Result<()> {
    let mut switch = LightSwitch::new(connect(cli, config, config.baud_rate)?);
    let reply = switch.send(command)?;
    print_reply(command.as_str(), &reply);
    Ok(())
}

fn handle_dim(cli: &Cli, config: &Config, level: Option<Brightness>) -> Result<()> {
    let mut dimmer = Dimmer::new(connect(cli, config, config.baud_rate)?);

    match level {
        Some(level) => {
            let reply = dimmer.set_level(level)?;
            print_reply(&level.to_string(), &reply);
        }
        None => {
            println!(
                "{} Enter brightness levels ({}-{}), 'q' to quit",
                "[*]".cyan().bold(),
                Brightness::MIN,
                Brightness::MAX
            );
            let stdin = std::io::stdin();
            let sent = dimmer.run_interactive(stdin.lock())?;
            println!("{} {} levels sent", "[OK]".green().bold(), sent);
        }
    }
    Ok(())
}

fn handle_stream(cli: &Cli, config: &Config, options: &StreamOptions) -> Result<()> {
    let conn = connect(cli, config, config.stream_baud_rate)?;
    stream::run_stream(conn, config, options)
}
