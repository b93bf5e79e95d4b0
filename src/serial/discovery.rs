//! Serial port discovery
//!
//! Enumerates the ports the OS reports and picks the one an Arduino is
//! attached to. No match is an error; several matches log a warning and the
//! first one wins.

use crate::devices::boards;
use crate::error::{ArduinoError, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Information about a detected serial port
#[derive(Debug, Clone, PartialEq)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl PortInfo {
    /// A bare port with only a path, as reported for non-USB devices
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            port_type: PortType::Unknown,
            manufacturer: None,
            product: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }
}

/// One-line description: `<device> - <description> (<manufacturer>)`
impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.path,
            self.product.as_deref().unwrap_or("n/a"),
            self.manufacturer.as_deref().unwrap_or("unknown")
        )
    }
}

/// Rule deciding whether a port has an Arduino behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortMatcher {
    /// Case-insensitive substring of the USB manufacturer string
    Manufacturer(String),
    /// Exact device path
    Device(String),
    /// Vendor id in the board registry, or an "arduino" manufacturer
    KnownBoards,
}

impl Default for PortMatcher {
    fn default() -> Self {
        PortMatcher::Manufacturer("arduino".to_string())
    }
}

impl PortMatcher {
    pub fn matches(&self, port: &PortInfo) -> bool {
        match self {
            PortMatcher::Manufacturer(needle) => manufacturer_contains(port, needle),
            PortMatcher::Device(path) => port.path == *path,
            PortMatcher::KnownBoards => {
                let known = match (port.vid, port.pid) {
                    (Some(vid), Some(pid)) => boards::lookup(vid, pid).is_some(),
                    _ => false,
                };
                known || manufacturer_contains(port, "arduino")
            }
        }
    }
}

impl fmt::Display for PortMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortMatcher::Manufacturer(m) => write!(f, "manufacturer contains '{}'", m),
            PortMatcher::Device(d) => write!(f, "device {}", d),
            PortMatcher::KnownBoards => write!(f, "known Arduino boards"),
        }
    }
}

fn manufacturer_contains(port: &PortInfo, needle: &str) -> bool {
    port.manufacturer
        .as_deref()
        .map(|m| m.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

/// Outcome of port selection
#[derive(Debug, Clone)]
pub struct Selection {
    pub port: PortInfo,
    /// How many ports matched; more than one means the choice was ambiguous
    pub candidates: usize,
}

impl Selection {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// Render every port on its own line
pub fn port_listing(ports: &[PortInfo]) -> String {
    ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pick the Arduino port out of `ports`
pub fn select_port(ports: &[PortInfo], matcher: &PortMatcher) -> Result<Selection> {
    let matching: Vec<&PortInfo> = ports.iter().filter(|p| matcher.matches(p)).collect();

    let Some(first) = matching.first() else {
        return Err(ArduinoError::NoDevice {
            ports: port_listing(ports),
        });
    };

    if matching.len() > 1 {
        log::warn!(
            "Multiple Arduinos found - using the first\n{}",
            port_listing(ports)
        );
    }

    Ok(Selection {
        port: (*first).clone(),
        candidates: matching.len(),
    })
}

/// List all available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;

    let port_infos = ports
        .into_iter()
        .map(|p| {
            let mut info = PortInfo::new(&p.port_name);
            match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    info.port_type = PortType::UsbSerial;
                    info.manufacturer = usb.manufacturer;
                    info.product = usb.product;
                    info.serial_number = usb.serial_number;
                    info.vid = Some(usb.vid);
                    info.pid = Some(usb.pid);
                }
                serialport::SerialPortType::PciPort => info.port_type = PortType::PciSerial,
                serialport::SerialPortType::BluetoothPort => info.port_type = PortType::Bluetooth,
                serialport::SerialPortType::Unknown => {}
            }
            info
        })
        .collect();

    Ok(port_infos)
}

/// Enumerate ports and select the Arduino
pub fn find_arduino(matcher: &PortMatcher) -> Result<Selection> {
    let ports = list_ports()?;
    log::debug!("Found {} serial ports, matching {}", ports.len(), matcher);
    select_port(&ports, matcher)
}

/// Print formatted list of available serial ports
pub fn print_ports(matcher: &PortMatcher) -> Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Plug in the Arduino with a data-capable USB cable");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyUSB* /dev/ttyACM*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        return Ok(());
    }

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in &ports {
        let tag = if matcher.matches(port) {
            " [arduino]".green().bold().to_string()
        } else {
            String::new()
        };
        println!("\n{}: {}{}", "Port".cyan(), port.path.white().bold(), tag);
        println!("  Type: {}", port.port_type);

        if let Some(ref mfg) = port.manufacturer {
            println!("  Manufacturer: {}", mfg);
        }
        if let Some(ref prod) = port.product {
            println!("  Product: {}", prod);
        }
        if let Some(ref sn) = port.serial_number {
            println!("  Serial: {}", sn);
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            match boards::lookup(vid, pid) {
                Some(board) => println!("  VID:PID: {:04x}:{:04x} ({})", vid, pid, board.name),
                None => println!("  VID:PID: {:04x}:{:04x}", vid, pid),
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("Matching rule: {}", matcher.to_string().yellow());

    Ok(())
}
