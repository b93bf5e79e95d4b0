//! Registry of USB identities used by Arduino boards and common clones

use once_cell::sync::Lazy;

/// A USB vendor (and optionally a set of products) known to carry an Arduino
#[derive(Debug, Clone)]
pub struct BoardId {
    pub name: &'static str,
    pub vid: u16,
    /// Empty means any product from this vendor
    pub pids: &'static [u16],
}

impl BoardId {
    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        self.vid == vid && (self.pids.is_empty() || self.pids.contains(&pid))
    }
}

pub static KNOWN_BOARDS: Lazy<Vec<BoardId>> = Lazy::new(|| {
    vec![
        BoardId {
            name: "Arduino LLC",
            vid: 0x2341,
            pids: &[],
        },
        BoardId {
            name: "Arduino SRL",
            vid: 0x2a03,
            pids: &[],
        },
        BoardId {
            name: "SparkFun (Arduino compatible)",
            vid: 0x1b4f,
            pids: &[],
        },
        // Nano/Uno clones
        BoardId {
            name: "WCH CH340",
            vid: 0x1a86,
            pids: &[0x7523],
        },
        // Duemilanove and older
        BoardId {
            name: "FTDI FT232R",
            vid: 0x0403,
            pids: &[0x6001],
        },
    ]
});

/// Look up the board family for a USB VID/PID pair
pub fn lookup(vid: u16, pid: u16) -> Option<&'static BoardId> {
    KNOWN_BOARDS.iter().find(|b| b.matches(vid, pid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_official_vendor_any_product() {
        assert_eq!(lookup(0x2341, 0x0043).map(|b| b.name), Some("Arduino LLC"));
        assert_eq!(lookup(0x2341, 0x8036).map(|b| b.name), Some("Arduino LLC"));
    }

    #[test]
    fn test_clone_requires_product() {
        assert!(lookup(0x1a86, 0x7523).is_some());
        assert!(lookup(0x1a86, 0x5523).is_none());
        assert!(lookup(0x067b, 0x2303).is_none());
    }
}
