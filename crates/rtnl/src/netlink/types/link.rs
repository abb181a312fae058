//! Link (network interface) payload and constants.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Interface info message (struct ifinfomsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfInfoMsg {
    /// Address family (usually AF_UNSPEC).
    pub ifi_family: u8,
    pub __ifi_pad: u8,
    /// Device type (ARPHRD_*).
    pub ifi_type: u16,
    /// Interface index.
    pub ifi_index: i32,
    /// Device flags (IFF_*).
    pub ifi_flags: u32,
    /// Change mask.
    pub ifi_change: u32,
}

impl IfInfoMsg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.ifi_index = index;
        self
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.ifi_family = family;
        self
    }

    /// Set `flags` under `change`, leaving other bits alone.
    pub fn with_flags(mut self, flags: u32, change: u32) -> Self {
        self.ifi_flags = flags;
        self.ifi_change = change;
        self
    }
}

/// Interface flags (IFF_*).
pub mod iff {
    pub const UP: u32 = 1 << 0;
    pub const BROADCAST: u32 = 1 << 1;
    pub const DEBUG: u32 = 1 << 2;
    pub const LOOPBACK: u32 = 1 << 3;
    pub const POINTOPOINT: u32 = 1 << 4;
    pub const NOTRAILERS: u32 = 1 << 5;
    pub const RUNNING: u32 = 1 << 6;
    pub const NOARP: u32 = 1 << 7;
    pub const PROMISC: u32 = 1 << 8;
    pub const ALLMULTI: u32 = 1 << 9;
    pub const MASTER: u32 = 1 << 10;
    pub const SLAVE: u32 = 1 << 11;
    pub const MULTICAST: u32 = 1 << 12;
    pub const PORTSEL: u32 = 1 << 13;
    pub const AUTOMEDIA: u32 = 1 << 14;
    pub const DYNAMIC: u32 = 1 << 15;
    pub const LOWER_UP: u32 = 1 << 16;
    pub const DORMANT: u32 = 1 << 17;
    pub const ECHO: u32 = 1 << 18;

    /// Flag names in the order `ip link` prints them.
    pub const NAMES: &[(u32, &str)] = &[
        (LOOPBACK, "LOOPBACK"),
        (BROADCAST, "BROADCAST"),
        (POINTOPOINT, "POINTOPOINT"),
        (MULTICAST, "MULTICAST"),
        (NOARP, "NOARP"),
        (ALLMULTI, "ALLMULTI"),
        (PROMISC, "PROMISC"),
        (NOTRAILERS, "NOTRAILERS"),
        (DEBUG, "DEBUG"),
        (DYNAMIC, "DYNAMIC"),
        (AUTOMEDIA, "AUTOMEDIA"),
        (PORTSEL, "PORTSEL"),
        (MASTER, "MASTER"),
        (SLAVE, "SLAVE"),
        (UP, "UP"),
        (LOWER_UP, "LOWER_UP"),
        (DORMANT, "DORMANT"),
        (ECHO, "ECHO"),
    ];
}

/// Hardware types (ARPHRD_*) the formatter knows by name.
pub fn arphrd_name(ty: u16) -> Option<&'static str> {
    Some(match ty {
        1 => "ether",
        24 => "ieee1394",
        32 => "infiniband",
        512 => "ppp",
        768 => "ipip",
        769 => "tunnel6",
        772 => "loopback",
        776 => "sit",
        778 => "gre",
        783 => "irda",
        801 => "ieee80211",
        803 => "ieee80211_radiotap",
        823 => "ip6gre",
        0xfffe => "none",
        0xffff => "void",
        _ => return None,
    })
}

/// Operational state (IF_OPER_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperState {
    Unknown = 0,
    NotPresent = 1,
    Down = 2,
    LowerLayerDown = 3,
    Testing = 4,
    Dormant = 5,
    Up = 6,
}

impl From<u8> for OperState {
    fn from(val: u8) -> Self {
        match val {
            1 => Self::NotPresent,
            2 => Self::Down,
            3 => Self::LowerLayerDown,
            4 => Self::Testing,
            5 => Self::Dormant,
            6 => Self::Up,
            _ => Self::Unknown,
        }
    }
}

impl OperState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::NotPresent => "NOTPRESENT",
            Self::Down => "DOWN",
            Self::LowerLayerDown => "LOWERLAYERDOWN",
            Self::Testing => "TESTING",
            Self::Dormant => "DORMANT",
            Self::Up => "UP",
        }
    }
}

/// Number of counters in `struct rtnl_link_stats64` that are decoded.
pub const LINK_STATS64_COUNT: usize = 23;

/// Counter names of [`LinkStats64`], in kernel order.
pub const LINK_STATS64_NAMES: [&str; LINK_STATS64_COUNT] = [
    "rx_packets",
    "tx_packets",
    "rx_bytes",
    "tx_bytes",
    "rx_errors",
    "tx_errors",
    "rx_dropped",
    "tx_dropped",
    "multicast",
    "collisions",
    "rx_length_errors",
    "rx_over_errors",
    "rx_crc_errors",
    "rx_frame_errors",
    "rx_fifo_errors",
    "rx_missed_errors",
    "tx_aborted_errors",
    "tx_carrier_errors",
    "tx_fifo_errors",
    "tx_heartbeat_errors",
    "tx_window_errors",
    "rx_compressed",
    "tx_compressed",
];

/// Link counters from IFLA_STATS64.
///
/// Newer kernels append fields to the struct; only the leading
/// [`LINK_STATS64_COUNT`] are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats64(pub [u64; LINK_STATS64_COUNT]);

impl LinkStats64 {
    /// Decode from the attribute value. Returns `None` when too short.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < LINK_STATS64_COUNT * 8 {
            return None;
        }
        let mut stats = [0u64; LINK_STATS64_COUNT];
        for (slot, chunk) in stats.iter_mut().zip(data.chunks_exact(8)) {
            *slot = u64::from_ne_bytes(chunk.try_into().ok()?);
        }
        Some(Self(stats))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    /// Counters paired with their names.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        LINK_STATS64_NAMES.iter().copied().zip(self.0.iter().copied())
    }

    pub fn rx_packets(&self) -> u64 {
        self.0[0]
    }

    pub fn tx_packets(&self) -> u64 {
        self.0[1]
    }

    pub fn rx_bytes(&self) -> u64 {
        self.0[2]
    }

    pub fn tx_bytes(&self) -> u64 {
        self.0[3]
    }

    pub fn rx_errors(&self) -> u64 {
        self.0[4]
    }

    pub fn tx_errors(&self) -> u64 {
        self.0[5]
    }

    pub fn rx_dropped(&self) -> u64 {
        self.0[6]
    }

    pub fn tx_dropped(&self) -> u64 {
        self.0[7]
    }

    pub fn multicast(&self) -> u64 {
        self.0[8]
    }

    pub fn collisions(&self) -> u64 {
        self.0[9]
    }
}

/// RTEXT_FILTER_* bits for IFLA_EXT_MASK.
pub mod rtext_filter {
    pub const VF: u32 = 1 << 0;
    pub const BRVLAN: u32 = 1 << 1;
    pub const SKIP_STATS: u32 = 1 << 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_decode_ignores_newer_fields() {
        let mut raw = Vec::new();
        for i in 0..(LINK_STATS64_COUNT as u64 + 3) {
            raw.extend_from_slice(&i.to_ne_bytes());
        }
        let stats = LinkStats64::from_bytes(&raw).unwrap();
        assert_eq!(stats.rx_packets(), 0);
        assert_eq!(stats.collisions(), 9);
        assert_eq!(stats.iter().last(), Some(("tx_compressed", 22)));
        assert!(LinkStats64::from_bytes(&raw[..8 * 10]).is_none());
    }

    #[test]
    fn test_operstate_names() {
        assert_eq!(OperState::from(6), OperState::Up);
        assert_eq!(OperState::from(42).name(), "UNKNOWN");
        assert_eq!(OperState::LowerLayerDown.name(), "LOWERLAYERDOWN");
    }
}
