//! Route payload and constants.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Route message (struct rtmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtMsg {
    pub rtm_family: u8,
    pub rtm_dst_len: u8,
    pub rtm_src_len: u8,
    pub rtm_tos: u8,
    /// Routing table id; values above 255 travel in RTA_TABLE.
    pub rtm_table: u8,
    pub rtm_protocol: u8,
    pub rtm_scope: u8,
    pub rtm_type: u8,
    pub rtm_flags: u32,
}

impl RtMsg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.rtm_family = family;
        self
    }

    pub fn with_table(mut self, table: u8) -> Self {
        self.rtm_table = table;
        self
    }
}

/// Well-known routing tables (RT_TABLE_*).
pub mod table {
    pub const UNSPEC: u32 = 0;
    pub const COMPAT: u32 = 252;
    pub const DEFAULT: u32 = 253;
    pub const MAIN: u32 = 254;
    pub const LOCAL: u32 = 255;
}

/// Route types (RTN_*).
pub mod rtn {
    pub const UNSPEC: u8 = 0;
    pub const UNICAST: u8 = 1;
    pub const LOCAL: u8 = 2;
    pub const BROADCAST: u8 = 3;
    pub const ANYCAST: u8 = 4;
    pub const MULTICAST: u8 = 5;
    pub const BLACKHOLE: u8 = 6;
    pub const UNREACHABLE: u8 = 7;
    pub const PROHIBIT: u8 = 8;
    pub const THROW: u8 = 9;
    pub const NAT: u8 = 10;
    pub const XRESOLVE: u8 = 11;

    pub fn name(ty: u8) -> String {
        match ty {
            UNSPEC => "none".into(),
            UNICAST => "unicast".into(),
            LOCAL => "local".into(),
            BROADCAST => "broadcast".into(),
            ANYCAST => "anycast".into(),
            MULTICAST => "multicast".into(),
            BLACKHOLE => "blackhole".into(),
            UNREACHABLE => "unreachable".into(),
            PROHIBIT => "prohibit".into(),
            THROW => "throw".into(),
            NAT => "nat".into(),
            XRESOLVE => "xresolve".into(),
            other => other.to_string(),
        }
    }
}

/// Route flags (RTM_F_* and RTNH_F_*).
pub mod rtm_flags {
    pub const DEAD: u32 = 1;
    pub const PERVASIVE: u32 = 2;
    pub const ONLINK: u32 = 4;
    pub const OFFLOAD: u32 = 8;
    pub const LINKDOWN: u32 = 16;
    pub const NOTIFY: u32 = 0x100;
    pub const CLONED: u32 = 0x200;

    pub const NAMES: &[(u32, &str)] = &[
        (DEAD, "dead"),
        (PERVASIVE, "pervasive"),
        (ONLINK, "onlink"),
        (OFFLOAD, "offload"),
        (LINKDOWN, "linkdown"),
        (NOTIFY, "notify"),
        (CLONED, "cloned"),
    ];
}
