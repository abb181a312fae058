//! Address payload and constants.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Interface address message (struct ifaddrmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfAddrMsg {
    pub ifa_family: u8,
    pub ifa_prefixlen: u8,
    /// Low eight IFA_F_* flags; IFA_FLAGS carries the full set.
    pub ifa_flags: u8,
    pub ifa_scope: u8,
    pub ifa_index: u32,
}

impl IfAddrMsg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.ifa_family = family;
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.ifa_index = index;
        self
    }

    pub fn with_prefixlen(mut self, prefixlen: u8) -> Self {
        self.ifa_prefixlen = prefixlen;
        self
    }

    pub fn with_scope(mut self, scope: u8) -> Self {
        self.ifa_scope = scope;
        self
    }
}

/// Address lifetime information (struct ifa_cacheinfo).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfaCacheinfo {
    pub ifa_prefered: u32,
    pub ifa_valid: u32,
    /// Created timestamp, hundredths of seconds.
    pub cstamp: u32,
    /// Updated timestamp, hundredths of seconds.
    pub tstamp: u32,
}

/// Address flags (IFA_F_*).
pub mod ifa_flags {
    pub const SECONDARY: u32 = 0x01;
    pub const NODAD: u32 = 0x02;
    pub const OPTIMISTIC: u32 = 0x04;
    pub const DADFAILED: u32 = 0x08;
    pub const HOMEADDRESS: u32 = 0x10;
    pub const DEPRECATED: u32 = 0x20;
    pub const TENTATIVE: u32 = 0x40;
    pub const PERMANENT: u32 = 0x80;
    pub const MANAGETEMPADDR: u32 = 0x100;
    pub const NOPREFIXROUTE: u32 = 0x200;
    pub const MCAUTOJOIN: u32 = 0x400;
    pub const STABLE_PRIVACY: u32 = 0x800;

    /// Flag names in `ip address` order. PERMANENT prints inverted as
    /// `dynamic`, so it is absent here.
    pub const NAMES: &[(u32, &str)] = &[
        (SECONDARY, "secondary"),
        (NODAD, "nodad"),
        (OPTIMISTIC, "optimistic"),
        (DADFAILED, "dadfailed"),
        (HOMEADDRESS, "home"),
        (DEPRECATED, "deprecated"),
        (TENTATIVE, "tentative"),
        (MANAGETEMPADDR, "mngtmpaddr"),
        (NOPREFIXROUTE, "noprefixroute"),
        (MCAUTOJOIN, "autojoin"),
        (STABLE_PRIVACY, "stable-privacy"),
    ];
}

/// Route and address scopes (RT_SCOPE_*).
pub mod scope {
    pub const UNIVERSE: u8 = 0;
    pub const SITE: u8 = 200;
    pub const LINK: u8 = 253;
    pub const HOST: u8 = 254;
    pub const NOWHERE: u8 = 255;
}
