//! Neighbor payload and constants.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Neighbor discovery message (struct ndmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NdMsg {
    pub ndm_family: u8,
    pub ndm_pad1: u8,
    pub ndm_pad2: u16,
    pub ndm_ifindex: i32,
    /// NUD_* state bits.
    pub ndm_state: u16,
    /// NTF_* flags.
    pub ndm_flags: u8,
    pub ndm_type: u8,
}

impl NdMsg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.ndm_family = family;
        self
    }
}

/// Neighbor cache timers (struct nda_cacheinfo).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NdaCacheinfo {
    pub ndm_confirmed: u32,
    pub ndm_used: u32,
    pub ndm_updated: u32,
    pub ndm_refcnt: u32,
}

/// Neighbor states (NUD_*).
pub mod nud {
    pub const INCOMPLETE: u16 = 0x01;
    pub const REACHABLE: u16 = 0x02;
    pub const STALE: u16 = 0x04;
    pub const DELAY: u16 = 0x08;
    pub const PROBE: u16 = 0x10;
    pub const FAILED: u16 = 0x20;
    pub const NOARP: u16 = 0x40;
    pub const PERMANENT: u16 = 0x80;

    pub const NAMES: &[(u16, &str)] = &[
        (INCOMPLETE, "INCOMPLETE"),
        (REACHABLE, "REACHABLE"),
        (STALE, "STALE"),
        (DELAY, "DELAY"),
        (PROBE, "PROBE"),
        (FAILED, "FAILED"),
        (NOARP, "NOARP"),
        (PERMANENT, "PERMANENT"),
    ];
}

/// Neighbor flags (NTF_*).
pub mod ntf {
    pub const USE: u8 = 0x01;
    pub const SELF: u8 = 0x02;
    pub const MASTER: u8 = 0x04;
    pub const PROXY: u8 = 0x08;
    pub const EXT_LEARNED: u8 = 0x10;
    pub const OFFLOADED: u8 = 0x20;
    pub const ROUTER: u8 = 0x80;
}
