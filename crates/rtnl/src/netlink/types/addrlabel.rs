//! IPv6 address label payload.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Address label message (struct ifaddrlblmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfAddrLblMsg {
    pub ifal_family: u8,
    pub __ifal_reserved: u8,
    pub ifal_prefixlen: u8,
    pub ifal_flags: u8,
    pub ifal_index: u32,
    pub ifal_seq: u32,
}

impl IfAddrLblMsg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.ifal_family = family;
        self
    }
}
