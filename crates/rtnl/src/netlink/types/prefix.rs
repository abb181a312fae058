//! IPv6 prefix notification payload (RTM_NEWPREFIX).

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// struct prefixmsg.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PrefixMsg {
    pub prefix_family: u8,
    pub prefix_pad1: u8,
    pub prefix_pad2: u16,
    pub prefix_ifindex: i32,
    pub prefix_type: u8,
    pub prefix_len: u8,
    /// IF_PREFIX_* flags.
    pub prefix_flags: u8,
    pub prefix_pad3: u8,
}

pub const IF_PREFIX_ONLINK: u8 = 0x01;
pub const IF_PREFIX_AUTOCONF: u8 = 0x02;
