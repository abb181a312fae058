//! Per-device network configuration payload.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netconf message (struct netconfmsg).
///
/// The kernel struct is one byte; the three pad bytes are the alignment gap
/// before the attributes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NetconfMsg {
    pub ncm_family: u8,
    pub __pad: [u8; 3],
}

impl NetconfMsg {
    pub fn with_family(family: u8) -> Self {
        Self {
            ncm_family: family,
            ..Default::default()
        }
    }
}

/// Pseudo interface indices accepted by RTM_GETNETCONF.
pub mod ifindex {
    pub const ALL: i32 = -1;
    pub const DEFAULT: i32 = -2;
}
