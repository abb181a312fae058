//! Namespace id payload and constants.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// rtgenmsg, the payload of RTM_*NSID messages.
///
/// The kernel struct is one byte; the pad covers the alignment gap.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtGenMsg {
    pub rtgen_family: u8,
    pub __pad: [u8; 3],
}

impl RtGenMsg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(family: u8) -> Self {
        Self {
            rtgen_family: family,
            ..Default::default()
        }
    }
}

/// Value of NETNSA_NSID for a peer without an assigned id.
pub const NETNSA_NSID_NOT_ASSIGNED: i32 = -1;
