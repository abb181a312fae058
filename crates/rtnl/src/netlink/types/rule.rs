//! Policy routing rule payload and constants.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Rule header (struct fib_rule_hdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct FibRuleHdr {
    pub family: u8,
    pub dst_len: u8,
    pub src_len: u8,
    pub tos: u8,
    pub table: u8,
    pub res1: u8,
    pub res2: u8,
    /// FR_ACT_* action.
    pub action: u8,
    /// FIB_RULE_* flags.
    pub flags: u32,
}

impl FibRuleHdr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.family = family;
        self
    }
}

/// Rule actions (FR_ACT_*).
pub mod action {
    pub const UNSPEC: u8 = 0;
    pub const TO_TBL: u8 = 1;
    pub const GOTO: u8 = 2;
    pub const NOP: u8 = 3;
    pub const BLACKHOLE: u8 = 6;
    pub const UNREACHABLE: u8 = 7;
    pub const PROHIBIT: u8 = 8;
}

/// Rule flags (FIB_RULE_*).
pub mod fib_rule_flags {
    pub const PERMANENT: u32 = 0x01;
    pub const INVERT: u32 = 0x02;
    pub const UNRESOLVED: u32 = 0x04;
    pub const IIF_DETACHED: u32 = 0x08;
    pub const OIF_DETACHED: u32 = 0x10;
}
