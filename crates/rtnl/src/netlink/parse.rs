//! Parser combinators and the `FromNetlink` trait for typed messages.
//!
//! Message bodies are parsed with winnow: the fixed payload is taken and
//! copied out through zerocopy, alignment padding is skipped, and the rest
//! is handed to the attribute codec.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use winnow::binary::{self, Endianness};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;
use zerocopy::FromBytes;

use super::attr::{AttrIndex, AttrMap};
use super::error::{Error, Result};
use super::message::{NlMsgHdr, nlmsg_align};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Types that can be parsed from a message body (everything after the header).
pub trait FromNetlink: Sized {
    /// Parse from a mutable byte slice reference.
    fn parse(input: &mut &[u8]) -> PResult<Self>;

    /// Parse from a complete message body.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse
            .parse(data)
            .map_err(|e| Error::InvalidMessage(e.to_string()))
    }

    /// Write the fixed payload a dump request for this type carries.
    fn write_dump_header(_buf: &mut Vec<u8>) {}
}

fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

/// Parse a netlink message header in host byte order.
pub fn parse_nlmsghdr(input: &mut &[u8]) -> PResult<NlMsgHdr> {
    let nlmsg_len = binary::u32(Endianness::Native).parse_next(input)?;
    let nlmsg_type = binary::u16(Endianness::Native).parse_next(input)?;
    let nlmsg_flags = binary::u16(Endianness::Native).parse_next(input)?;
    let nlmsg_seq = binary::u32(Endianness::Native).parse_next(input)?;
    let nlmsg_pid = binary::u32(Endianness::Native).parse_next(input)?;
    Ok(NlMsgHdr {
        nlmsg_len,
        nlmsg_type,
        nlmsg_flags,
        nlmsg_seq,
        nlmsg_pid,
    })
}

/// Take a fixed payload and skip its alignment padding.
pub fn parse_payload<T: FromBytes>(input: &mut &[u8]) -> PResult<T> {
    let size = std::mem::size_of::<T>();
    let bytes: &[u8] = take(size).parse_next(input)?;
    let value = T::read_from_bytes(bytes).map_err(|_| cut())?;
    let pad = (nlmsg_align(size) - size).min(input.len());
    let _: &[u8] = take(pad).parse_next(input)?;
    Ok(value)
}

/// Consume the rest of the input as an attribute block.
pub fn parse_attr_map<K: AttrIndex>(input: &mut &[u8]) -> PResult<AttrMap<K>> {
    let rest: &[u8] = take(input.len()).parse_next(input)?;
    AttrMap::parse(rest).map_err(|_| cut())
}

/// Parse a u32 in host byte order.
pub fn parse_u32_ne(input: &mut &[u8]) -> PResult<u32> {
    binary::u32(Endianness::Native).parse_next(input)
}

/// Parse a u64 in host byte order.
pub fn parse_u64_ne(input: &mut &[u8]) -> PResult<u64> {
    binary::u64(Endianness::Native).parse_next(input)
}

/// Interpret an address attribute for a given family.
pub fn parse_ip_addr(data: &[u8]) -> Option<IpAddr> {
    match data.len() {
        4 => {
            let octets: [u8; 4] = data.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = data.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

/// Address bytes as carried in an attribute value.
pub fn ip_addr_bytes(addr: &IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}
