//! IPv6 prefix notifications (RTM_NEWPREFIX).

use std::net::IpAddr;

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_ip_addr, parse_payload};
use crate::netlink::types::prefix::{IF_PREFIX_AUTOCONF, IF_PREFIX_ONLINK, PrefixMsg};

attr_index! {
    /// PREFIX_* attributes.
    pub enum PrefixAttr {
        Address = 1,
        Cacheinfo = 2,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixMessage {
    pub header: PrefixMsg,
    pub attrs: AttrMap<PrefixAttr>,
}

impl PrefixMessage {
    pub fn ifindex(&self) -> u32 {
        self.header.prefix_ifindex as u32
    }

    pub fn prefix_len(&self) -> u8 {
        self.header.prefix_len
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.attrs.get(PrefixAttr::Address).and_then(parse_ip_addr)
    }

    pub fn is_onlink(&self) -> bool {
        self.header.prefix_flags & IF_PREFIX_ONLINK != 0
    }

    pub fn is_autoconf(&self) -> bool {
        self.header.prefix_flags & IF_PREFIX_AUTOCONF != 0
    }

    /// Preferred and valid lifetimes, in seconds.
    pub fn lifetimes(&self) -> Option<(u32, u32)> {
        let raw = self.attrs.get(PrefixAttr::Cacheinfo)?;
        let preferred = u32::from_ne_bytes(raw.get(..4)?.try_into().ok()?);
        let valid = u32::from_ne_bytes(raw.get(4..8)?.try_into().ok()?);
        Some((preferred, valid))
    }
}

impl FromNetlink for PrefixMessage {
    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}
