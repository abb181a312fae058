//! Address records (RTM_NEWADDR / RTM_DELADDR).

use std::net::IpAddr;

use zerocopy::FromBytes;

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_ip_addr, parse_payload};
use crate::netlink::types::addr::{IfAddrMsg, IfaCacheinfo, ifa_flags};

attr_index! {
    /// IFA_* attributes.
    pub enum AddressAttr {
        Address = 1,
        Local = 2,
        Label = 3,
        Broadcast = 4,
        Anycast = 5,
        Cacheinfo = 6,
        Multicast = 7,
        Flags = 8,
        RtPriority = 9,
        TargetNetnsid = 10,
    }
}

/// A decoded interface address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressMessage {
    pub header: IfAddrMsg,
    pub attrs: AttrMap<AddressAttr>,
}

impl AddressMessage {
    pub fn family(&self) -> u8 {
        self.header.ifa_family
    }

    pub fn ifindex(&self) -> u32 {
        self.header.ifa_index
    }

    pub fn prefix_len(&self) -> u8 {
        self.header.ifa_prefixlen
    }

    pub fn scope(&self) -> u8 {
        self.header.ifa_scope
    }

    /// Peer or prefix address (IFA_ADDRESS).
    pub fn address(&self) -> Option<IpAddr> {
        self.attrs.get(AddressAttr::Address).and_then(parse_ip_addr)
    }

    /// Local address (IFA_LOCAL); differs from IFA_ADDRESS on point-to-point links.
    pub fn local(&self) -> Option<IpAddr> {
        self.attrs.get(AddressAttr::Local).and_then(parse_ip_addr)
    }

    /// The address `ip` prints first: local when present, else address.
    pub fn primary(&self) -> Option<IpAddr> {
        self.local().or_else(|| self.address())
    }

    /// Peer address on point-to-point links.
    pub fn peer(&self) -> Option<IpAddr> {
        match (self.local(), self.address()) {
            (Some(local), Some(addr)) if local != addr => Some(addr),
            _ => None,
        }
    }

    pub fn broadcast(&self) -> Option<IpAddr> {
        self.attrs.get(AddressAttr::Broadcast).and_then(parse_ip_addr)
    }

    pub fn label(&self) -> Option<String> {
        self.attrs.string(AddressAttr::Label)
    }

    /// Full flag set: IFA_FLAGS when present, else the header byte.
    pub fn flags(&self) -> u32 {
        self.attrs
            .u32(AddressAttr::Flags)
            .unwrap_or(self.header.ifa_flags as u32)
    }

    pub fn is_permanent(&self) -> bool {
        self.flags() & ifa_flags::PERMANENT != 0
    }

    pub fn is_secondary(&self) -> bool {
        self.flags() & ifa_flags::SECONDARY != 0
    }

    pub fn cacheinfo(&self) -> Option<IfaCacheinfo> {
        let raw = self.attrs.get(AddressAttr::Cacheinfo)?;
        IfaCacheinfo::read_from_prefix(raw).ok().map(|(c, _)| c)
    }
}

impl FromNetlink for AddressMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&IfAddrMsg::new()));
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}
