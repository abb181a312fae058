//! Neighbor records (RTM_NEWNEIGH / RTM_DELNEIGH).

use std::net::IpAddr;

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_ip_addr, parse_payload};
use crate::netlink::types::neigh::{NdMsg, ntf};

attr_index! {
    /// NDA_* attributes.
    pub enum NeighborAttr {
        Dst = 1,
        Lladdr = 2,
        Cacheinfo = 3,
        Probes = 4,
        Vlan = 5,
        Port = 6,
        Vni = 7,
        Ifindex = 8,
        Master = 9,
        LinkNetnsid = 10,
        SrcVni = 11,
        Protocol = 12,
    }
}

/// A decoded neighbor entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborMessage {
    pub header: NdMsg,
    pub attrs: AttrMap<NeighborAttr>,
}

impl NeighborMessage {
    pub fn family(&self) -> u8 {
        self.header.ndm_family
    }

    pub fn ifindex(&self) -> u32 {
        self.header.ndm_ifindex as u32
    }

    pub fn state(&self) -> u16 {
        self.header.ndm_state
    }

    pub fn flags(&self) -> u8 {
        self.header.ndm_flags
    }

    pub fn destination(&self) -> Option<IpAddr> {
        self.attrs.get(NeighborAttr::Dst).and_then(parse_ip_addr)
    }

    pub fn lladdr(&self) -> Option<&[u8]> {
        self.attrs.get(NeighborAttr::Lladdr)
    }

    pub fn probes(&self) -> Option<u32> {
        self.attrs.u32(NeighborAttr::Probes)
    }

    pub fn is_router(&self) -> bool {
        self.flags() & ntf::ROUTER != 0
    }

    pub fn is_proxy(&self) -> bool {
        self.flags() & ntf::PROXY != 0
    }
}

impl FromNetlink for NeighborMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&NdMsg::new()));
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}
