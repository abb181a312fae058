//! Route records (RTM_NEWROUTE / RTM_DELROUTE).

use std::net::IpAddr;

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_ip_addr, parse_payload};
use crate::netlink::types::route::RtMsg;

attr_index! {
    /// RTA_* attributes.
    pub enum RouteAttr {
        Dst = 1,
        Src = 2,
        Iif = 3,
        Oif = 4,
        Gateway = 5,
        Priority = 6,
        Prefsrc = 7,
        Metrics = 8,
        Multipath = 9,
        Flow = 11,
        Cacheinfo = 12,
        Table = 15,
        Mark = 16,
        MfcStats = 17,
        Via = 18,
        Pref = 20,
        EncapType = 21,
        Encap = 22,
        Expires = 23,
        Uid = 25,
        NhId = 30,
    }
}

/// A decoded route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMessage {
    pub header: RtMsg,
    pub attrs: AttrMap<RouteAttr>,
}

impl RouteMessage {
    pub fn family(&self) -> u8 {
        self.header.rtm_family
    }

    pub fn dst_len(&self) -> u8 {
        self.header.rtm_dst_len
    }

    pub fn src_len(&self) -> u8 {
        self.header.rtm_src_len
    }

    pub fn destination(&self) -> Option<IpAddr> {
        self.attrs.get(RouteAttr::Dst).and_then(parse_ip_addr)
    }

    pub fn source(&self) -> Option<IpAddr> {
        self.attrs.get(RouteAttr::Src).and_then(parse_ip_addr)
    }

    pub fn gateway(&self) -> Option<IpAddr> {
        self.attrs.get(RouteAttr::Gateway).and_then(parse_ip_addr)
    }

    pub fn prefsrc(&self) -> Option<IpAddr> {
        self.attrs.get(RouteAttr::Prefsrc).and_then(parse_ip_addr)
    }

    pub fn oif(&self) -> Option<u32> {
        self.attrs.u32(RouteAttr::Oif)
    }

    pub fn iif(&self) -> Option<u32> {
        self.attrs.u32(RouteAttr::Iif)
    }

    pub fn priority(&self) -> Option<u32> {
        self.attrs.u32(RouteAttr::Priority)
    }

    /// Full table id: RTA_TABLE when present, else the header byte.
    pub fn table(&self) -> u32 {
        self.attrs
            .u32(RouteAttr::Table)
            .unwrap_or(self.header.rtm_table as u32)
    }

    pub fn protocol(&self) -> u8 {
        self.header.rtm_protocol
    }

    pub fn scope(&self) -> u8 {
        self.header.rtm_scope
    }

    pub fn route_type(&self) -> u8 {
        self.header.rtm_type
    }

    pub fn flags(&self) -> u32 {
        self.header.rtm_flags
    }

    pub fn mark(&self) -> Option<u32> {
        self.attrs.u32(RouteAttr::Mark)
    }

    pub fn is_default(&self) -> bool {
        self.dst_len() == 0 && self.destination().is_none()
    }
}

impl FromNetlink for RouteMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&RtMsg::new()));
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}
