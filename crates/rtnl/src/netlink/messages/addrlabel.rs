//! IPv6 address label records (RTM_NEWADDRLABEL / RTM_DELADDRLABEL).

use std::net::IpAddr;

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_ip_addr, parse_payload};
use crate::netlink::types::addrlabel::IfAddrLblMsg;

attr_index! {
    /// IFAL_* attributes.
    pub enum AddrLabelAttr {
        Address = 1,
        Label = 2,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddrLabelMessage {
    pub header: IfAddrLblMsg,
    pub attrs: AttrMap<AddrLabelAttr>,
}

impl AddrLabelMessage {
    pub fn prefix_len(&self) -> u8 {
        self.header.ifal_prefixlen
    }

    pub fn ifindex(&self) -> u32 {
        self.header.ifal_index
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.attrs.get(AddrLabelAttr::Address).and_then(parse_ip_addr)
    }

    pub fn label(&self) -> Option<u32> {
        self.attrs.u32(AddrLabelAttr::Label)
    }
}

impl FromNetlink for AddrLabelMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&IfAddrLblMsg::new()));
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}
