//! Per-device configuration records (RTM_NEWNETCONF).

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_payload};
use crate::netlink::types::netconf::NetconfMsg;

attr_index! {
    /// NETCONFA_* attributes.
    pub enum NetconfAttr {
        Ifindex = 1,
        Forwarding = 2,
        Rpfilter = 3,
        McForwarding = 4,
        ProxyNeigh = 5,
        IgnoreRoutesWithLinkdown = 6,
        Input = 7,
        BcForwarding = 8,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetconfMessage {
    pub header: NetconfMsg,
    pub attrs: AttrMap<NetconfAttr>,
}

impl NetconfMessage {
    pub fn family(&self) -> u8 {
        self.header.ncm_family
    }

    /// Interface index, or one of the `all`/`default` pseudo indices.
    pub fn ifindex(&self) -> Option<i32> {
        self.attrs.i32(NetconfAttr::Ifindex)
    }

    pub fn forwarding(&self) -> Option<bool> {
        self.attrs.u32(NetconfAttr::Forwarding).map(|v| v != 0)
    }

    pub fn rp_filter(&self) -> Option<u32> {
        self.attrs.u32(NetconfAttr::Rpfilter)
    }

    pub fn mc_forwarding(&self) -> Option<bool> {
        self.attrs.u32(NetconfAttr::McForwarding).map(|v| v != 0)
    }

    pub fn proxy_neigh(&self) -> Option<bool> {
        self.attrs.u32(NetconfAttr::ProxyNeigh).map(|v| v != 0)
    }

    pub fn ignore_routes_with_linkdown(&self) -> Option<bool> {
        self.attrs
            .u32(NetconfAttr::IgnoreRoutesWithLinkdown)
            .map(|v| v != 0)
    }
}

impl FromNetlink for NetconfMessage {
    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;
    use crate::netlink::message::Frame;

    #[test]
    fn test_netconf() {
        let bytes = fixtures::netconf_v4(2);
        let frame = Frame::parse(&bytes).unwrap();
        let conf = NetconfMessage::from_bytes(frame.payload()).unwrap();
        assert_eq!(conf.family(), libc::AF_INET as u8);
        assert_eq!(conf.ifindex(), Some(2));
        assert_eq!(conf.forwarding(), Some(true));
        assert_eq!(conf.rp_filter(), Some(0));
    }
}
