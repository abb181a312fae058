//! Link records (RTM_NEWLINK / RTM_DELLINK).

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_payload};
use crate::netlink::types::link::{IfInfoMsg, LinkStats64, OperState, iff};

attr_index! {
    /// IFLA_* attributes.
    pub enum LinkAttr {
        Address = 1,
        Broadcast = 2,
        Ifname = 3,
        Mtu = 4,
        Link = 5,
        Qdisc = 6,
        Stats = 7,
        Master = 10,
        TxqLen = 13,
        Operstate = 16,
        Linkmode = 17,
        Linkinfo = 18,
        Ifalias = 20,
        Stats64 = 23,
        AfSpec = 26,
        Group = 27,
        ExtMask = 29,
        Promiscuity = 30,
        NumTxQueues = 31,
        NumRxQueues = 32,
        Carrier = 33,
        LinkNetnsid = 37,
        MinMtu = 50,
        MaxMtu = 51,
        PermAddress = 54,
    }
}

attr_index! {
    /// IFLA_INFO_* attributes nested in IFLA_LINKINFO.
    pub enum LinkInfoAttr {
        Kind = 1,
        Data = 2,
        SlaveKind = 4,
        SlaveData = 5,
    }
}

/// A decoded link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMessage {
    pub header: IfInfoMsg,
    pub attrs: AttrMap<LinkAttr>,
}

impl LinkMessage {
    /// Get the interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifi_index as u32
    }

    /// Get the interface name.
    pub fn name(&self) -> Option<String> {
        self.attrs.string(LinkAttr::Ifname)
    }

    /// Get the interface name, or a default placeholder.
    pub fn name_or(&self, default: &str) -> String {
        self.name().unwrap_or_else(|| default.to_string())
    }

    pub fn flags(&self) -> u32 {
        self.header.ifi_flags
    }

    pub fn link_type(&self) -> u16 {
        self.header.ifi_type
    }

    pub fn mtu(&self) -> Option<u32> {
        self.attrs.u32(LinkAttr::Mtu)
    }

    pub fn txqlen(&self) -> Option<u32> {
        self.attrs.u32(LinkAttr::TxqLen)
    }

    pub fn qdisc(&self) -> Option<String> {
        self.attrs.string(LinkAttr::Qdisc)
    }

    pub fn master(&self) -> Option<u32> {
        self.attrs.u32(LinkAttr::Master).filter(|&m| m != 0)
    }

    /// Lower device for stacked links (IFLA_LINK).
    pub fn link(&self) -> Option<u32> {
        self.attrs.u32(LinkAttr::Link)
    }

    pub fn group(&self) -> Option<u32> {
        self.attrs.u32(LinkAttr::Group)
    }

    pub fn alias(&self) -> Option<String> {
        self.attrs.string(LinkAttr::Ifalias)
    }

    pub fn operstate(&self) -> Option<OperState> {
        self.attrs.u8(LinkAttr::Operstate).map(OperState::from)
    }

    pub fn promiscuity(&self) -> Option<u32> {
        self.attrs.u32(LinkAttr::Promiscuity)
    }

    /// Namespace id of the peer namespace for cross-namespace links.
    pub fn link_netnsid(&self) -> Option<i32> {
        self.attrs.i32(LinkAttr::LinkNetnsid)
    }

    pub fn stats64(&self) -> Option<LinkStats64> {
        self.attrs
            .get(LinkAttr::Stats64)
            .and_then(LinkStats64::from_bytes)
    }

    pub fn address(&self) -> Option<&[u8]> {
        self.attrs.get(LinkAttr::Address)
    }

    pub fn broadcast(&self) -> Option<&[u8]> {
        self.attrs.get(LinkAttr::Broadcast)
    }

    /// Link kind from IFLA_LINKINFO (e.g. "vlan", "bridge").
    pub fn kind(&self) -> Option<String> {
        let info = self.attrs.nested::<LinkInfoAttr>(LinkAttr::Linkinfo).ok()??;
        info.string(LinkInfoAttr::Kind)
    }

    pub fn is_up(&self) -> bool {
        self.flags() & iff::UP != 0
    }

    pub fn is_lower_up(&self) -> bool {
        self.flags() & iff::LOWER_UP != 0
    }

    pub fn is_running(&self) -> bool {
        self.flags() & iff::RUNNING != 0
    }

    pub fn is_loopback(&self) -> bool {
        self.flags() & iff::LOOPBACK != 0
    }
}

impl FromNetlink for LinkMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&IfInfoMsg::new()));
    }

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
    fn test_parse_loopback() {
        let bytes = fixtures::link_loopback();
        let frame = Frame::parse(&bytes).unwrap();
        let link = LinkMessage::from_bytes(frame.payload()).unwrap();

        assert_eq!(link.ifindex(), 1);
        assert_eq!(link.name().as_deref(), Some("lo"));
        assert_eq!(link.mtu(), Some(65536));
        assert_eq!(link.txqlen(), Some(1000));
        assert_eq!(link.operstate(), Some(OperState::Unknown));
        assert!(link.is_up());
        assert!(link.is_loopback());
        assert!(link.is_running());
        assert_eq!(link.link_type(), 772);
    }

    #[test]
    fn test_stats64() {
        let bytes = fixtures::link_with_stats(2, "eth0", 0x1043, 6, 100);
        let frame = Frame::parse(&bytes).unwrap();
        let link = LinkMessage::from_bytes(frame.payload()).unwrap();
        let stats = link.stats64().unwrap();
        assert_eq!(stats.rx_packets(), 100);
        assert_eq!(stats.tx_packets(), 101);
        assert_eq!(link.operstate(), Some(OperState::Up));
    }
}
