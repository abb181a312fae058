//! Policy rule records (RTM_NEWRULE / RTM_DELRULE).

use std::net::IpAddr;

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_ip_addr, parse_payload};
use crate::netlink::types::rule::{FibRuleHdr, fib_rule_flags};

attr_index! {
    /// FRA_* attributes.
    pub enum RuleAttr {
        Dst = 1,
        Src = 2,
        Iifname = 3,
        Goto = 4,
        Priority = 6,
        Fwmark = 10,
        Flow = 11,
        TunId = 12,
        SuppressIfgroup = 13,
        SuppressPrefixlen = 14,
        Table = 15,
        Fwmask = 16,
        Oifname = 17,
        L3mdev = 19,
        UidRange = 20,
        Protocol = 21,
        IpProto = 22,
    }
}

/// A decoded routing rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMessage {
    pub header: FibRuleHdr,
    pub attrs: AttrMap<RuleAttr>,
}

impl RuleMessage {
    pub fn family(&self) -> u8 {
        self.header.family
    }

    pub fn priority(&self) -> u32 {
        self.attrs.u32(RuleAttr::Priority).unwrap_or(0)
    }

    pub fn source(&self) -> Option<IpAddr> {
        self.attrs.get(RuleAttr::Src).and_then(parse_ip_addr)
    }

    pub fn destination(&self) -> Option<IpAddr> {
        self.attrs.get(RuleAttr::Dst).and_then(parse_ip_addr)
    }

    pub fn src_len(&self) -> u8 {
        self.header.src_len
    }

    pub fn dst_len(&self) -> u8 {
        self.header.dst_len
    }

    pub fn iifname(&self) -> Option<String> {
        self.attrs.string(RuleAttr::Iifname)
    }

    pub fn oifname(&self) -> Option<String> {
        self.attrs.string(RuleAttr::Oifname)
    }

    pub fn fwmark(&self) -> Option<u32> {
        self.attrs.u32(RuleAttr::Fwmark)
    }

    pub fn fwmask(&self) -> Option<u32> {
        self.attrs.u32(RuleAttr::Fwmask)
    }

    /// Full table id: FRA_TABLE when present, else the header byte.
    pub fn table(&self) -> u32 {
        self.attrs
            .u32(RuleAttr::Table)
            .unwrap_or(self.header.table as u32)
    }

    pub fn goto_target(&self) -> Option<u32> {
        self.attrs.u32(RuleAttr::Goto)
    }

    pub fn action(&self) -> u8 {
        self.header.action
    }

    pub fn is_inverted(&self) -> bool {
        self.header.flags & fib_rule_flags::INVERT != 0
    }
}

impl FromNetlink for RuleMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&FibRuleHdr::new()));
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}
