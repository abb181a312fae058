//! Namespace id records (RTM_NEWNSID / RTM_DELNSID).

use crate::netlink::attr::{AttrMap, attr_index};
use crate::netlink::parse::{FromNetlink, PResult, parse_attr_map, parse_payload};
use crate::netlink::types::nsid::RtGenMsg;

attr_index! {
    /// NETNSA_* attributes.
    pub enum NsidAttr {
        Nsid = 1,
        Pid = 2,
        Fd = 3,
        TargetNsid = 4,
        CurrentNsid = 5,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NsIdMessage {
    pub header: RtGenMsg,
    pub attrs: AttrMap<NsidAttr>,
}

impl NsIdMessage {
    pub fn nsid(&self) -> Option<i32> {
        self.attrs.i32(NsidAttr::Nsid)
    }

    pub fn pid(&self) -> Option<u32> {
        self.attrs.u32(NsidAttr::Pid)
    }

    pub fn fd(&self) -> Option<u32> {
        self.attrs.u32(NsidAttr::Fd)
    }

    pub fn current_nsid(&self) -> Option<i32> {
        self.attrs.i32(NsidAttr::CurrentNsid)
    }
}

impl FromNetlink for NsIdMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&RtGenMsg::new()));
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header = parse_payload(input)?;
        let attrs = parse_attr_map(input)?;
        Ok(Self { header, attrs })
    }
}
