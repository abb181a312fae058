//! Fixed-size typed payloads and kernel constants for each object kind.
//!
//! Every payload is `#[repr(C)]` with explicit padding fields and decoded by
//! copying through zerocopy, so no buffer is ever reinterpreted in place.

pub mod addr;
pub mod addrlabel;
pub mod link;
pub mod neigh;
pub mod netconf;
pub mod nsid;
pub mod prefix;
pub mod route;
pub mod rule;

use super::message::NlMsgType;

/// Address families used on the routing bus.
pub mod family {
    pub const AF_UNSPEC: u8 = libc::AF_UNSPEC as u8;
    pub const AF_INET: u8 = libc::AF_INET as u8;
    pub const AF_INET6: u8 = libc::AF_INET6 as u8;
    pub const AF_BRIDGE: u8 = libc::AF_BRIDGE as u8;
    pub const AF_MPLS: u8 = libc::AF_MPLS as u8;
    pub const AF_PACKET: u8 = libc::AF_PACKET as u8;
    /// Multicast routing families used by RTM_*ROUTE for mroutes.
    pub const RTNL_FAMILY_IPMR: u8 = 128;
    pub const RTNL_FAMILY_IP6MR: u8 = 129;

    /// Name of an address family as `ip` prints it.
    pub fn name(family: u8) -> String {
        match family {
            AF_UNSPEC => "unspec".into(),
            AF_INET => "inet".into(),
            AF_INET6 => "inet6".into(),
            AF_BRIDGE => "bridge".into(),
            AF_MPLS => "mpls".into(),
            AF_PACKET => "link".into(),
            RTNL_FAMILY_IPMR => "ipmr".into(),
            RTNL_FAMILY_IP6MR => "ip6mr".into(),
            other => format!("family {other}"),
        }
    }
}

/// Size of the fixed payload carried by a message type.
///
/// `None` for types whose body is opaque to the attribute layer.
pub fn payload_size(msg_type: u16) -> Option<usize> {
    use std::mem::size_of;

    let size = match msg_type {
        NlMsgType::RTM_NEWLINK..=NlMsgType::RTM_SETLINK => size_of::<link::IfInfoMsg>(),
        NlMsgType::RTM_NEWADDR..=NlMsgType::RTM_GETADDR => size_of::<addr::IfAddrMsg>(),
        NlMsgType::RTM_NEWROUTE..=NlMsgType::RTM_GETROUTE => size_of::<route::RtMsg>(),
        NlMsgType::RTM_NEWNEIGH..=NlMsgType::RTM_GETNEIGH => size_of::<neigh::NdMsg>(),
        NlMsgType::RTM_NEWRULE..=NlMsgType::RTM_GETRULE => size_of::<rule::FibRuleHdr>(),
        NlMsgType::RTM_NEWPREFIX => size_of::<prefix::PrefixMsg>(),
        NlMsgType::RTM_NEWADDRLABEL..=NlMsgType::RTM_GETADDRLABEL => {
            size_of::<addrlabel::IfAddrLblMsg>()
        }
        NlMsgType::RTM_NEWNETCONF..=NlMsgType::RTM_GETNETCONF => {
            size_of::<netconf::NetconfMsg>()
        }
        NlMsgType::RTM_NEWNSID..=NlMsgType::RTM_GETNSID => size_of::<nsid::RtGenMsg>(),
        _ => return None,
    };
    Some(size)
}
