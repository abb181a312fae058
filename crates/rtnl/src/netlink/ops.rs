//! Typed queries and changes on top of [`Session`].

use std::net::IpAddr;

use super::attr::AttrIndex;
use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{NLM_F_ACK, NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REQUEST, NlMsgType};
use super::messages::{
    AddrLabelMessage, AddressAttr, AddressMessage, LinkAttr, LinkMessage, NeighborMessage,
    NetconfMessage, NsIdMessage, NsidAttr, RouteMessage, RuleMessage,
};
use super::parse::{FromNetlink, ip_addr_bytes};
use super::session::Session;
use super::transport::Transport;
use super::types::addr::{IfAddrMsg, scope};
use super::types::addrlabel::IfAddrLblMsg;
use super::types::family;
use super::types::link::{IfInfoMsg, iff};
use super::types::neigh::NdMsg;
use super::types::netconf::NetconfMsg;
use super::types::nsid::RtGenMsg;
use super::types::route::RtMsg;
use super::types::rule::FibRuleHdr;

fn dump_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP)
}

fn ack_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK)
}

impl<T: Transport> Session<T> {
    /// Dump all links.
    pub async fn get_links(&mut self) -> Result<Vec<LinkMessage>> {
        self.dump(NlMsgType::RTM_GETLINK).await
    }

    /// Fetch one link by index.
    pub async fn get_link(&mut self, ifindex: u32) -> Result<LinkMessage> {
        let builder = ack_request(NlMsgType::RTM_GETLINK)
            .payload(&IfInfoMsg::new().with_index(ifindex as i32));
        self.get_one(builder)
            .await
            .map_err(|e| e.with_context(format!("getting link {ifindex}")))?
            .ok_or_else(|| Error::InterfaceNotFound {
                name: ifindex.to_string(),
            })
    }

    /// Fetch one link by name.
    pub async fn get_link_by_name(&mut self, name: &str) -> Result<LinkMessage> {
        let mut builder = ack_request(NlMsgType::RTM_GETLINK).payload(&IfInfoMsg::new());
        builder.append_attr_str(LinkAttr::Ifname.kind(), name);
        match self.get_one(builder).await {
            Ok(Some(link)) => Ok(link),
            Ok(None) => Err(Error::InterfaceNotFound { name: name.into() }),
            Err(e) if e.is_not_found() => Err(Error::InterfaceNotFound { name: name.into() }),
            Err(e) => Err(e),
        }
    }

    /// Resolve an interface name to its index.
    pub async fn resolve_ifindex(&mut self, name: &str) -> Result<u32> {
        Ok(self.get_link_by_name(name).await?.ifindex())
    }

    /// Dump addresses of `family` (`AF_UNSPEC` for all).
    pub async fn get_addresses(&mut self, family: u8) -> Result<Vec<AddressMessage>> {
        let builder = dump_request(NlMsgType::RTM_GETADDR).payload(&IfAddrMsg::new().with_family(family));
        self.dump_with(builder).await
    }

    /// Dump routes of `family` across all tables.
    pub async fn get_routes(&mut self, family: u8) -> Result<Vec<RouteMessage>> {
        let builder = dump_request(NlMsgType::RTM_GETROUTE).payload(&RtMsg::new().with_family(family));
        self.dump_with(builder).await
    }

    pub async fn get_neighbors(&mut self, family: u8) -> Result<Vec<NeighborMessage>> {
        let builder = dump_request(NlMsgType::RTM_GETNEIGH).payload(&NdMsg::new().with_family(family));
        self.dump_with(builder).await
    }

    pub async fn get_rules(&mut self, family: u8) -> Result<Vec<RuleMessage>> {
        let builder = dump_request(NlMsgType::RTM_GETRULE).payload(&FibRuleHdr::new().with_family(family));
        self.dump_with(builder).await
    }

    /// Dump IPv6 address labels.
    pub async fn get_addrlabels(&mut self) -> Result<Vec<AddrLabelMessage>> {
        let builder = dump_request(NlMsgType::RTM_GETADDRLABEL)
            .payload(&IfAddrLblMsg::new().with_family(family::AF_INET6));
        self.dump_with(builder).await
    }

    /// Dump per-device configuration of `family`.
    pub async fn get_netconf(&mut self, family: u8) -> Result<Vec<NetconfMessage>> {
        let builder = dump_request(NlMsgType::RTM_GETNETCONF).payload(&NetconfMsg::with_family(family));
        self.dump_with(builder).await
    }

    /// Dump the namespace ids assigned in this namespace.
    pub async fn get_nsids(&mut self) -> Result<Vec<NsIdMessage>> {
        self.dump(NlMsgType::RTM_GETNSID).await
    }

    /// Namespace id of the network namespace process `pid` lives in.
    pub async fn get_nsid_for_pid(&mut self, pid: u32) -> Result<Option<i32>> {
        let mut builder = ack_request(NlMsgType::RTM_GETNSID).payload(&RtGenMsg::new());
        builder.append_attr_u32(NsidAttr::Pid.kind(), pid);
        Ok(self.get_one::<NsIdMessage>(builder).await?.and_then(|m| m.nsid()))
    }

    /// Namespace id of the network namespace open at `fd`.
    pub async fn get_nsid_for_fd(&mut self, fd: u32) -> Result<Option<i32>> {
        let mut builder = ack_request(NlMsgType::RTM_GETNSID).payload(&RtGenMsg::new());
        builder.append_attr_u32(NsidAttr::Fd.kind(), fd);
        Ok(self.get_one::<NsIdMessage>(builder).await?.and_then(|m| m.nsid()))
    }

    /// Add `addr/prefix_len` to interface `ifindex`.
    pub async fn add_address(&mut self, ifindex: u32, addr: IpAddr, prefix_len: u8) -> Result<()> {
        let builder = address_request(
            NlMsgType::RTM_NEWADDR,
            NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL,
            ifindex,
            addr,
            prefix_len,
        );
        self.ack(builder)
            .await
            .map_err(|e| e.with_context(format!("adding {addr}/{prefix_len}")))
    }

    /// Remove `addr/prefix_len` from interface `ifindex`.
    pub async fn del_address(&mut self, ifindex: u32, addr: IpAddr, prefix_len: u8) -> Result<()> {
        let builder = address_request(
            NlMsgType::RTM_DELADDR,
            NLM_F_REQUEST | NLM_F_ACK,
            ifindex,
            addr,
            prefix_len,
        );
        self.ack(builder)
            .await
            .map_err(|e| e.with_context(format!("deleting {addr}/{prefix_len}")))
    }

    pub async fn set_link_up(&mut self, ifindex: u32) -> Result<()> {
        self.set_link_state(ifindex, true).await
    }

    pub async fn set_link_down(&mut self, ifindex: u32) -> Result<()> {
        self.set_link_state(ifindex, false).await
    }

    /// Set or clear IFF_UP on `ifindex`, leaving the other flags alone.
    pub async fn set_link_state(&mut self, ifindex: u32, up: bool) -> Result<()> {
        let flags = if up { iff::UP } else { 0 };
        let builder = ack_request(NlMsgType::RTM_NEWLINK)
            .payload(&IfInfoMsg::new().with_index(ifindex as i32).with_flags(flags, iff::UP));
        self.ack(builder).await.map_err(|e| {
            e.with_context(format!(
                "setting link {ifindex} {}",
                if up { "up" } else { "down" }
            ))
        })
    }

    /// Run a request answered by at most one record plus an acknowledgement.
    async fn get_one<M: FromNetlink>(&mut self, builder: MessageBuilder) -> Result<Option<M>> {
        let mut found = None;
        self.request(builder, |frame| {
            if found.is_none() {
                found = Some(M::from_bytes(frame.payload())?);
            }
            Ok(())
        })
        .await?;
        Ok(found)
    }
}

fn address_request(msg_type: u16, flags: u16, ifindex: u32, addr: IpAddr, prefix_len: u8) -> MessageBuilder {
    let (fam, addr_scope) = match addr {
        IpAddr::V4(a) if a.is_loopback() => (family::AF_INET, scope::HOST),
        IpAddr::V4(_) => (family::AF_INET, scope::UNIVERSE),
        IpAddr::V6(a) if a.is_loopback() => (family::AF_INET6, scope::HOST),
        IpAddr::V6(_) => (family::AF_INET6, scope::UNIVERSE),
    };
    let header = IfAddrMsg::new()
        .with_family(fam)
        .with_index(ifindex)
        .with_prefixlen(prefix_len)
        .with_scope(addr_scope);
    let bytes = ip_addr_bytes(&addr);

    let mut builder = MessageBuilder::new(msg_type, flags).payload(&header);
    builder.append_attr(AddressAttr::Local.kind(), &bytes);
    builder.append_attr(AddressAttr::Address.kind(), &bytes);
    builder
}
