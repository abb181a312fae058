//! Name resolution: interface and group names, protocols, scopes, tables.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::netlink::message::NlMsgType;
use crate::netlink::messages::LinkMessage;

/// Where iproute2 keeps interface group names.
pub const GROUP_FILE: &str = "/etc/iproute2/group";

/// Interface index to name, and group id to group name.
///
/// Filled from a link dump and kept current from link notifications.
/// Lookups that miss fall back to the decimal id.
#[derive(Debug, Clone)]
pub struct NameCache {
    links: HashMap<u32, String>,
    groups: HashMap<u32, String>,
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NameCache {
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
            groups: HashMap::from([(0, "default".to_string())]),
        }
    }

    pub fn from_links(links: &[LinkMessage]) -> Self {
        let mut cache = Self::new();
        cache.rebuild(links);
        cache
    }

    /// Replace every interface name with those in `links`.
    pub fn rebuild(&mut self, links: &[LinkMessage]) {
        self.links.clear();
        for link in links {
            if let Some(name) = link.name() {
                self.links.insert(link.ifindex(), name);
            }
        }
    }

    /// Apply a RTM_NEWLINK or RTM_DELLINK notification.
    pub fn observe(&mut self, msg_type: u16, link: &LinkMessage) {
        match msg_type {
            NlMsgType::RTM_NEWLINK => {
                if let Some(name) = link.name() {
                    self.links.insert(link.ifindex(), name);
                }
            }
            NlMsgType::RTM_DELLINK => {
                self.links.remove(&link.ifindex());
            }
            _ => {}
        }
    }

    pub fn lookup_link(&self, ifindex: u32) -> Option<&str> {
        self.links.get(&ifindex).map(String::as_str)
    }

    /// Interface name, or the index itself when unknown.
    pub fn link_name(&self, ifindex: u32) -> String {
        self.lookup_link(ifindex)
            .map(str::to_string)
            .unwrap_or_else(|| ifindex.to_string())
    }

    pub fn ifindex(&self, name: &str) -> Option<u32> {
        self.links
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(idx, _)| *idx)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Load group names from an iproute2 style file.
    ///
    /// A missing file is not an error; only the built-in `default` group
    /// is known then.
    pub fn load_groups(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => {
                self.parse_groups(&text);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.as_ref().display(), "no group names file");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Parse `id name` lines. Ids may be decimal or `0x` hex; `#` starts a comment.
    pub fn parse_groups(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let mut fields = line.split_whitespace();
            let (Some(id), Some(name)) = (fields.next(), fields.next()) else {
                continue;
            };
            match parse_id(id) {
                Some(id) => {
                    self.groups.insert(id, name.to_string());
                }
                None => tracing::debug!(line, "skipping malformed group entry"),
            }
        }
    }

    pub fn group_name(&self, id: u32) -> String {
        self.groups
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn group_id(&self, name: &str) -> Option<u32> {
        self.groups
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
            .or_else(|| parse_id(name))
    }
}

fn parse_id(s: &str) -> Option<u32> {
    match s.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Get the name of a routing protocol.
pub fn protocol_name(id: u8) -> String {
    let name = match id {
        0 => "unspec",
        1 => "redirect",
        2 => "kernel",
        3 => "boot",
        4 => "static",
        8 => "gated",
        9 => "ra",
        10 => "mrt",
        11 => "zebra",
        12 => "bird",
        13 => "dnrouted",
        14 => "xorp",
        15 => "ntk",
        16 => "dhcp",
        17 => "mrouted",
        18 => "keepalived",
        42 => "babel",
        186 => "bgp",
        187 => "isis",
        188 => "ospf",
        189 => "rip",
        192 => "eigrp",
        _ => return id.to_string(),
    };
    name.to_string()
}

/// Get the name of a route or address scope.
pub fn scope_name(id: u8) -> String {
    match id {
        0 => "global".into(),
        200 => "site".into(),
        253 => "link".into(),
        254 => "host".into(),
        255 => "nowhere".into(),
        _ => id.to_string(),
    }
}

/// Get scope ID from name.
pub fn scope_id(name: &str) -> Option<u8> {
    match name {
        "global" | "universe" => Some(0),
        "site" => Some(200),
        "link" => Some(253),
        "host" => Some(254),
        "nowhere" => Some(255),
        _ => name.parse().ok(),
    }
}

/// Get the name of a routing table.
pub fn table_name(id: u32) -> String {
    match id {
        0 => "unspec".into(),
        252 => "compat".into(),
        253 => "default".into(),
        254 => "main".into(),
        255 => "local".into(),
        _ => id.to_string(),
    }
}

/// Get routing table ID from name. `all` maps to 0, the kernel's wildcard.
pub fn table_id(name: &str) -> Option<u32> {
    match name {
        "all" | "unspec" => Some(0),
        "compat" => Some(252),
        "default" => Some(253),
        "main" => Some(254),
        "local" => Some(255),
        _ => parse_id(name),
    }
}

/// Get address family ID from a command-line name.
pub fn family_id(name: &str) -> Option<u8> {
    use crate::netlink::types::family;
    match name {
        "inet" | "ipv4" | "4" => Some(family::AF_INET),
        "inet6" | "ipv6" | "6" => Some(family::AF_INET6),
        "link" => Some(family::AF_PACKET),
        "bridge" => Some(family::AF_BRIDGE),
        "mpls" => Some(family::AF_MPLS),
        "unspec" | "any" => Some(family::AF_UNSPEC),
        _ => None,
    }
}
