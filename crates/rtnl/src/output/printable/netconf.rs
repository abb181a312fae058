//! Printable implementation for NetconfMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::NetconfMessage;
use crate::netlink::types::family;
use crate::netlink::types::netconf::ifindex;
use crate::output::{OutputOptions, Printable, ifname};

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

fn rp_filter_name(v: u32) -> &'static str {
    match v {
        0 => "off",
        1 => "strict",
        2 => "loose",
        _ => "unknown",
    }
}

impl NetconfMessage {
    fn device(&self, names: &NameCache, opts: &OutputOptions) -> Option<String> {
        self.ifindex().map(|idx| match idx {
            ifindex::ALL => "all".to_string(),
            ifindex::DEFAULT => "default".to_string(),
            idx => ifname(names, idx as u32, opts),
        })
    }
}

impl Printable for NetconfMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        write!(w, "{}", family::name(self.family()))?;
        if let Some(dev) = self.device(names, opts) {
            write!(w, " {}", dev)?;
        }
        if let Some(v) = self.forwarding() {
            write!(w, " forwarding {}", on_off(v))?;
        }
        if let Some(v) = self.rp_filter() {
            write!(w, " rp_filter {}", rp_filter_name(v))?;
        }
        if let Some(v) = self.mc_forwarding() {
            write!(w, " mc_forwarding {}", on_off(v))?;
        }
        if let Some(v) = self.proxy_neigh() {
            write!(w, " proxy_neigh {}", on_off(v))?;
        }
        if let Some(v) = self.ignore_routes_with_linkdown() {
            write!(w, " ignore_routes_with_linkdown {}", on_off(v))?;
        }
        writeln!(w)
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "family": family::name(self.family()),
            "interface": self.device(names, opts),
        });
        if let Some(v) = self.forwarding() {
            obj["forwarding"] = serde_json::json!(on_off(v));
        }
        if let Some(v) = self.rp_filter() {
            obj["rp_filter"] = serde_json::json!(rp_filter_name(v));
        }
        if let Some(v) = self.mc_forwarding() {
            obj["mc_forwarding"] = serde_json::json!(on_off(v));
        }
        if let Some(v) = self.proxy_neigh() {
            obj["proxy_neigh"] = serde_json::json!(on_off(v));
        }
        if let Some(v) = self.ignore_routes_with_linkdown() {
            obj["ignore_routes_with_linkdown"] = serde_json::json!(on_off(v));
        }
        obj
    }
}
