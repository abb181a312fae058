//! Printable implementation for RouteMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::RouteMessage;
use crate::netlink::names::{protocol_name, scope_name, table_name};
use crate::netlink::types::route::{rtm_flags, rtn, table};
use crate::output::formatting::format_prefix;
use crate::output::{OutputOptions, Printable, ifname};

impl Printable for RouteMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        if self.route_type() != rtn::UNICAST {
            write!(w, "{} ", rtn::name(self.route_type()))?;
        }
        write!(w, "{}", format_prefix(self.destination(), self.dst_len()))?;

        if let Some(src) = self.source() {
            write!(w, " from {}/{}", src, self.src_len())?;
        }
        if let Some(gw) = self.gateway() {
            write!(w, " via {}", gw)?;
        }
        if let Some(oif) = self.oif() {
            write!(w, " dev {}", ifname(names, oif, opts))?;
        }
        if let Some(iif) = self.iif() {
            write!(w, " iif {}", ifname(names, iif, opts))?;
        }
        if self.table() != table::MAIN {
            let t = if opts.numeric {
                self.table().to_string()
            } else {
                table_name(self.table())
            };
            write!(w, " table {}", t)?;
        }
        if self.protocol() != 0 {
            let p = if opts.numeric {
                self.protocol().to_string()
            } else {
                protocol_name(self.protocol())
            };
            write!(w, " proto {}", p)?;
        }
        if self.scope() != 0 {
            let s = if opts.numeric {
                self.scope().to_string()
            } else {
                scope_name(self.scope())
            };
            write!(w, " scope {}", s)?;
        }
        if let Some(src) = self.prefsrc() {
            write!(w, " src {}", src)?;
        }
        if let Some(metric) = self.priority() {
            write!(w, " metric {}", metric)?;
        }
        for (bit, name) in rtm_flags::NAMES {
            if self.flags() & bit != 0 {
                write!(w, " {}", name)?;
            }
        }
        writeln!(w)
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "type": rtn::name(self.route_type()),
            "dst": format_prefix(self.destination(), self.dst_len()),
            "table": table_name(self.table()),
            "protocol": protocol_name(self.protocol()),
            "scope": scope_name(self.scope()),
        });

        if let Some(gw) = self.gateway() {
            obj["gateway"] = serde_json::json!(gw.to_string());
        }
        if let Some(oif) = self.oif() {
            obj["dev"] = serde_json::json!(ifname(names, oif, opts));
        }
        if let Some(src) = self.prefsrc() {
            obj["prefsrc"] = serde_json::json!(src.to_string());
        }
        if let Some(metric) = self.priority() {
            obj["metric"] = serde_json::json!(metric);
        }
        let flags: Vec<&str> = rtm_flags::NAMES
            .iter()
            .filter(|(bit, _)| self.flags() & bit != 0)
            .map(|(_, name)| *name)
            .collect();
        obj["flags"] = serde_json::json!(flags);

        obj
    }
}
