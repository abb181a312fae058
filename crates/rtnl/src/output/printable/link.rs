//! Printable implementation for LinkMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::LinkMessage;
use crate::netlink::types::link::{arphrd_name, iff};
use crate::output::formatting::{format_flags, format_mac};
use crate::output::{OutputOptions, Printable, ifname};

impl Printable for LinkMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        write!(w, "{}: {}", self.ifindex(), self.name_or("?"))?;
        if let Some(lower) = self.link().filter(|&l| l != 0 && l != self.ifindex()) {
            if self.link_netnsid().is_some() {
                write!(w, "@if{}", lower)?;
            } else {
                write!(w, "@{}", ifname(names, lower, opts))?;
            }
        }
        write!(w, ": <{}>", format_flags(self.flags(), iff::NAMES))?;

        if let Some(mtu) = self.mtu() {
            write!(w, " mtu {}", mtu)?;
        }
        if let Some(qdisc) = self.qdisc() {
            write!(w, " qdisc {}", qdisc)?;
        }
        if let Some(master) = self.master() {
            write!(w, " master {}", ifname(names, master, opts))?;
        }
        if let Some(state) = self.operstate() {
            write!(w, " state {}", state.name())?;
        }
        if let Some(group) = self.group() {
            let group = if opts.numeric {
                group.to_string()
            } else {
                names.group_name(group)
            };
            write!(w, " group {}", group)?;
        }
        if let Some(qlen) = self.txqlen() {
            write!(w, " qlen {}", qlen)?;
        }
        writeln!(w)?;

        write!(w, "    link/")?;
        match arphrd_name(self.link_type()) {
            Some(name) => write!(w, "{}", name)?,
            None => write!(w, "[{}]", self.link_type())?,
        }
        if let Some(addr) = self.address() {
            write!(w, " {}", format_mac(addr))?;
        }
        if let Some(brd) = self.broadcast() {
            let kw = if self.flags() & iff::POINTOPOINT != 0 {
                "peer"
            } else {
                "brd"
            };
            write!(w, " {} {}", kw, format_mac(brd))?;
        }
        if let Some(nsid) = self.link_netnsid() {
            write!(w, " link-netnsid {}", nsid)?;
        }
        writeln!(w)?;

        if opts.details {
            if let Some(alias) = self.alias() {
                writeln!(w, "    alias {}", alias)?;
            }
            if let Some(kind) = self.kind() {
                writeln!(w, "    {}", kind)?;
            }
            if let Some(promisc) = self.promiscuity() {
                writeln!(w, "    promiscuity {}", promisc)?;
            }
        }

        if opts.stats
            && let Some(s) = self.stats64()
        {
            writeln!(w, "    RX: bytes  packets  errors  dropped missed  mcast")?;
            writeln!(
                w,
                "    {:<10} {:<8} {:<7} {:<7} {:<7} {:<7}",
                s.rx_bytes(),
                s.rx_packets(),
                s.rx_errors(),
                s.rx_dropped(),
                s.0[15],
                s.multicast()
            )?;
            writeln!(w, "    TX: bytes  packets  errors  dropped carrier collsns")?;
            writeln!(
                w,
                "    {:<10} {:<8} {:<7} {:<7} {:<7} {:<7}",
                s.tx_bytes(),
                s.tx_packets(),
                s.tx_errors(),
                s.tx_dropped(),
                s.0[17],
                s.collisions()
            )?;
        }

        Ok(())
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let flags: Vec<&str> = iff::NAMES
            .iter()
            .filter(|(bit, _)| self.flags() & bit != 0)
            .map(|(_, name)| *name)
            .collect();

        let mut obj = serde_json::json!({
            "ifindex": self.ifindex(),
            "ifname": self.name(),
            "flags": flags,
            "link_type": arphrd_name(self.link_type()).unwrap_or("none"),
        });

        if let Some(mtu) = self.mtu() {
            obj["mtu"] = serde_json::json!(mtu);
        }
        if let Some(qdisc) = self.qdisc() {
            obj["qdisc"] = serde_json::json!(qdisc);
        }
        if let Some(master) = self.master() {
            obj["master"] = serde_json::json!(ifname(names, master, opts));
        }
        if let Some(state) = self.operstate() {
            obj["operstate"] = serde_json::json!(state.name());
        }
        if let Some(group) = self.group() {
            obj["group"] = serde_json::json!(names.group_name(group));
        }
        if let Some(qlen) = self.txqlen() {
            obj["txqlen"] = serde_json::json!(qlen);
        }
        if let Some(addr) = self.address() {
            obj["address"] = serde_json::json!(format_mac(addr));
        }
        if let Some(brd) = self.broadcast() {
            obj["broadcast"] = serde_json::json!(format_mac(brd));
        }
        if let Some(nsid) = self.link_netnsid() {
            obj["link_netnsid"] = serde_json::json!(nsid);
        }
        if opts.details {
            if let Some(kind) = self.kind() {
                obj["linkinfo"] = serde_json::json!({ "info_kind": kind });
            }
            if let Some(alias) = self.alias() {
                obj["ifalias"] = serde_json::json!(alias);
            }
        }
        if opts.stats
            && let Some(stats) = self.stats64()
        {
            let map: serde_json::Map<String, serde_json::Value> = stats
                .iter()
                .map(|(name, v)| (name.to_string(), serde_json::json!(v)))
                .collect();
            obj["stats64"] = serde_json::Value::Object(map);
        }

        obj
    }
}
