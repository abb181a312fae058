//! Printable implementations for AddressMessage and per-link address groups.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::{AddressMessage, LinkMessage};
use crate::netlink::names::scope_name;
use crate::netlink::types::addr::ifa_flags;
use crate::netlink::types::family;
use crate::output::formatting::format_lifetime;
use crate::output::{OutputOptions, Printable, ifname};

fn flag_names(addr: &AddressMessage) -> Vec<&'static str> {
    let flags = addr.flags();
    let mut out = Vec::new();
    if !addr.is_permanent() {
        out.push("dynamic");
    }
    out.extend(
        ifa_flags::NAMES
            .iter()
            .filter(|(bit, _)| flags & bit != 0)
            .map(|(_, name)| *name),
    );
    out
}

impl Printable for AddressMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        write!(w, "    {} ", family::name(self.family()))?;
        match (self.primary(), self.peer()) {
            (Some(local), Some(peer)) => {
                write!(w, "{} peer {}/{}", local, peer, self.prefix_len())?
            }
            (Some(local), None) => write!(w, "{}/{}", local, self.prefix_len())?,
            (None, _) => write!(w, "?/{}", self.prefix_len())?,
        }
        if let Some(brd) = self.broadcast() {
            write!(w, " brd {}", brd)?;
        }

        let scope = if opts.numeric {
            self.scope().to_string()
        } else {
            scope_name(self.scope())
        };
        write!(w, " scope {}", scope)?;

        for flag in flag_names(self) {
            write!(w, " {}", flag)?;
        }

        match self.label() {
            Some(label) => write!(w, " {}", label)?,
            None if self.family() == family::AF_INET => {
                write!(w, " {}", ifname(names, self.ifindex(), opts))?
            }
            None => {}
        }
        writeln!(w)?;

        if let Some(ci) = self.cacheinfo() {
            writeln!(
                w,
                "       valid_lft {} preferred_lft {}",
                format_lifetime(ci.ifa_valid),
                format_lifetime(ci.ifa_prefered)
            )?;
        }
        Ok(())
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "ifindex": self.ifindex(),
            "ifname": ifname(names, self.ifindex(), opts),
            "family": family::name(self.family()),
            "prefixlen": self.prefix_len(),
            "scope": scope_name(self.scope()),
        });

        if let Some(local) = self.primary() {
            obj["local"] = serde_json::json!(local.to_string());
        }
        if let Some(peer) = self.peer() {
            obj["address"] = serde_json::json!(peer.to_string());
        }
        if let Some(brd) = self.broadcast() {
            obj["broadcast"] = serde_json::json!(brd.to_string());
        }
        if let Some(label) = self.label() {
            obj["label"] = serde_json::json!(label);
        }
        let flags = flag_names(self);
        if !flags.is_empty() {
            obj["flags"] = serde_json::json!(flags);
        }
        if let Some(ci) = self.cacheinfo() {
            obj["valid_life_time"] = serde_json::json!(ci.ifa_valid);
            obj["preferred_life_time"] = serde_json::json!(ci.ifa_prefered);
        }

        obj
    }
}

/// A link followed by its addresses, as `ip address show` prints it.
#[derive(Debug, Clone)]
pub struct LinkAddresses<'a> {
    pub link: &'a LinkMessage,
    pub addrs: Vec<&'a AddressMessage>,
}

impl<'a> LinkAddresses<'a> {
    /// Group `addrs` under `links`, in link order.
    ///
    /// Links without any address are left out.
    pub fn group(links: &'a [LinkMessage], addrs: &'a [AddressMessage]) -> Vec<Self> {
        links
            .iter()
            .map(|link| LinkAddresses {
                link,
                addrs: addrs
                    .iter()
                    .filter(|a| a.ifindex() == link.ifindex())
                    .collect(),
            })
            .filter(|group| !group.addrs.is_empty())
            .collect()
    }
}

impl Printable for LinkAddresses<'_> {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        self.link.print_text(w, names, opts)?;
        for addr in &self.addrs {
            addr.print_text(w, names, opts)?;
        }
        Ok(())
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let mut obj = self.link.to_json(names, opts);
        obj["addr_info"] = self
            .addrs
            .iter()
            .map(|a| a.to_json(names, opts))
            .collect::<Vec<_>>()
            .into();
        obj
    }
}
