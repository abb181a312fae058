//! Printable implementation for NeighborMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::NeighborMessage;
use crate::netlink::types::neigh::nud;
use crate::output::formatting::format_mac;
use crate::output::{OutputOptions, Printable, ifname};

fn state_names(state: u16) -> Vec<&'static str> {
    nud::NAMES
        .iter()
        .filter(|(bit, _)| state & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}

impl Printable for NeighborMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        match self.destination() {
            Some(dst) => write!(w, "{}", dst)?,
            None => write!(w, "?")?,
        }
        write!(w, " dev {}", ifname(names, self.ifindex(), opts))?;
        if let Some(lladdr) = self.lladdr() {
            write!(w, " lladdr {}", format_mac(lladdr))?;
        }
        if self.is_router() {
            write!(w, " router")?;
        }
        if self.is_proxy() {
            write!(w, " proxy")?;
        }
        for state in state_names(self.state()) {
            write!(w, " {}", state)?;
        }
        if opts.details
            && let Some(probes) = self.probes()
        {
            write!(w, " probes {}", probes)?;
        }
        writeln!(w)
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "dev": ifname(names, self.ifindex(), opts),
            "state": state_names(self.state()),
        });
        if let Some(dst) = self.destination() {
            obj["dst"] = serde_json::json!(dst.to_string());
        }
        if let Some(lladdr) = self.lladdr() {
            obj["lladdr"] = serde_json::json!(format_mac(lladdr));
        }
        if self.is_router() {
            obj["router"] = serde_json::json!(true);
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;
    use crate::output::printable::test_util::decode;

    #[test]
    fn test_arp_entry() {
        let neigh: NeighborMessage = decode(&fixtures::neighbor_arp());
        let opts = OutputOptions::default();
        assert_eq!(
            neigh.to_text(&NameCache::new(), &opts),
            "192.168.1.1 dev 2 lladdr 00:11:22:33:44:55 REACHABLE\n"
        );

        let json = neigh.to_json(&NameCache::new(), &opts);
        assert_eq!(json["state"], serde_json::json!(["REACHABLE"]));
        assert_eq!(json["lladdr"], "00:11:22:33:44:55");
    }
}
