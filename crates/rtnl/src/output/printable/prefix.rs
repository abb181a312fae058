//! Printable implementation for PrefixMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::PrefixMessage;
use crate::output::formatting::format_prefix;
use crate::output::{OutputOptions, Printable, ifname};

impl Printable for PrefixMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        write!(
            w,
            "prefix {} dev {}",
            format_prefix(self.address(), self.prefix_len()),
            ifname(names, self.ifindex(), opts)
        )?;
        if self.is_onlink() {
            write!(w, " onlink")?;
        }
        if self.is_autoconf() {
            write!(w, " autoconf")?;
        }
        if let Some((preferred, valid)) = self.lifetimes() {
            write!(w, " valid {} preferred {}", valid, preferred)?;
        }
        writeln!(w)
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "prefix": format_prefix(self.address(), self.prefix_len()),
            "dev": ifname(names, self.ifindex(), opts),
            "onlink": self.is_onlink(),
            "autoconf": self.is_autoconf(),
        });
        if let Some((preferred, valid)) = self.lifetimes() {
            obj["valid"] = serde_json::json!(valid);
            obj["preferred"] = serde_json::json!(preferred);
        }
        obj
    }
}
