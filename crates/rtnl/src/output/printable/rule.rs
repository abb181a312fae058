//! Printable implementation for RuleMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::RuleMessage;
use crate::netlink::names::table_name;
use crate::netlink::types::rule::action;
use crate::output::{OutputOptions, Printable};

fn selector(addr: Option<std::net::IpAddr>, len: u8) -> String {
    match addr {
        Some(a) if len == 0 || (a.is_ipv4() && len == 32) || (a.is_ipv6() && len == 128) => {
            a.to_string()
        }
        Some(a) => format!("{}/{}", a, len),
        None => "all".to_string(),
    }
}

impl RuleMessage {
    fn action_text(&self, opts: &OutputOptions) -> String {
        match self.action() {
            action::TO_TBL => {
                let table = if opts.numeric {
                    self.table().to_string()
                } else {
                    table_name(self.table())
                };
                format!("lookup {}", table)
            }
            action::GOTO => match self.goto_target() {
                Some(target) => format!("goto {}", target),
                None => "goto none".to_string(),
            },
            action::NOP => "nop".to_string(),
            action::BLACKHOLE => "blackhole".to_string(),
            action::UNREACHABLE => "unreachable".to_string(),
            action::PROHIBIT => "prohibit".to_string(),
            other => format!("action {}", other),
        }
    }
}

impl Printable for RuleMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        _names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        write!(w, "{}:\t", self.priority())?;
        if self.is_inverted() {
            write!(w, "not ")?;
        }
        write!(w, "from {}", selector(self.source(), self.src_len()))?;
        if let Some(dst) = self.destination() {
            write!(w, " to {}", selector(Some(dst), self.dst_len()))?;
        }
        if let Some(mark) = self.fwmark() {
            write!(w, " fwmark {:#x}", mark)?;
            if let Some(mask) = self.fwmask().filter(|&m| m != u32::MAX) {
                write!(w, "/{:#x}", mask)?;
            }
        }
        if let Some(iif) = self.iifname() {
            write!(w, " iif {}", iif)?;
        }
        if let Some(oif) = self.oifname() {
            write!(w, " oif {}", oif)?;
        }
        writeln!(w, " {}", self.action_text(opts))
    }

    fn to_json(&self, _names: &NameCache, _opts: &OutputOptions) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "priority": self.priority(),
            "src": selector(self.source(), self.src_len()),
        });
        if let Some(dst) = self.destination() {
            obj["dst"] = serde_json::json!(selector(Some(dst), self.dst_len()));
        }
        if self.is_inverted() {
            obj["not"] = serde_json::json!(true);
        }
        if let Some(mark) = self.fwmark() {
            obj["fwmark"] = serde_json::json!(format!("{:#x}", mark));
        }
        if let Some(iif) = self.iifname() {
            obj["iif"] = serde_json::json!(iif);
        }
        if let Some(oif) = self.oifname() {
            obj["oif"] = serde_json::json!(oif);
        }
        match self.action() {
            action::TO_TBL => obj["table"] = serde_json::json!(table_name(self.table())),
            action::GOTO => obj["goto"] = serde_json::json!(self.goto_target()),
            _ => obj["action"] = serde_json::json!(self.action_text(&OutputOptions::default())),
        }
        obj
    }
}
