//! Printable implementation for AddrLabelMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::AddrLabelMessage;
use crate::output::formatting::format_prefix;
use crate::output::{OutputOptions, Printable, ifname};

impl Printable for AddrLabelMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        write!(w, "prefix {}", format_prefix(self.address(), self.prefix_len()))?;
        if self.ifindex() != 0 {
            write!(w, " dev {}", ifname(names, self.ifindex(), opts))?;
        }
        if let Some(label) = self.label() {
            write!(w, " label {}", label)?;
        }
        writeln!(w)
    }

    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "address": self.address().map(|a| a.to_string()),
            "prefixlen": self.prefix_len(),
            "label": self.label(),
        });
        if self.ifindex() != 0 {
            obj["dev"] = serde_json::json!(ifname(names, self.ifindex(), opts));
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;
    use crate::netlink::message::NlMsgType;
    use crate::output::printable::test_util::decode;

    #[test]
    fn test_label_line() {
        #[rustfmt::skip]
        let body = [
            // ifaddrlblmsg: family = AF_INET6, pad, prefixlen = 128, flags, index = 0, seq = 0
            0x0a, 0x00, 0x80, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // IFAL_ADDRESS = ::1
            0x14, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            // IFAL_LABEL = 0
            0x08, 0x00, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        let bytes = fixtures::frame(NlMsgType::RTM_NEWADDRLABEL, 0, 1, 100, &body);
        let label: AddrLabelMessage = decode(&bytes);
        assert_eq!(
            label.to_text(&NameCache::new(), &OutputOptions::default()),
            "prefix ::1/128 label 0\n"
        );
    }
}
