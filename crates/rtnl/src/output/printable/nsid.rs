//! Printable implementation for NsIdMessage.

use std::io::{self, Write};

use crate::netlink::NameCache;
use crate::netlink::messages::NsIdMessage;
use crate::output::{OutputOptions, Printable};

impl Printable for NsIdMessage {
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        _names: &NameCache,
        _opts: &OutputOptions,
    ) -> io::Result<()> {
        match self.nsid() {
            Some(nsid) if nsid >= 0 => write!(w, "nsid {}", nsid)?,
            _ => write!(w, "nsid unassigned")?,
        }
        if let Some(current) = self.current_nsid() {
            write!(w, " current-nsid {}", current)?;
        }
        if let Some(pid) = self.pid() {
            write!(w, " pid {}", pid)?;
        }
        if let Some(fd) = self.fd() {
            write!(w, " fd {}", fd)?;
        }
        writeln!(w)
    }

    fn to_json(&self, _names: &NameCache, _opts: &OutputOptions) -> serde_json::Value {
        serde_json::json!({
            "nsid": self.nsid(),
            "current-nsid": self.current_nsid(),
            "pid": self.pid(),
            "fd": self.fd(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;
    use crate::output::printable::test_util::decode;

    #[test]
    fn test_nsid_line() {
        let msg: NsIdMessage = decode(&fixtures::nsid_new(3, 4242));
        let opts = OutputOptions::default();
        assert_eq!(msg.to_text(&NameCache::new(), &opts), "nsid 3 pid 4242\n");
        assert_eq!(msg.to_json(&NameCache::new(), &opts)["nsid"], 3);
    }
}
