//! Rendering of monitor records.
//!
//! Each record gets an optional heading before its body, in this order:
//! timestamp, `[nsid ...]`, `[LABEL]`, then `Deleted ` for removals.
//!
//! ```ignore
//! use rtnl::output::{MonitorConfig, TimestampMode, print_record};
//!
//! let config = MonitorConfig::new().with_label(true).with_timestamp(TimestampMode::Short);
//! while let Some(record) = monitor.next().await {
//!     print_record(&mut stdout, &record?, monitor.names(), &config)?;
//! }
//! ```

use std::io::{self, Write};
use std::time::SystemTime;

use super::formatting::{format_timestamp_long, format_timestamp_short};
use super::{OutputFormat, OutputOptions, Printable, write_json};
use crate::netlink::NameCache;
use crate::netlink::message::NlMsgType;
use crate::netlink::monitor::{Event, MonitorRecord};

/// How receive times are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampMode {
    #[default]
    None,
    /// A `Timestamp: ...` line in local time before each record.
    Long,
    /// A `[secs.micros] ` prefix.
    Short,
}

/// Configuration for monitor output.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    pub timestamp: TimestampMode,
    /// Prefix records with their object kind, e.g. `[LINK]`.
    pub label: bool,
    /// Prefix records with the namespace they came from.
    pub all_nsid: bool,
    pub format: OutputFormat,
    pub opts: OutputOptions,
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, mode: TimestampMode) -> Self {
        self.timestamp = mode;
        self
    }

    pub fn with_label(mut self, enabled: bool) -> Self {
        self.label = enabled;
        self
    }

    pub fn with_all_nsid(mut self, enabled: bool) -> Self {
        self.all_nsid = enabled;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_opts(mut self, opts: OutputOptions) -> Self {
        self.opts = opts;
        self
    }
}

/// Write the timestamp heading for a record received at `at`.
pub fn write_timestamp<W: Write>(w: &mut W, mode: TimestampMode, at: SystemTime) -> io::Result<()> {
    match mode {
        TimestampMode::None => Ok(()),
        TimestampMode::Long => writeln!(w, "Timestamp: {}", format_timestamp_long(at)),
        TimestampMode::Short => write!(w, "{} ", format_timestamp_short(at)),
    }
}

/// Print one record stamped with the current time.
pub fn print_record<W: Write>(
    w: &mut W,
    record: &MonitorRecord,
    names: &NameCache,
    config: &MonitorConfig,
) -> io::Result<()> {
    print_record_at(w, record, names, config, SystemTime::now())
}

/// Print one record received at `at`.
pub fn print_record_at<W: Write>(
    w: &mut W,
    record: &MonitorRecord,
    names: &NameCache,
    config: &MonitorConfig,
    at: SystemTime,
) -> io::Result<()> {
    match config.format {
        OutputFormat::Text => print_text(w, record, names, config, at)?,
        OutputFormat::Json => write_json(w, &record_json(record, names, config, at), &config.opts)?,
    }
    w.flush()
}

fn print_text<W: Write>(
    w: &mut W,
    record: &MonitorRecord,
    names: &NameCache,
    config: &MonitorConfig,
    at: SystemTime,
) -> io::Result<()> {
    // A capture marker is itself a timestamp; no heading of its own.
    if let Event::Timestamp(t) = record.event {
        return writeln!(w, "Timestamp: {}", format_timestamp_long(t));
    }

    write_timestamp(w, config.timestamp, at)?;
    if config.all_nsid {
        match record.nsid {
            Some(nsid) => write!(w, "[nsid {}]", nsid)?,
            None => write!(w, "[nsid current]")?,
        }
    }
    if config.label
        && let Some(label) = record.event.label()
    {
        write!(w, "[{}]", label)?;
    }
    if record.is_deleted() {
        write!(w, "Deleted ")?;
    }

    let opts = &config.opts;
    let hdr = &record.header;
    match &record.event {
        Event::Link(m) => m.print_text(w, names, opts),
        Event::Address(m) => {
            writeln!(w, "{}: {}", m.ifindex(), names.link_name(m.ifindex()))?;
            m.print_text(w, names, opts)
        }
        Event::Route(m) => m.print_text(w, names, opts),
        Event::Neighbor(m) => {
            if hdr.nlmsg_type == NlMsgType::RTM_GETNEIGH {
                write!(w, "miss ")?;
            }
            m.print_text(w, names, opts)
        }
        Event::Rule(m) => m.print_text(w, names, opts),
        Event::AddrLabel(m) => m.print_text(w, names, opts),
        Event::Netconf(m) => m.print_text(w, names, opts),
        Event::Nsid(m) => m.print_text(w, names, opts),
        Event::Prefix(m) => m.print_text(w, names, opts),
        Event::Noop => writeln!(w, "NOOP pid={}, seq={}", hdr.nlmsg_pid, hdr.nlmsg_seq),
        Event::Done => writeln!(w, "DONE pid={}, seq={}", hdr.nlmsg_pid, hdr.nlmsg_seq),
        Event::Ack => writeln!(w, "ACK pid={} seq={}", hdr.nlmsg_pid, hdr.nlmsg_seq),
        Event::Overrun => writeln!(w, "OVERRUN"),
        Event::Error { errno, request } => writeln!(
            w,
            "ERROR {}: type={}; pid={}; seq={}",
            io::Error::from_raw_os_error(*errno),
            NlMsgType::name(request.nlmsg_type)
                .map(str::to_string)
                .unwrap_or_else(|| request.nlmsg_type.to_string()),
            request.nlmsg_pid,
            request.nlmsg_seq
        ),
        Event::Other => writeln!(w, "unknown message type {}", hdr.nlmsg_type),
        Event::Timestamp(_) => Ok(()),
    }
}

fn record_json(
    record: &MonitorRecord,
    names: &NameCache,
    config: &MonitorConfig,
    at: SystemTime,
) -> serde_json::Value {
    let opts = &config.opts;
    let hdr = &record.header;
    let object = match &record.event {
        Event::Link(m) => m.to_json(names, opts),
        Event::Address(m) => m.to_json(names, opts),
        Event::Route(m) => m.to_json(names, opts),
        Event::Neighbor(m) => m.to_json(names, opts),
        Event::Rule(m) => m.to_json(names, opts),
        Event::AddrLabel(m) => m.to_json(names, opts),
        Event::Netconf(m) => m.to_json(names, opts),
        Event::Nsid(m) => m.to_json(names, opts),
        Event::Prefix(m) => m.to_json(names, opts),
        Event::Timestamp(t) => serde_json::json!({ "timestamp": format_timestamp_short(*t) }),
        Event::Error { errno, request } => serde_json::json!({
            "errno": errno,
            "type": request.nlmsg_type,
            "pid": request.nlmsg_pid,
            "seq": request.nlmsg_seq,
        }),
        Event::Noop | Event::Done | Event::Ack | Event::Overrun | Event::Other => {
            serde_json::json!({ "pid": hdr.nlmsg_pid, "seq": hdr.nlmsg_seq })
        }
    };

    let mut obj = serde_json::json!({
        "type": NlMsgType::name(hdr.nlmsg_type),
        "deleted": record.is_deleted(),
        "object": object,
    });
    if config.all_nsid {
        obj["nsid"] = serde_json::json!(record.nsid);
    }
    if config.timestamp != TimestampMode::None {
        obj["timestamp"] = serde_json::json!(format_timestamp_short(at));
    }
    obj
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::netlink::fixtures;
    use crate::netlink::message::Frame;

    fn record(bytes: &[u8], nsid: Option<i32>) -> MonitorRecord {
        MonitorRecord::decode(&Frame::parse(bytes).unwrap(), nsid).unwrap()
    }

    fn render(record: &MonitorRecord, config: &MonitorConfig) -> String {
        let mut out = Vec::new();
        let at = UNIX_EPOCH + Duration::from_micros(5_000_001);
        print_record_at(&mut out, record, &NameCache::new(), config, at).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_heading_order() {
        let mut bytes = fixtures::neighbor_arp();
        bytes[4..6].copy_from_slice(&NlMsgType::RTM_DELNEIGH.to_ne_bytes());
        let rec = record(&bytes, Some(7));

        let config = MonitorConfig::new()
            .with_timestamp(TimestampMode::Short)
            .with_all_nsid(true)
            .with_label(true);
        assert_eq!(
            render(&rec, &config),
            "[5.000001] [nsid 7][NEIGH]Deleted 192.168.1.1 dev 2 lladdr 00:11:22:33:44:55 REACHABLE\n"
        );
    }

    #[test]
    fn test_own_namespace_and_plain() {
        let rec = record(&fixtures::rule_main(), None);
        let config = MonitorConfig::new().with_all_nsid(true);
        assert_eq!(
            render(&rec, &config),
            "[nsid current]32766:\tfrom all lookup main\n"
        );
        assert_eq!(
            render(&rec, &MonitorConfig::new()),
            "32766:\tfrom all lookup main\n"
        );
    }

    #[test]
    fn test_control_frames() {
        let err = record(
            &fixtures::error(-libc::ENOENT, 9, 100, NlMsgType::RTM_DELADDR),
            None,
        );
        let text = render(&err, &MonitorConfig::new());
        assert!(text.starts_with("ERROR "), "{text}");
        assert!(text.ends_with("type=RTM_DELADDR; pid=100; seq=9\n"), "{text}");

        let ack = record(&fixtures::error(0, 9, 100, NlMsgType::RTM_NEWADDR), None);
        assert_eq!(render(&ack, &MonitorConfig::new()), "ACK pid=100 seq=9\n");

        let done = record(&fixtures::done(3, 100), None);
        assert_eq!(
            render(&done, &MonitorConfig::new()),
            "DONE pid=100, seq=3\n"
        );
    }

    #[test]
    fn test_json_record() {
        let rec = record(&fixtures::route_default_v4(), Some(2));
        let config = MonitorConfig::new()
            .with_format(OutputFormat::Json)
            .with_all_nsid(true);
        let text = render(&rec, &config);
        let json: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(json["type"], "RTM_NEWROUTE");
        assert_eq!(json["nsid"], 2);
        assert_eq!(json["deleted"], false);
        assert_eq!(json["object"]["gateway"], "192.168.1.1");
    }
}
