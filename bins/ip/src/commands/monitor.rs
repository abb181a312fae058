//! ip monitor - watch for netlink events.
//!
//! Live monitoring subscribes to the groups of the selected objects and
//! prints each record as it arrives. `--save` additionally writes a capture
//! file; `--file` replays one instead of opening a socket.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use clap::{Args, ValueEnum};
use rtnl::Result;
use rtnl::netlink::NameCache;
use rtnl::netlink::monitor::{Event, Monitor, MonitorObject, MonitorOptions, Replay};
use rtnl::output::monitor::print_record_at;
use rtnl::output::{MonitorConfig, OutputFormat, OutputOptions, TimestampMode, print_record};
use tokio_stream::StreamExt;

/// Object kinds that can be monitored.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ObjectArg {
    /// Link state changes (interfaces up/down, created, deleted).
    Link,
    /// Address changes.
    #[value(alias = "addr")]
    Address,
    /// Routing table changes.
    Route,
    /// Multicast routing changes.
    Mroute,
    /// IPv6 prefix announcements.
    Prefix,
    /// Neighbor (ARP/NDP) cache changes.
    #[value(alias = "neighbor")]
    Neigh,
    /// Per-device configuration changes.
    Netconf,
    /// Policy rule changes.
    Rule,
    /// Namespace id changes.
    Nsid,
    /// Everything.
    All,
}

impl ObjectArg {
    fn to_object(self) -> Option<MonitorObject> {
        Some(match self {
            ObjectArg::Link => MonitorObject::Link,
            ObjectArg::Address => MonitorObject::Address,
            ObjectArg::Route => MonitorObject::Route,
            ObjectArg::Mroute => MonitorObject::Mroute,
            ObjectArg::Prefix => MonitorObject::Prefix,
            ObjectArg::Neigh => MonitorObject::Neighbor,
            ObjectArg::Netconf => MonitorObject::Netconf,
            ObjectArg::Rule => MonitorObject::Rule,
            ObjectArg::Nsid => MonitorObject::Nsid,
            ObjectArg::All => return None,
        })
    }
}

#[derive(Args)]
pub struct MonitorCmd {
    /// Objects to monitor.
    #[arg(value_enum, default_value = "all")]
    objects: Vec<ObjectArg>,

    /// Prefix each record with its object kind.
    #[arg(long)]
    label: bool,

    /// Also report events from other namespaces, tagged with their nsid.
    #[arg(long)]
    all_nsid: bool,

    /// Print a timestamp line before each record.
    #[arg(short = 't', long, conflicts_with = "ts")]
    timestamp: bool,

    /// Prefix each record with a short timestamp.
    #[arg(long)]
    ts: bool,

    /// Write received frames to a capture file.
    #[arg(long, value_name = "FILE", conflicts_with = "file")]
    save: Option<PathBuf>,

    /// Replay a capture file instead of listening.
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Socket receive buffer size, for bursty notification traffic.
    #[arg(long, value_name = "BYTES", conflicts_with = "file")]
    rcvbuf: Option<usize>,
}

impl MonitorCmd {
    pub async fn run(
        &self,
        format: OutputFormat,
        opts: &OutputOptions,
        family: Option<u8>,
    ) -> Result<()> {
        let mode = if self.timestamp {
            TimestampMode::Long
        } else if self.ts {
            TimestampMode::Short
        } else {
            TimestampMode::None
        };
        let config = MonitorConfig::new()
            .with_timestamp(mode)
            .with_label(self.label)
            .with_all_nsid(self.all_nsid)
            .with_format(format)
            .with_opts(*opts);

        match &self.file {
            Some(path) => replay(path, &config),
            None => self.listen(&config, family).await,
        }
    }

    fn objects(&self) -> Vec<MonitorObject> {
        if self.objects.contains(&ObjectArg::All) {
            return Vec::new();
        }
        self.objects.iter().filter_map(|o| o.to_object()).collect()
    }

    async fn listen(&self, config: &MonitorConfig, family: Option<u8>) -> Result<()> {
        let mut options = MonitorOptions::new()
            .objects(&self.objects())
            .family(family)
            .all_nsid(self.all_nsid);
        if let Some(bytes) = self.rcvbuf {
            options = options.rcvbuf(bytes);
        }

        let mut monitor = Monitor::open(&options).await?;
        if let Some(path) = &self.save {
            monitor = monitor.with_capture(BufWriter::new(File::create(path)?));
        }

        let mut stdout = io::stdout();
        loop {
            let record = tokio::select! {
                record = monitor.next() => record,
                _ = tokio::signal::ctrl_c() => break,
            };
            match record {
                Some(Ok(record)) => print_record(&mut stdout, &record, monitor.names(), config)?,
                Some(Err(e)) if e.is_fatal() => return Err(e),
                Some(Err(e)) => tracing::warn!(error = %e, "skipping undecodable frame"),
                None => break,
            }
        }

        monitor.flush()?;
        monitor.close().await;
        Ok(())
    }
}

/// Print a capture file, stamping each record with the marker before it.
fn replay(path: &Path, config: &MonitorConfig) -> Result<()> {
    let mut names = NameCache::new();
    let mut at = SystemTime::UNIX_EPOCH;
    let mut stdout = io::stdout().lock();

    for record in Replay::open(path)?.with_timestamps(true) {
        let record = record?;
        if let Event::Timestamp(t) = record.event {
            at = t;
            continue;
        }
        record.update_names(&mut names);
        print_record_at(&mut stdout, &record, &names, config, at)?;
    }

    stdout.flush()?;
    Ok(())
}
