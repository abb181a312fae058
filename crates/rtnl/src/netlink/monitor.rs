//! Notification monitoring: live streams, capture files and replay.
//!
//! A capture file is a plain concatenation of frames. Each frame the kernel
//! delivered is preceded by a synthetic NLMSG_TSTAMP record (header plus
//! `{secs: u32, usecs: u32}`) holding the time it was received.
//!
//! In all-nsid mode the namespace a frame came from travels out of band.
//! The capture keeps it in-band instead: whenever it changes, a local
//! NLMSG_NSID marker (header plus `nsid: i32`, `-1` for our own namespace)
//! is written ahead of the next frame. Replay consumes the markers and
//! stamps the frames that follow; markers are never yielded as records.
//!
//! ```ignore
//! use rtnl::netlink::monitor::{Monitor, MonitorObject, MonitorOptions};
//! use tokio_stream::StreamExt;
//!
//! let opts = MonitorOptions::new().objects(&[MonitorObject::Link]);
//! let mut monitor = Monitor::open(&opts).await?;
//! while let Some(record) = monitor.next().await {
//!     let record = record?;
//!     println!("{:?}", record.event);
//! }
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio_stream::Stream;
use winnow::prelude::*;

use super::error::{Error, Result};
use super::message::{Frame, NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType, nlmsg_align, pop};
use super::messages::{
    AddrLabelMessage, AddressMessage, LinkMessage, NeighborMessage, NetconfMessage, NsIdMessage,
    PrefixMessage, RouteMessage, RuleMessage,
};
use super::names::NameCache;
use super::parse::{FromNetlink, parse_u32_ne};
use super::session::Session;
use super::socket::{RtnlGroup, SocketConfig};
use super::transport::{Delivery, RouteSocket, Transport};
use super::types::family;

/// Delivery queue depth of a monitor socket.
pub const MONITOR_QUEUE_DEPTH: usize = 16;

/// Length of a timestamp record: header plus two u32.
pub const TSTAMP_RECORD_LEN: usize = NLMSG_HDRLEN + 8;

/// Length of a namespace marker: header plus one i32.
pub const NSID_RECORD_LEN: usize = NLMSG_HDRLEN + 4;

/// Object kinds a monitor can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorObject {
    Link,
    Address,
    Route,
    Mroute,
    Prefix,
    Neighbor,
    Netconf,
    Rule,
    Nsid,
}

impl MonitorObject {
    pub const ALL: [MonitorObject; 9] = [
        Self::Link,
        Self::Address,
        Self::Route,
        Self::Mroute,
        Self::Prefix,
        Self::Neighbor,
        Self::Netconf,
        Self::Rule,
        Self::Nsid,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "link" => Self::Link,
            "address" | "addr" => Self::Address,
            "route" => Self::Route,
            "mroute" => Self::Mroute,
            "prefix" => Self::Prefix,
            "neigh" | "neighbor" => Self::Neighbor,
            "netconf" => Self::Netconf,
            "rule" => Self::Rule,
            "nsid" => Self::Nsid,
            _ => return None,
        })
    }

    /// Groups carrying this object, limited to `family` when one is given.
    pub fn groups(self, only: Option<u8>) -> Vec<RtnlGroup> {
        let v4 = only.is_none_or(|f| f == family::AF_INET);
        let v6 = only.is_none_or(|f| f == family::AF_INET6);
        let pick = |g4: Option<RtnlGroup>, g6: Option<RtnlGroup>| {
            let mut out = Vec::new();
            if v4 {
                out.extend(g4);
            }
            if v6 {
                out.extend(g6);
            }
            out
        };
        match self {
            Self::Link => vec![RtnlGroup::Link],
            Self::Neighbor => vec![RtnlGroup::Neigh, RtnlGroup::NdUseropt],
            Self::Nsid => vec![RtnlGroup::Nsid],
            Self::Address => pick(Some(RtnlGroup::Ipv4Ifaddr), Some(RtnlGroup::Ipv6Ifaddr)),
            Self::Route => pick(Some(RtnlGroup::Ipv4Route), Some(RtnlGroup::Ipv6Route)),
            Self::Mroute => pick(Some(RtnlGroup::Ipv4Mroute), Some(RtnlGroup::Ipv6Mroute)),
            Self::Netconf => pick(Some(RtnlGroup::Ipv4Netconf), Some(RtnlGroup::Ipv6Netconf)),
            Self::Rule => pick(Some(RtnlGroup::Ipv4Rule), Some(RtnlGroup::Ipv6Rule)),
            Self::Prefix => pick(None, Some(RtnlGroup::Ipv6Prefix)),
        }
    }
}

/// What to monitor and how to open the socket for it.
#[derive(Debug, Clone, Default)]
pub struct MonitorOptions {
    /// Objects to watch; empty means all of them.
    pub objects: Vec<MonitorObject>,
    /// Restrict per-family groups to one family.
    pub family: Option<u8>,
    pub all_nsid: bool,
    pub rcvbuf: Option<usize>,
}

impl MonitorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(mut self, objects: &[MonitorObject]) -> Self {
        self.objects.extend_from_slice(objects);
        self
    }

    pub fn family(mut self, family: Option<u8>) -> Self {
        self.family = family;
        self
    }

    pub fn all_nsid(mut self, enabled: bool) -> Self {
        self.all_nsid = enabled;
        self
    }

    pub fn rcvbuf(mut self, bytes: usize) -> Self {
        self.rcvbuf = Some(bytes);
        self
    }

    /// Bind-time group mask.
    ///
    /// Falls back to every object when the selection maps to no group,
    /// e.g. `prefix` restricted to IPv4.
    pub fn group_mask(&self) -> u32 {
        let mask = self.mask_for(&self.objects);
        if mask != 0 {
            mask
        } else {
            self.mask_for(&MonitorObject::ALL)
        }
    }

    fn mask_for(&self, objects: &[MonitorObject]) -> u32 {
        objects
            .iter()
            .flat_map(|o| o.groups(self.family))
            .fold(0, |acc, g| acc | g.bit())
    }

    pub fn socket_config(&self) -> SocketConfig {
        let mut config = SocketConfig::new()
            .group_mask(self.group_mask())
            .all_nsid(self.all_nsid)
            .depth(MONITOR_QUEUE_DEPTH);
        if let Some(size) = self.rcvbuf {
            config = config.rcvbuf(size);
        }
        config
    }
}

/// Decoded content of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Link(LinkMessage),
    Address(AddressMessage),
    Route(RouteMessage),
    Neighbor(NeighborMessage),
    Rule(RuleMessage),
    AddrLabel(AddrLabelMessage),
    Netconf(NetconfMessage),
    Nsid(NsIdMessage),
    Prefix(PrefixMessage),
    /// Capture-file marker with the receive time of the next frame.
    Timestamp(SystemTime),
    Noop,
    Done,
    Overrun,
    Ack,
    /// ERROR frame: positive errno and the header of the failed request.
    Error { errno: i32, request: NlMsgHdr },
    /// A type this monitor does not decode.
    Other,
}

impl Event {
    pub fn decode(frame: &Frame<'_>) -> Result<Self> {
        let payload = frame.payload();
        Ok(match frame.msg_type() {
            NlMsgType::RTM_NEWLINK | NlMsgType::RTM_DELLINK => {
                Self::Link(LinkMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWADDR | NlMsgType::RTM_DELADDR => {
                Self::Address(AddressMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWROUTE | NlMsgType::RTM_DELROUTE => {
                Self::Route(RouteMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWNEIGH | NlMsgType::RTM_DELNEIGH | NlMsgType::RTM_GETNEIGH => {
                Self::Neighbor(NeighborMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWRULE | NlMsgType::RTM_DELRULE => {
                Self::Rule(RuleMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWADDRLABEL | NlMsgType::RTM_DELADDRLABEL => {
                Self::AddrLabel(AddrLabelMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWNETCONF | NlMsgType::RTM_DELNETCONF => {
                Self::Netconf(NetconfMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWNSID | NlMsgType::RTM_DELNSID => {
                Self::Nsid(NsIdMessage::from_bytes(payload)?)
            }
            NlMsgType::RTM_NEWPREFIX => Self::Prefix(PrefixMessage::from_bytes(payload)?),
            NlMsgType::TSTAMP => Self::Timestamp(decode_timestamp(payload)?),
            NlMsgType::NOOP => Self::Noop,
            NlMsgType::DONE => Self::Done,
            NlMsgType::OVERRUN => Self::Overrun,
            NlMsgType::ERROR => match frame.typed::<NlMsgError>() {
                Ok(err) if err.error != 0 => Self::Error {
                    errno: err.error.saturating_abs(),
                    request: err.msg,
                },
                _ => Self::Ack,
            },
            _ => Self::Other,
        })
    }

    /// Prefix printed with `label`.
    pub fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::Link(_) => "LINK",
            Self::Address(_) => "ADDR",
            Self::Route(_) => "ROUTE",
            Self::Neighbor(_) => "NEIGH",
            Self::Rule(_) => "RULE",
            Self::AddrLabel(_) => "ADDRLABEL",
            Self::Netconf(_) => "NETCONF",
            Self::Nsid(_) => "NSID",
            Self::Prefix(_) => "PREFIX",
            Self::Noop => "NOOP",
            Self::Done => "DONE",
            Self::Ack => "ACK",
            Self::Error { .. } => "ERROR",
            Self::Timestamp(_) | Self::Overrun | Self::Other => return None,
        })
    }
}

/// One monitored frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorRecord {
    pub header: NlMsgHdr,
    /// Namespace the frame was reported from; `None` is our own.
    pub nsid: Option<i32>,
    pub event: Event,
}

impl MonitorRecord {
    pub fn decode(frame: &Frame<'_>, nsid: Option<i32>) -> Result<Self> {
        Ok(Self {
            header: frame.header,
            nsid,
            event: Event::decode(frame)?,
        })
    }

    /// The frame announces a removal.
    pub fn is_deleted(&self) -> bool {
        matches!(
            self.header.nlmsg_type,
            NlMsgType::RTM_DELLINK
                | NlMsgType::RTM_DELADDR
                | NlMsgType::RTM_DELROUTE
                | NlMsgType::RTM_DELNEIGH
                | NlMsgType::RTM_DELRULE
                | NlMsgType::RTM_DELADDRLABEL
                | NlMsgType::RTM_DELNETCONF
                | NlMsgType::RTM_DELNSID
        )
    }

    /// Keep `names` in step with link notifications.
    pub fn update_names(&self, names: &mut NameCache) {
        if let Event::Link(link) = &self.event {
            names.observe(self.header.nlmsg_type, link);
        }
    }
}

fn decode_timestamp(payload: &[u8]) -> Result<SystemTime> {
    let (secs, usecs) = (parse_u32_ne, parse_u32_ne)
        .parse_next(&mut &payload[..])
        .map_err(|_| Error::Truncated {
            expected: 8,
            actual: payload.len(),
        })?;
    Ok(UNIX_EPOCH + Duration::from_secs(secs.into()) + Duration::from_micros(usecs.into()))
}

/// Build the timestamp record written ahead of a captured frame.
pub fn timestamp_record(at: SystemTime) -> [u8; TSTAMP_RECORD_LEN] {
    let since = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let mut out = [0u8; TSTAMP_RECORD_LEN];
    out[0..4].copy_from_slice(&(TSTAMP_RECORD_LEN as u32).to_ne_bytes());
    out[4..6].copy_from_slice(&NlMsgType::TSTAMP.to_ne_bytes());
    out[16..20].copy_from_slice(&(since.as_secs() as u32).to_ne_bytes());
    out[20..24].copy_from_slice(&since.subsec_micros().to_ne_bytes());
    out
}

/// Build the marker recording that following frames came from `nsid`.
pub fn nsid_record(nsid: Option<i32>) -> [u8; NSID_RECORD_LEN] {
    let mut out = [0u8; NSID_RECORD_LEN];
    out[0..4].copy_from_slice(&(NSID_RECORD_LEN as u32).to_ne_bytes());
    out[4..6].copy_from_slice(&NlMsgType::NSID_MARK.to_ne_bytes());
    out[16..20].copy_from_slice(&nsid.unwrap_or(-1).to_ne_bytes());
    out
}

fn decode_nsid_marker(payload: &[u8]) -> Result<Option<i32>> {
    let raw = parse_u32_ne
        .parse_next(&mut &payload[..])
        .map_err(|_| Error::Truncated {
            expected: 4,
            actual: payload.len(),
        })? as i32;
    Ok((raw >= 0).then_some(raw))
}

/// Writes frames to a capture file.
pub struct CaptureWriter<W: Write> {
    inner: W,
    frames: u64,
    nsid: Option<i32>,
}

impl CaptureWriter<BufWriter<File>> {
    /// Create (or truncate) a capture file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            frames: 0,
            nsid: None,
        }
    }

    /// Note that frames written from now on came from `nsid`.
    ///
    /// Writes a marker only when the namespace actually changes.
    pub fn set_nsid(&mut self, nsid: Option<i32>) -> io::Result<()> {
        if nsid != self.nsid {
            self.inner.write_all(&nsid_record(nsid))?;
            self.nsid = nsid;
        }
        Ok(())
    }

    /// Record `frame` as received now.
    pub fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.write_frame_at(frame, SystemTime::now())
    }

    pub fn write_frame_at(&mut self, frame: &[u8], at: SystemTime) -> io::Result<()> {
        if frame.len() < NLMSG_HDRLEN {
            return Ok(());
        }
        self.inner.write_all(&timestamp_record(at))?;
        self.inner.write_all(frame)?;
        let pad = nlmsg_align(frame.len()) - frame.len();
        self.inner.write_all(&[0u8; 4][..pad])?;
        self.frames += 1;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Decodes a capture file frame by frame.
///
/// Timestamp markers are skipped unless [`Replay::with_timestamps`] asks
/// for them. Iteration stops at the first framing error.
pub struct Replay {
    data: Bytes,
    timestamps: bool,
    nsid: Option<i32>,
}

impl Replay {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            timestamps: false,
            nsid: None,
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

impl Iterator for Replay {
    type Item = Result<MonitorRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (frame, rest) = match pop(&self.data) {
                Ok(Some((frame, rest))) => (self.data.slice_ref(frame), self.data.slice_ref(rest)),
                Ok(None) => return None,
                Err(e) => {
                    self.data = Bytes::new();
                    return Some(Err(e));
                }
            };
            self.data = rest;

            let parsed = match Frame::parse(&frame) {
                Ok(parsed) => parsed,
                Err(e) => return Some(Err(e)),
            };
            if parsed.msg_type() == NlMsgType::NSID_MARK {
                match decode_nsid_marker(parsed.payload()) {
                    Ok(nsid) => {
                        self.nsid = nsid;
                        continue;
                    }
                    Err(e) => return Some(Err(e)),
                }
            }

            let record = MonitorRecord::decode(&parsed, self.nsid);
            match record {
                Ok(MonitorRecord {
                    event: Event::Timestamp(_),
                    ..
                }) if !self.timestamps => continue,
                other => return Some(other),
            }
        }
    }
}

/// A live stream of notifications.
///
/// Keeps a [`NameCache`] current from link notifications and, when a
/// capture writer is attached, writes every frame before decoding it.
pub struct Monitor<T: Transport = RouteSocket> {
    transport: T,
    names: NameCache,
    nsid: Option<i32>,
    pending: VecDeque<Result<MonitorRecord>>,
    capture: Option<CaptureWriter<Box<dyn Write + Send>>>,
}

impl Monitor<RouteSocket> {
    /// Seed the name cache from a link dump, then open the monitor socket.
    pub async fn open(opts: &MonitorOptions) -> Result<Self> {
        let mut session = Session::open()?;
        let links = session.get_links().await?;
        session.close().await;

        let socket = RouteSocket::open(opts.socket_config())?;
        tracing::debug!(groups = opts.group_mask(), all_nsid = opts.all_nsid, "monitor started");
        Ok(Self::new(socket).with_names(NameCache::from_links(&links)))
    }

    pub async fn close(self) {
        self.transport.close().await
    }
}

impl<T: Transport> Monitor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            names: NameCache::new(),
            nsid: None,
            pending: VecDeque::new(),
            capture: None,
        }
    }

    pub fn with_names(mut self, names: NameCache) -> Self {
        self.names = names;
        self
    }

    /// Write every received frame to `writer` in capture format.
    pub fn with_capture(mut self, writer: impl Write + Send + 'static) -> Self {
        self.capture = Some(CaptureWriter::new(Box::new(writer)));
        self
    }

    pub fn names(&self) -> &NameCache {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut NameCache {
        &mut self.names
    }

    /// Flush the capture writer, if any.
    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.capture {
            Some(capture) => capture.flush(),
            None => Ok(()),
        }
    }

    fn handle_batch(&mut self, batch: &[u8]) {
        let mut data = batch;
        loop {
            let (bytes, rest) = match pop(data) {
                Ok(Some(split)) => split,
                Ok(None) => break,
                Err(e) => {
                    self.pending.push_back(Err(e));
                    break;
                }
            };
            data = rest;

            if let Some(capture) = &mut self.capture
                && let Err(e) = capture.write_frame(bytes)
            {
                self.pending.push_back(Err(e.into()));
                continue;
            }

            let record = Frame::parse(bytes).and_then(|f| MonitorRecord::decode(&f, self.nsid));
            if let Ok(record) = &record {
                record.update_names(&mut self.names);
            }
            tracing::trace!(
                msg_type = u16::from_ne_bytes([bytes[4], bytes[5]]),
                ok = record.is_ok(),
                "monitor frame"
            );
            self.pending.push_back(record);
        }
    }
}

impl<T: Transport + Unpin> Stream for Monitor<T> {
    type Item = Result<MonitorRecord>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(record) = this.pending.pop_front() {
                return Poll::Ready(Some(record));
            }

            match this.transport.poll_recv(cx) {
                Poll::Ready(Some(Delivery::Frames(batch))) => this.handle_batch(&batch),
                Poll::Ready(Some(Delivery::Namespace(nsid))) => {
                    this.nsid = nsid;
                    if let Some(capture) = &mut this.capture
                        && let Err(e) = capture.set_nsid(nsid)
                    {
                        this.pending.push_back(Err(e.into()));
                    }
                }
                Poll::Ready(None) => {
                    if let Err(e) = this.flush() {
                        tracing::warn!(error = %e, "flushing capture failed");
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
