//! Receive pipeline between the socket and a session.
//!
//! Two tasks sit behind every [`RouteSocket`]. The reader pulls raw
//! datagrams off the socket; the reassembler splits them into messages and
//! repacks complete messages into page-sized batches. A batch never ends in
//! the middle of a message, and a message larger than a page gets a buffer
//! of its own.
//!
//! Both queues are bounded, so a slow consumer eventually stops the reader
//! and the kernel starts dropping (ENOBUFS) instead of this process growing.

use std::future::{Future, poll_fn};
use std::io;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, nlmsg_align};
use super::socket::{NetlinkSocket, SocketConfig};

/// Batch size of the reassembly stage.
pub const PAGE_SIZE: usize = 4096;

/// One datagram as read from the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub data: Bytes,
    /// Namespace id from the NETLINK_LISTEN_ALL_NSID control message.
    pub nsid: Option<i32>,
}

impl Datagram {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            nsid: None,
        }
    }

    pub fn with_nsid(mut self, nsid: Option<i32>) -> Self {
        self.nsid = nsid;
        self
    }
}

/// Item handed from the pipeline to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// One or more complete, aligned frames.
    Frames(Bytes),
    /// Frames after this one come from another namespace.
    /// `None` is the socket's own namespace.
    Namespace(Option<i32>),
}

/// Splits datagrams into messages and packs them into batches.
#[derive(Debug)]
pub struct Reassembler {
    track_nsid: bool,
    nsid: Option<i32>,
    batch: BytesMut,
    /// Bytes at the front of `batch` that form whole messages.
    complete: usize,
    limit: usize,
    header: [u8; NLMSG_HDRLEN],
    header_fill: usize,
    body_left: usize,
}

impl Reassembler {
    /// `track_nsid` turns on [`Delivery::Namespace`] events.
    pub fn new(track_nsid: bool) -> Self {
        Self {
            track_nsid,
            nsid: None,
            batch: BytesMut::new(),
            complete: 0,
            limit: PAGE_SIZE,
            header: [0; NLMSG_HDRLEN],
            header_fill: 0,
            body_left: 0,
        }
    }

    /// Feed one datagram. Batches that fill up are pushed onto `out`.
    pub fn push(&mut self, datagram: Datagram, out: &mut Vec<Delivery>) {
        if self.track_nsid && datagram.nsid != self.nsid {
            self.flush(out);
            self.nsid = datagram.nsid;
            out.push(Delivery::Namespace(datagram.nsid));
        }

        let mut data = &datagram.data[..];
        while !data.is_empty() {
            if self.body_left == 0 {
                let n = (NLMSG_HDRLEN - self.header_fill).min(data.len());
                self.header[self.header_fill..self.header_fill + n].copy_from_slice(&data[..n]);
                self.header_fill += n;
                data = &data[n..];
                if self.header_fill < NLMSG_HDRLEN {
                    break;
                }
                self.header_fill = 0;
                self.start_message(data.len(), out);
                continue;
            }

            let n = self.body_left.min(data.len());
            self.batch.extend_from_slice(&data[..n]);
            self.body_left -= n;
            data = &data[n..];
            if self.body_left == 0 {
                self.finish_message(out);
            }
        }

        // The kernel never splits a message across datagrams. Whatever is
        // left over is handed on as is, so the session sees a frame whose
        // length disagrees with its bytes.
        if self.body_left > 0 {
            tracing::debug!(missing = self.body_left, "datagram ended inside a message");
            self.body_left = 0;
            self.complete = self.batch.len();
        }
        if self.header_fill > 0 {
            tracing::trace!(bytes = self.header_fill, "dropping trailing header fragment");
            self.header_fill = 0;
        }
    }

    /// Hand out the whole messages gathered so far.
    pub fn flush(&mut self, out: &mut Vec<Delivery>) {
        if self.complete == 0 {
            return;
        }
        let done = self.batch.split_to(self.complete).freeze();
        self.complete = 0;
        out.push(Delivery::Frames(done));
    }

    /// `remaining` is what the current datagram holds past the header.
    fn start_message(&mut self, remaining: usize, out: &mut Vec<Delivery>) {
        let declared = u32::from_ne_bytes([
            self.header[0],
            self.header[1],
            self.header[2],
            self.header[3],
        ]) as usize;
        // A length below the header size still yields a frame; rejecting it
        // is up to whoever parses the batch. A length past the end of the
        // datagram is cut to the bytes present, never reserved up front.
        let available = NLMSG_HDRLEN + remaining;
        let total = if declared > available {
            available
        } else {
            nlmsg_align(declared).max(NLMSG_HDRLEN)
        };

        if self.batch.len() + total > self.limit {
            self.flush(out);
        }
        if self.batch.is_empty() {
            self.limit = total.max(PAGE_SIZE);
            self.batch.reserve(self.limit);
        }

        self.batch.extend_from_slice(&self.header);
        self.body_left = total - NLMSG_HDRLEN;
        if self.body_left == 0 {
            self.finish_message(out);
        }
    }

    fn finish_message(&mut self, out: &mut Vec<Delivery>) {
        self.complete = self.batch.len();
        if self.complete >= self.limit {
            self.flush(out);
        }
    }
}

/// Run the reassembly stage until either side of it goes away.
///
/// A batch is flushed early once no further datagram is already waiting, so
/// a lone reply is never held back for a page to fill.
fn spawn_reassembly(
    mut raw: mpsc::Receiver<Datagram>,
    tx: mpsc::Sender<Delivery>,
    track_nsid: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reassembler = Reassembler::new(track_nsid);
        let mut out = Vec::new();

        while let Some(datagram) = raw.recv().await {
            reassembler.push(datagram, &mut out);
            while let Ok(datagram) = raw.try_recv() {
                reassembler.push(datagram, &mut out);
                if !forward(&tx, &mut out).await {
                    return;
                }
            }
            reassembler.flush(&mut out);
            if !forward(&tx, &mut out).await {
                return;
            }
        }

        tracing::trace!("reassembly stage finished");
    })
}

async fn forward(tx: &mpsc::Sender<Delivery>, out: &mut Vec<Delivery>) -> bool {
    for delivery in out.drain(..) {
        if tx.send(delivery).await.is_err() {
            return false;
        }
    }
    true
}

fn spawn_reader(
    socket: Arc<NetlinkSocket>,
    tx: mpsc::Sender<Datagram>,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let datagram = tokio::select! {
                _ = &mut shutdown => break,
                result = socket.recv_datagram() => match result {
                    Ok(datagram) => datagram,
                    Err(Error::Io(e)) if e.raw_os_error() == Some(libc::ENOBUFS) => {
                        tracing::warn!("netlink receive buffer overrun, notifications were lost");
                        continue;
                    }
                    Err(Error::Io(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::debug!(error = %e, "netlink read failed");
                        break;
                    }
                },
            };
            if tx.send(datagram).await.is_err() {
                break;
            }
        }

        tracing::trace!(pid = socket.pid(), "reader stopped");
    })
}

/// The two ends a session needs from a socket.
pub trait Transport: Send {
    /// Local port id; replies to our requests carry it.
    fn pid(&self) -> u32;

    /// Multicast groups this transport was bound to.
    fn groups(&self) -> u32 {
        0
    }

    /// Send one complete request.
    fn send(&mut self, msg: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Poll the delivery queue. `None` once the pipeline has shut down.
    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Delivery>>;

    /// Wait for the next delivery.
    fn recv(&mut self) -> impl Future<Output = Option<Delivery>> + Send {
        poll_fn(move |cx| self.poll_recv(cx))
    }
}

/// A NETLINK_ROUTE socket with its receive pipeline running.
pub struct RouteSocket {
    socket: Arc<NetlinkSocket>,
    rx: mpsc::Receiver<Delivery>,
    shutdown: Option<oneshot::Sender<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl RouteSocket {
    /// Open a socket and start its pipeline. Needs a tokio runtime.
    pub fn open(config: SocketConfig) -> Result<Self> {
        let socket = Arc::new(NetlinkSocket::open(&config)?);
        let (raw_tx, raw_rx) = mpsc::channel(config.depth);
        let (tx, rx) = mpsc::channel(config.depth);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let tasks = vec![
            spawn_reader(socket.clone(), raw_tx, shutdown_rx),
            spawn_reassembly(raw_rx, tx, config.all_nsid),
        ];

        Ok(Self {
            socket,
            rx,
            shutdown: Some(shutdown_tx),
            tasks,
        })
    }

    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Stop both stages and wait for them. The descriptor is closed once
    /// the reader has let go of it.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.rx.close();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "pipeline task failed");
            }
        }
    }
}

impl Drop for RouteSocket {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl Transport for RouteSocket {
    fn pid(&self) -> u32 {
        self.socket.pid()
    }

    fn groups(&self) -> u32 {
        self.socket.groups()
    }

    fn send(&mut self, msg: &[u8]) -> impl Future<Output = Result<()>> + Send {
        let socket = self.socket.clone();
        async move { socket.send(msg).await }
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Delivery>> {
        self.rx.poll_recv(cx)
    }
}

/// In-memory transport driven by a [`KernelEnd`].
///
/// Datagrams pushed into the kernel end go through the same reassembly
/// stage as a real socket.
pub struct ChannelTransport {
    pid: u32,
    groups: u32,
    requests: mpsc::UnboundedSender<Vec<u8>>,
    rx: mpsc::Receiver<Delivery>,
    _task: JoinHandle<()>,
}

/// The far side of a [`ChannelTransport`].
pub struct KernelEnd {
    requests: mpsc::UnboundedReceiver<Vec<u8>>,
    datagrams: mpsc::Sender<Datagram>,
}

impl ChannelTransport {
    /// Create a connected pair. Needs a tokio runtime.
    pub fn pair(pid: u32, config: &SocketConfig) -> (Self, KernelEnd) {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (raw_tx, raw_rx) = mpsc::channel(config.depth);
        let (tx, rx) = mpsc::channel(config.depth);
        let task = spawn_reassembly(raw_rx, tx, config.all_nsid);

        let transport = Self {
            pid,
            groups: config.groups,
            requests: req_tx,
            rx,
            _task: task,
        };
        let kernel = KernelEnd {
            requests: req_rx,
            datagrams: raw_tx,
        };
        (transport, kernel)
    }
}

impl Transport for ChannelTransport {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn groups(&self) -> u32 {
        self.groups
    }

    fn send(&mut self, msg: &[u8]) -> impl Future<Output = Result<()>> + Send {
        let sent = self
            .requests
            .send(msg.to_vec())
            .map_err(|_| Error::TransportClosed);
        async move { sent }
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Delivery>> {
        self.rx.poll_recv(cx)
    }
}

impl KernelEnd {
    /// Next request the session sent, or `None` once it is gone.
    pub async fn recv_request(&mut self) -> Option<Vec<u8>> {
        self.requests.recv().await
    }

    /// Deliver one datagram from the socket's own namespace.
    pub async fn send(&self, data: impl Into<Bytes>) -> Result<()> {
        self.send_datagram(Datagram::new(data)).await
    }

    /// Deliver one datagram reported from namespace `nsid`.
    pub async fn send_from(&self, nsid: i32, data: impl Into<Bytes>) -> Result<()> {
        self.send_datagram(Datagram::new(data).with_nsid(Some(nsid))).await
    }

    pub async fn send_datagram(&self, datagram: Datagram) -> Result<()> {
        self.datagrams
            .send(datagram)
            .await
            .map_err(|_| Error::TransportClosed)
    }
}
