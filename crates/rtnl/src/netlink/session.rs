//! Request/response sessions over a [`Transport`].
//!
//! A session owns one transport and runs one request at a time: stamp the
//! next sequence number, send, then walk delivered frames until DONE or an
//! ERROR frame closes the exchange.
//!
//! ```ignore
//! use rtnl::netlink::{Session, messages::LinkMessage};
//!
//! let mut session = Session::open()?;
//! for link in session.get_links().await? {
//!     println!("{}: {}", link.ifindex(), link.name_or("?"));
//! }
//! ```

use std::collections::VecDeque;

use bytes::Bytes;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{Frame, NLM_F_DUMP, NLM_F_REQUEST, NlMsgHdr, NlMsgType, pop};
use super::parse::FromNetlink;
use super::socket::SocketConfig;
use super::transport::{Delivery, RouteSocket, Transport};

/// A request/response session.
pub struct Session<T: Transport = RouteSocket> {
    transport: T,
    seq: u32,
    nsid: Option<i32>,
    /// Unprocessed tail of the last batch.
    pending: Option<Bytes>,
    notifications: VecDeque<Bytes>,
    /// Request abandoned mid-reply; its leftover frames are skipped.
    stale: Option<u32>,
}

impl Session<RouteSocket> {
    /// Open a plain request session in the current namespace.
    pub fn open() -> Result<Self> {
        Self::open_with(SocketConfig::default())
    }

    /// Open a session on a socket built from `config`.
    ///
    /// A session bound to multicast groups queues notifications that
    /// arrive between replies; fetch them with [`Session::next_notification`].
    pub fn open_with(config: SocketConfig) -> Result<Self> {
        Ok(Self::new(RouteSocket::open(config)?))
    }

    /// Stop the receive pipeline and close the socket.
    pub async fn close(self) {
        self.transport.close().await
    }
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            seq: 0,
            nsid: None,
            pending: None,
            notifications: VecDeque::new(),
            stale: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Local port id.
    pub fn pid(&self) -> u32 {
        self.transport.pid()
    }

    /// Namespace the most recent frames were reported from; `None` is our own.
    pub fn current_nsid(&self) -> Option<i32> {
        self.nsid
    }

    /// Sequence number of the last request sent.
    pub fn last_seq(&self) -> u32 {
        self.seq
    }

    fn multiplexed(&self) -> bool {
        self.transport.groups() != 0
    }

    fn next_seq(&mut self) -> u32 {
        self.seq = self.seq.wrapping_add(1);
        if self.seq == 0 {
            self.seq = 1;
        }
        self.seq
    }

    /// Stamp and send a request without waiting for anything back.
    pub async fn send(&mut self, mut builder: MessageBuilder) -> Result<u32> {
        let seq = self.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.transport.pid());
        let msg = builder.finish()?;
        tracing::trace!(
            seq,
            msg_type = msg_type_name(u16::from_ne_bytes([msg[4], msg[5]])),
            len = msg.len(),
            "sending request"
        );
        self.transport.send(&msg).await?;
        Ok(seq)
    }

    /// Next batch of frames, draining the leftover of the previous one first.
    async fn next_batch(&mut self) -> Result<Bytes> {
        if let Some(rest) = self.pending.take() {
            return Ok(rest);
        }
        loop {
            match self.transport.recv().await {
                Some(Delivery::Frames(batch)) => return Ok(batch),
                Some(Delivery::Namespace(nsid)) => {
                    tracing::trace!(?nsid, "namespace changed");
                    self.nsid = nsid;
                }
                None => return Err(Error::TransportClosed),
            }
        }
    }

    /// Send `builder` and feed every reply frame to `handler` until the
    /// kernel signals the end of the exchange.
    ///
    /// DONE ends it successfully, as does an ERROR frame carrying errno 0.
    /// A nonzero errno becomes [`Error::KernelRejected`]. Frames carrying a
    /// foreign sequence number or port id fail with
    /// [`Error::ProtocolMismatch`] before the handler sees them, except
    /// multicast notifications on a session bound to groups, which are
    /// queued instead.
    pub async fn request<F>(&mut self, builder: MessageBuilder, mut handler: F) -> Result<()>
    where
        F: FnMut(&Frame<'_>) -> Result<()>,
    {
        let op = msg_type_name(builder.msg_type());
        let seq = self.send(builder).await?;
        let pid = self.transport.pid();

        loop {
            let batch = self.next_batch().await?;
            let mut data = &batch[..];

            while let Some((bytes, rest)) = pop(data).map_err(framing_error)? {
                data = rest;
                let frame = Frame::parse(bytes)?;
                let header = frame.header;

                if self.is_notification(&header) {
                    self.notifications.push_back(batch.slice_ref(bytes));
                    continue;
                }
                if self.skip_stale(&header) {
                    continue;
                }
                if header.nlmsg_seq != seq || header.nlmsg_pid != pid {
                    return Err(Error::ProtocolMismatch {
                        expected_seq: seq,
                        actual_seq: header.nlmsg_seq,
                        expected_pid: pid,
                        actual_pid: header.nlmsg_pid,
                    });
                }

                match header.nlmsg_type {
                    NlMsgType::DONE => {
                        self.keep_rest(&batch, rest);
                        return Ok(());
                    }
                    NlMsgType::ERROR => {
                        self.keep_rest(&batch, rest);
                        let err = frame.typed::<super::message::NlMsgError>()?;
                        if err.is_ack() {
                            return Ok(());
                        }
                        tracing::debug!(seq, errno = err.error, op, "request rejected");
                        return Err(Error::from_errno(err.error));
                    }
                    _ => {
                        if let Err(e) = handler(&frame) {
                            self.keep_rest(&batch, rest);
                            self.stale = Some(seq);
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Send a request that only expects an acknowledgement.
    pub async fn ack(&mut self, builder: MessageBuilder) -> Result<()> {
        self.request(builder, |frame| {
            tracing::debug!(msg_type = frame.msg_type(), "unexpected reply to acked request");
            Ok(())
        })
        .await
    }

    /// Dump every record of type `M` using the default request payload.
    pub async fn dump<M: FromNetlink>(&mut self, msg_type: u16) -> Result<Vec<M>> {
        let mut header = Vec::new();
        M::write_dump_header(&mut header);
        let mut builder = MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP);
        builder.append_bytes(&header);
        self.dump_with(builder).await
    }

    /// Run a prepared dump request, decoding each reply into `M`.
    pub async fn dump_with<M: FromNetlink>(&mut self, builder: MessageBuilder) -> Result<Vec<M>> {
        let mut out = Vec::new();
        self.request(builder, |frame| {
            out.push(M::from_bytes(frame.payload())?);
            Ok(())
        })
        .await?;
        Ok(out)
    }

    /// Wait for the next queued or incoming notification.
    ///
    /// Returns `None` once the transport has closed.
    pub async fn next_notification(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(frame) = self.notifications.pop_front() {
                return Ok(Some(frame));
            }
            let batch = match self.next_batch().await {
                Ok(batch) => batch,
                Err(Error::TransportClosed) => return Ok(None),
                Err(e) => return Err(e),
            };
            let mut data = &batch[..];
            while let Some((bytes, rest)) = pop(data).map_err(framing_error)? {
                data = rest;
                let header = NlMsgHdr::from_bytes(bytes)?;
                if self.skip_stale(&header) {
                    continue;
                }
                self.notifications.push_back(batch.slice_ref(bytes));
            }
        }
    }

    /// Notifications already queued.
    pub fn queued_notifications(&self) -> usize {
        self.notifications.len()
    }

    fn is_notification(&self, header: &NlMsgHdr) -> bool {
        self.multiplexed() && header.nlmsg_pid != self.transport.pid()
    }

    fn skip_stale(&mut self, header: &NlMsgHdr) -> bool {
        match self.stale {
            Some(stale) if header.nlmsg_seq == stale && header.nlmsg_pid == self.transport.pid() => {
                if matches!(header.nlmsg_type, NlMsgType::DONE | NlMsgType::ERROR) {
                    self.stale = None;
                }
                true
            }
            _ => false,
        }
    }

    fn keep_rest(&mut self, batch: &Bytes, rest: &[u8]) {
        if !rest.is_empty() {
            self.pending = Some(batch.slice_ref(rest));
        }
    }
}

fn framing_error(e: Error) -> Error {
    match e {
        Error::Truncated { expected, actual } => Error::MalformedFrame(format!(
            "frame declares {expected} bytes, only {actual} delivered"
        )),
        other => other,
    }
}

fn msg_type_name(msg_type: u16) -> &'static str {
    NlMsgType::name(msg_type).unwrap_or("UNKNOWN")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures::{self, PID, SEQ};
    use crate::netlink::message::NlMsgHdr;
    use crate::netlink::messages::LinkMessage;
    use crate::netlink::transport::{ChannelTransport, KernelEnd};
    use crate::netlink::types::link::IfInfoMsg;

    fn session() -> (Session<ChannelTransport>, KernelEnd) {
        let (transport, kernel) = ChannelTransport::pair(PID, &SocketConfig::default());
        (Session::new(transport), kernel)
    }

    fn getlink() -> MessageBuilder {
        MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST | NLM_F_DUMP)
            .payload(&IfInfoMsg::new())
    }

    #[tokio::test]
    async fn test_request_stamps_seq_and_pid() {
        let (mut session, mut kernel) = session();
        let task = tokio::spawn(async move {
            let req = kernel.recv_request().await.unwrap();
            let header = NlMsgHdr::from_bytes(&req).unwrap();
            kernel.send(fixtures::done(header.nlmsg_seq, header.nlmsg_pid)).await.unwrap();
            header
        });
        session.request(getlink(), |_| Ok(())).await.unwrap();
        let header = task.await.unwrap();
        assert_eq!(header.nlmsg_seq, SEQ);
        assert_eq!(header.nlmsg_pid, PID);
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_GETLINK);
        assert_eq!(session.last_seq(), 1);
    }

    #[tokio::test]
    async fn test_handler_called_per_frame() {
        let (mut session, kernel) = session();
        let mut data = fixtures::link_loopback();
        data.extend(fixtures::link_loopback());
        kernel.send(data).await.unwrap();
        kernel.send(fixtures::link_loopback()).await.unwrap();
        kernel.send(fixtures::done(SEQ, PID)).await.unwrap();

        let links: Vec<LinkMessage> = session.dump_with(getlink()).await.unwrap();
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| l.name().as_deref() == Some("lo")));
    }

    #[tokio::test]
    async fn test_kernel_rejection() {
        let (mut session, kernel) = session();
        kernel
            .send(fixtures::error(-libc::ENOENT, SEQ, PID, NlMsgType::RTM_GETLINK))
            .await
            .unwrap();
        let err = session.request(getlink(), |_| Ok(())).await.unwrap_err();
        assert_eq!(err.errno(), Some(libc::ENOENT));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_ack_is_success() {
        let (mut session, kernel) = session();
        kernel
            .send(fixtures::error(0, SEQ, PID, NlMsgType::RTM_NEWADDR))
            .await
            .unwrap();
        let mut calls = 0;
        session
            .request(getlink(), |_| {
                calls += 1;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_mismatch_never_reaches_handler() {
        let (mut session, kernel) = session();
        kernel
            .send(fixtures::frame(
                NlMsgType::RTM_NEWLINK,
                0,
                SEQ + 5,
                PID,
                &fixtures::link_loopback()[16..],
            ))
            .await
            .unwrap();
        let mut calls = 0;
        let err = session
            .request(getlink(), |_| {
                calls += 1;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ProtocolMismatch {
                expected_seq: 1,
                actual_seq: 6,
                ..
            }
        ));
        assert!(err.is_fatal());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_malformed_length() {
        let (mut session, kernel) = session();
        let mut bad = fixtures::link_loopback();
        bad[0..4].copy_from_slice(&8u32.to_ne_bytes());
        kernel.send(bad).await.unwrap();
        let err = session.request(getlink(), |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, Error::MalformedFrame(_)));
    }

    #[tokio::test]
    async fn test_closed_transport() {
        let (mut session, kernel) = session();
        drop(kernel);
        let err = session.request(getlink(), |_| Ok(())).await.unwrap_err();
        assert!(err.is_closed());
    }

    #[tokio::test]
    async fn test_handler_error_skips_rest_of_reply() {
        let (mut session, kernel) = session();
        let mut first = fixtures::link_loopback();
        first.extend(fixtures::link_loopback());
        first.extend(fixtures::done(SEQ, PID));
        kernel.send(first).await.unwrap();
        kernel.send(fixtures::done(SEQ + 1, PID)).await.unwrap();

        let err = session
            .request(getlink(), |_| Err(Error::InvalidMessage("stop".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(_)));

        // The second request does not trip over the first one's leftovers.
        session.request(getlink(), |_| Ok(())).await.unwrap();
    }

    #[tokio::test]
    async fn test_multiplexed_session_queues_notifications() {
        let config = SocketConfig::new().group_mask(1);
        let (transport, kernel) = ChannelTransport::pair(PID, &config);
        let mut session = Session::new(transport);

        let mut data = fixtures::frame(
            NlMsgType::RTM_NEWLINK,
            0,
            0,
            0,
            &fixtures::link_loopback()[16..],
        );
        data.extend(fixtures::link_loopback());
        data.extend(fixtures::done(SEQ, PID));
        kernel.send(data).await.unwrap();

        let links: Vec<LinkMessage> = session.dump_with(getlink()).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(session.queued_notifications(), 1);

        let note = session.next_notification().await.unwrap().unwrap();
        let header = NlMsgHdr::from_bytes(&note).unwrap();
        assert_eq!(header.nlmsg_pid, 0);

        drop(kernel);
        assert!(session.next_notification().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seq_skips_zero() {
        let (mut session, _kernel) = session();
        session.seq = u32::MAX;
        assert_eq!(session.next_seq(), 1);
    }

    #[tokio::test]
    async fn test_namespace_tracked() {
        let config = SocketConfig::new().all_nsid(true);
        let (transport, kernel) = ChannelTransport::pair(PID, &config);
        let mut session = Session::new(transport);
        kernel.send_from(4, fixtures::done(SEQ, PID)).await.unwrap();
        session.request(getlink(), |_| Ok(())).await.unwrap();
        assert_eq!(session.current_nsid(), Some(4));
    }
}
