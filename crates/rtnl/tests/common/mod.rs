//! Common test utilities for integration tests.
//!
//! Provides a scripted kernel for [`ChannelTransport`] sessions and
//! builders for the frames it answers with.

use std::io::{self, Write};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use rtnl::netlink::message::{NLM_F_MULTI, NlMsgError, NlMsgHdr, NlMsgType};
use rtnl::netlink::messages::{AddressAttr, LinkAttr};
use rtnl::netlink::parse::ip_addr_bytes;
use rtnl::netlink::types::addr::IfAddrMsg;
use rtnl::netlink::types::family;
use rtnl::netlink::types::link::IfInfoMsg;
use rtnl::netlink::{AttrIndex, ChannelTransport, KernelEnd, MessageBuilder, Session, SocketConfig};
use tokio::task::JoinHandle;

/// Port id of the session under test.
pub const PID: u32 = 4242;

/// Assert that a result failed with a kernel rejection carrying `errno`.
macro_rules! assert_rejected {
    ($result:expr, $errno:expr) => {
        match $result {
            Err(e) => assert_eq!(e.errno(), Some($errno), "unexpected error: {e}"),
            Ok(v) => panic!("expected errno {}, got Ok({:?})", $errno, v),
        }
    };
}

/// Open a session whose kernel answers with `reply`.
///
/// `reply` sees each request and returns the datagrams to deliver, in
/// order. Returning an empty list leaves the request unanswered.
pub fn scripted<F>(reply: F) -> (Session<ChannelTransport>, JoinHandle<()>)
where
    F: FnMut(&NlMsgHdr, &[u8]) -> Vec<Vec<u8>> + Send + 'static,
{
    scripted_with(&SocketConfig::default(), reply)
}

pub fn scripted_with<F>(
    config: &SocketConfig,
    mut reply: F,
) -> (Session<ChannelTransport>, JoinHandle<()>)
where
    F: FnMut(&NlMsgHdr, &[u8]) -> Vec<Vec<u8>> + Send + 'static,
{
    let (transport, kernel) = ChannelTransport::pair(PID, config);
    let task = tokio::spawn(async move {
        serve(kernel, &mut reply).await;
    });
    (Session::new(transport), task)
}

async fn serve<F>(mut kernel: KernelEnd, reply: &mut F)
where
    F: FnMut(&NlMsgHdr, &[u8]) -> Vec<Vec<u8>>,
{
    while let Some(request) = kernel.recv_request().await {
        let Ok(header) = NlMsgHdr::from_bytes(&request) else {
            break;
        };
        for datagram in reply(&header, &request) {
            if kernel.send(datagram).await.is_err() {
                return;
            }
        }
    }
}

/// Join frames into one datagram.
pub fn datagram(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for frame in frames {
        out.extend_from_slice(frame);
        out.resize(out.len().next_multiple_of(4), 0);
    }
    out
}

fn stamp(mut builder: MessageBuilder, seq: u32, pid: u32) -> Vec<u8> {
    builder.set_seq(seq);
    builder.set_pid(pid);
    builder.finish().unwrap()
}

/// One RTM_NEWLINK dump entry.
pub fn link(seq: u32, index: i32, name: &str, flags: u32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_MULTI)
        .payload(&IfInfoMsg::new().with_index(index).with_flags(flags, 0));
    builder.append_attr_str(LinkAttr::Ifname.kind(), name);
    builder.append_attr_u32(LinkAttr::Mtu.kind(), 1500);
    stamp(builder, seq, PID)
}

/// One RTM_NEWADDR dump entry.
pub fn address(seq: u32, ifindex: u32, addr: IpAddr, prefix_len: u8) -> Vec<u8> {
    let fam = match addr {
        IpAddr::V4(_) => family::AF_INET,
        IpAddr::V6(_) => family::AF_INET6,
    };
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWADDR, NLM_F_MULTI).payload(
        &IfAddrMsg::new()
            .with_family(fam)
            .with_index(ifindex)
            .with_prefixlen(prefix_len),
    );
    let bytes = ip_addr_bytes(&addr);
    builder.append_attr(AddressAttr::Address.kind(), &bytes);
    builder.append_attr(AddressAttr::Local.kind(), &bytes);
    stamp(builder, seq, PID)
}

pub fn done(seq: u32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::DONE, NLM_F_MULTI);
    builder.append_bytes(&0i32.to_ne_bytes());
    stamp(builder, seq, PID)
}

/// An ERROR frame answering `request`. `errno` is positive; 0 is an ACK.
pub fn error(request: &NlMsgHdr, errno: i32) -> Vec<u8> {
    let payload = NlMsgError {
        error: -errno,
        msg: *request,
    };
    let builder = MessageBuilder::new(NlMsgType::ERROR, 0).payload(&payload);
    stamp(builder, request.nlmsg_seq, request.nlmsg_pid)
}

/// A frame as multicast by the kernel (port id 0).
pub fn notification(mut frame: Vec<u8>) -> Vec<u8> {
    frame[8..12].copy_from_slice(&0u32.to_ne_bytes());
    frame[12..16].copy_from_slice(&0u32.to_ne_bytes());
    frame
}

/// Change the message type of a built frame.
pub fn retype(mut frame: Vec<u8>, msg_type: u16) -> Vec<u8> {
    frame[4..6].copy_from_slice(&msg_type.to_ne_bytes());
    frame
}

/// A cloneable in-memory sink for capture files.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
