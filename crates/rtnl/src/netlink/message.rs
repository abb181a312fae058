//! Netlink message header, framing and multi-message splitting.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::attr::{AttrIter, AttrList};
use super::error::{Error, Result};

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Netlink message header (struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type.
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Check if this is an error message.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    /// Check if this is a done message.
    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Check if this message has the multi flag.
    pub fn is_multi(&self) -> bool {
        self.nlmsg_flags & NLM_F_MULTI != 0
    }

    /// Parse header from the front of a buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(hdr, _)| hdr)
            .map_err(|_| Error::Truncated {
                expected: NLMSG_HDRLEN,
                actual: data.len(),
            })
    }
}

/// Netlink and routing netlink message types.
pub struct NlMsgType;

impl NlMsgType {
    /// No operation, message must be discarded.
    pub const NOOP: u16 = 1;
    /// Error message or ACK.
    pub const ERROR: u16 = 2;
    /// End of multipart message.
    pub const DONE: u16 = 3;
    /// Data lost, request resend.
    pub const OVERRUN: u16 = 4;

    /// Local capture-file namespace marker. Never sent to the kernel.
    pub const NSID_MARK: u16 = 14;
    /// Local capture-file timestamp record. Never sent to the kernel.
    pub const TSTAMP: u16 = 15;

    /// Smallest type the kernel uses for protocol messages.
    pub const MIN_TYPE: u16 = 16;

    pub const RTM_NEWLINK: u16 = 16;
    pub const RTM_DELLINK: u16 = 17;
    pub const RTM_GETLINK: u16 = 18;
    pub const RTM_SETLINK: u16 = 19;

    pub const RTM_NEWADDR: u16 = 20;
    pub const RTM_DELADDR: u16 = 21;
    pub const RTM_GETADDR: u16 = 22;

    pub const RTM_NEWROUTE: u16 = 24;
    pub const RTM_DELROUTE: u16 = 25;
    pub const RTM_GETROUTE: u16 = 26;

    pub const RTM_NEWNEIGH: u16 = 28;
    pub const RTM_DELNEIGH: u16 = 29;
    pub const RTM_GETNEIGH: u16 = 30;

    pub const RTM_NEWRULE: u16 = 32;
    pub const RTM_DELRULE: u16 = 33;
    pub const RTM_GETRULE: u16 = 34;

    pub const RTM_NEWPREFIX: u16 = 52;

    pub const RTM_NEWADDRLABEL: u16 = 72;
    pub const RTM_DELADDRLABEL: u16 = 73;
    pub const RTM_GETADDRLABEL: u16 = 74;

    pub const RTM_NEWNETCONF: u16 = 80;
    pub const RTM_DELNETCONF: u16 = 81;
    pub const RTM_GETNETCONF: u16 = 82;

    pub const RTM_NEWNSID: u16 = 88;
    pub const RTM_DELNSID: u16 = 89;
    pub const RTM_GETNSID: u16 = 90;

    /// Name of a message type as iproute2 spells it.
    pub fn name(msg_type: u16) -> Option<&'static str> {
        Some(match msg_type {
            Self::NOOP => "NLMSG_NOOP",
            Self::ERROR => "NLMSG_ERROR",
            Self::DONE => "NLMSG_DONE",
            Self::OVERRUN => "NLMSG_OVERRUN",
            Self::NSID_MARK => "NLMSG_NSID",
            Self::TSTAMP => "NLMSG_TSTAMP",
            Self::RTM_NEWLINK => "RTM_NEWLINK",
            Self::RTM_DELLINK => "RTM_DELLINK",
            Self::RTM_GETLINK => "RTM_GETLINK",
            Self::RTM_SETLINK => "RTM_SETLINK",
            Self::RTM_NEWADDR => "RTM_NEWADDR",
            Self::RTM_DELADDR => "RTM_DELADDR",
            Self::RTM_GETADDR => "RTM_GETADDR",
            Self::RTM_NEWROUTE => "RTM_NEWROUTE",
            Self::RTM_DELROUTE => "RTM_DELROUTE",
            Self::RTM_GETROUTE => "RTM_GETROUTE",
            Self::RTM_NEWNEIGH => "RTM_NEWNEIGH",
            Self::RTM_DELNEIGH => "RTM_DELNEIGH",
            Self::RTM_GETNEIGH => "RTM_GETNEIGH",
            Self::RTM_NEWRULE => "RTM_NEWRULE",
            Self::RTM_DELRULE => "RTM_DELRULE",
            Self::RTM_GETRULE => "RTM_GETRULE",
            Self::RTM_NEWPREFIX => "RTM_NEWPREFIX",
            Self::RTM_NEWADDRLABEL => "RTM_NEWADDRLABEL",
            Self::RTM_DELADDRLABEL => "RTM_DELADDRLABEL",
            Self::RTM_GETADDRLABEL => "RTM_GETADDRLABEL",
            Self::RTM_NEWNETCONF => "RTM_NEWNETCONF",
            Self::RTM_DELNETCONF => "RTM_DELNETCONF",
            Self::RTM_GETNETCONF => "RTM_GETNETCONF",
            Self::RTM_NEWNSID => "RTM_NEWNSID",
            Self::RTM_DELNSID => "RTM_DELNSID",
            Self::RTM_GETNSID => "RTM_GETNSID",
            _ => return None,
        })
    }
}

/// Netlink message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_ACK: u16 = 0x04;
pub const NLM_F_ECHO: u16 = 0x08;
pub const NLM_F_DUMP_INTR: u16 = 0x10;

// Modifiers to GET request
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_ATOMIC: u16 = 0x400;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

// Modifiers to NEW request
pub const NLM_F_REPLACE: u16 = 0x100;
pub const NLM_F_EXCL: u16 = 0x200;
pub const NLM_F_CREATE: u16 = 0x400;
pub const NLM_F_APPEND: u16 = 0x800;

/// Split one frame off the front of `data`.
///
/// Returns `Ok(None)` once fewer than [`NLMSG_HDRLEN`] bytes remain. On
/// success yields the frame (exactly `nlmsg_len` bytes) and the rest of the
/// buffer past the frame's alignment padding.
pub fn pop(data: &[u8]) -> Result<Option<(&[u8], &[u8])>> {
    if data.len() < NLMSG_HDRLEN {
        return Ok(None);
    }
    let header = NlMsgHdr::from_bytes(data)?;
    let len = header.nlmsg_len as usize;
    if len < NLMSG_HDRLEN {
        return Err(Error::MalformedFrame(format!(
            "length {len} is smaller than the header"
        )));
    }
    if len > data.len() {
        return Err(Error::Truncated {
            expected: len,
            actual: data.len(),
        });
    }
    let next = nlmsg_align(len).min(data.len());
    Ok(Some((&data[..len], &data[next..])))
}

/// Iterator over the frames of a buffer holding several concatenated messages.
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    /// Create a new message iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match pop(self.data) {
            Ok(Some((frame, rest))) => {
                self.data = rest;
                Some(Frame::parse(frame))
            }
            Ok(None) => None,
            Err(e) => {
                self.data = &[];
                Some(Err(e))
            }
        }
    }
}

/// A borrowed view of one complete message.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub header: NlMsgHdr,
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    /// View `bytes` as one frame. The length field must match exactly.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let header = NlMsgHdr::from_bytes(bytes)?;
        if header.nlmsg_len as usize != bytes.len() {
            return Err(Error::MalformedFrame(format!(
                "header says {} bytes, frame has {}",
                header.nlmsg_len,
                bytes.len()
            )));
        }
        Ok(Self { header, bytes })
    }

    /// The whole frame including header.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }

    /// Everything after the header.
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[NLMSG_HDRLEN..]
    }

    /// Decode the fixed typed payload at the start of the message body.
    pub fn typed<T: FromBytes>(&self) -> Result<T> {
        let payload = self.payload();
        T::read_from_prefix(payload)
            .map(|(v, _)| v)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<T>(),
                actual: payload.len(),
            })
    }

    /// The attribute block following a typed payload of type `T`.
    pub fn attrs_after<T>(&self) -> &'a [u8] {
        let payload = self.payload();
        let offset = nlmsg_align(std::mem::size_of::<T>()).min(payload.len());
        &payload[offset..]
    }

    /// The ERROR payload, if this is an error frame.
    pub fn error(&self) -> Option<Result<NlMsgError>> {
        self.header.is_error().then(|| self.typed::<NlMsgError>())
    }
}

/// Netlink error message payload (struct nlmsgerr).
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Error code (negative errno or 0 for ACK).
    pub error: i32,
    /// Header of the request that caused the error.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    /// Check if this is an ACK (no error).
    pub fn is_ack(&self) -> bool {
        self.error == 0
    }

    /// Extended ACK attributes following the echoed request header.
    pub fn ext_attrs<'a>(&self, payload: &'a [u8]) -> AttrIter<'a> {
        let offset = std::mem::size_of::<Self>();
        AttrIter::new(payload.get(offset..).unwrap_or(&[]))
    }
}

/// An owned, decoded message: header, fixed payload and attribute block.
///
/// The fixed payload size comes from the message type; types without a known
/// payload keep the whole body as payload and no attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: NlMsgHdr,
    pub payload: Vec<u8>,
    pub attrs: AttrList,
}

impl Message {
    /// Decode one frame.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let frame = Frame::parse(bytes)?;
        let body = frame.payload();
        match super::types::payload_size(frame.msg_type()) {
            Some(size) if size <= body.len() => {
                let attrs_at = nlmsg_align(size).min(body.len());
                Ok(Self {
                    header: frame.header,
                    payload: body[..size].to_vec(),
                    attrs: AttrList::parse(&body[attrs_at..])?,
                })
            }
            Some(size) => Err(Error::Truncated {
                expected: NLMSG_HDRLEN + size,
                actual: bytes.len(),
            }),
            None => Ok(Self {
                header: frame.header,
                payload: body.to_vec(),
                attrs: AttrList::default(),
            }),
        }
    }

    /// Serialize, recomputing the header length.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.nlmsg_len as usize);
        out.extend_from_slice(self.header.as_bytes());
        out.extend_from_slice(&self.payload);
        if !self.attrs.0.is_empty() {
            out.resize(nlmsg_align(out.len()), 0);
            self.attrs.encode(&mut out);
        }
        let len = (out.len() as u32).to_ne_bytes();
        out[..4].copy_from_slice(&len);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;

    #[test]
    fn test_header_layout() {
        assert_eq!(std::mem::size_of::<NlMsgHdr>(), 16);
        assert_eq!(std::mem::size_of::<NlMsgError>(), 20);
        let hdr = NlMsgHdr {
            nlmsg_len: 0x20,
            nlmsg_type: 18,
            nlmsg_flags: NLM_F_REQUEST | NLM_F_DUMP,
            nlmsg_seq: 7,
            nlmsg_pid: 99,
        };
        let mut expected = Vec::new();
        expected.extend_from_slice(&0x20u32.to_ne_bytes());
        expected.extend_from_slice(&18u16.to_ne_bytes());
        expected.extend_from_slice(&0x301u16.to_ne_bytes());
        expected.extend_from_slice(&7u32.to_ne_bytes());
        expected.extend_from_slice(&99u32.to_ne_bytes());
        assert_eq!(hdr.as_bytes(), expected.as_slice());
        assert_eq!(NlMsgHdr::from_bytes(&expected).unwrap(), hdr);
    }

    #[test]
    fn test_pop_many() {
        let mut buf = fixtures::link_loopback();
        buf.extend(fixtures::addr_loopback_v4());
        buf.extend(fixtures::done(1, 100));

        let types: Vec<u16> = MessageIter::new(&buf)
            .map(|f| f.unwrap().msg_type())
            .collect();
        assert_eq!(
            types,
            [NlMsgType::RTM_NEWLINK, NlMsgType::RTM_NEWADDR, NlMsgType::DONE]
        );
    }

    #[test]
    fn test_pop_stops_below_header() {
        let mut buf = fixtures::done(1, 1);
        buf.extend_from_slice(&[0; 8]);
        let (_, rest) = pop(&buf).unwrap().unwrap();
        assert_eq!(rest.len(), 8);
        assert!(pop(rest).unwrap().is_none());
    }

    #[test]
    fn test_pop_truncated() {
        let buf = fixtures::link_loopback();
        let short = &buf[..buf.len() - 4];
        assert!(matches!(
            pop(short),
            Err(Error::Truncated { expected, actual }) if expected == buf.len() && actual == buf.len() - 4
        ));
    }

    #[test]
    fn test_pop_rejects_length_below_header() {
        let mut buf = fixtures::done(1, 1);
        buf[..4].copy_from_slice(&8u32.to_ne_bytes());
        assert!(matches!(pop(&buf), Err(Error::MalformedFrame(_))));
    }

    #[test]
    fn test_frame_length_must_match() {
        let mut buf = fixtures::done(1, 1);
        buf.extend_from_slice(&[0; 4]);
        assert!(matches!(Frame::parse(&buf), Err(Error::MalformedFrame(_))));
    }

    #[test]
    fn test_error_payload() {
        let buf = fixtures::error(-2, 5, 42, NlMsgType::RTM_DELADDR);
        let frame = Frame::parse(&buf).unwrap();
        let err = frame.error().unwrap().unwrap();
        assert_eq!(err.error, -2);
        assert!(!err.is_ack());
        assert_eq!(err.msg.nlmsg_type, NlMsgType::RTM_DELADDR);
        assert_eq!(err.msg.nlmsg_seq, 5);
    }

    #[test]
    fn test_decode_encode_identity_on_captured_frames() {
        for bytes in [
            fixtures::link_loopback(),
            fixtures::addr_loopback_v4(),
            fixtures::addr_loopback_v6(),
            fixtures::route_default_v4(),
            fixtures::neighbor_arp(),
            fixtures::rule_main(),
            fixtures::nsid_new(3, 1234),
            fixtures::netconf_v4(2),
            fixtures::done(9, 100),
            fixtures::error(-2, 5, 42, NlMsgType::RTM_DELADDR),
        ] {
            let msg = Message::decode(&bytes).unwrap();
            assert_eq!(msg.encode(), bytes);
        }
    }

    #[test]
    fn test_bare_payload_keeps_its_padding() {
        // one-byte kernel headers are declared with their pad bytes
        for msg_type in [NlMsgType::RTM_NEWNETCONF, NlMsgType::RTM_NEWNSID] {
            let mut bare = NlMsgHdr::new(msg_type, 0).as_bytes().to_vec();
            bare.extend_from_slice(&[libc::AF_INET as u8, 0, 0, 0]);
            bare[0..4].copy_from_slice(&20u32.to_ne_bytes());

            let msg = Message::decode(&bare).unwrap();
            assert_eq!(msg.payload.len(), 4);
            assert!(msg.attrs.0.is_empty());
            assert_eq!(msg.encode(), bare);
        }
    }

    #[test]
    fn test_frames_are_aligned() {
        for bytes in [
            fixtures::link_loopback(),
            fixtures::addr_loopback_v6(),
            fixtures::route_default_v4(),
        ] {
            assert_eq!(bytes.len() % NLMSG_ALIGNTO, 0);
            let frame = Frame::parse(&bytes).unwrap();
            assert_eq!(frame.header.nlmsg_len as usize, bytes.len());
        }
    }
}
