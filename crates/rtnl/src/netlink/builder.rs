//! Message builder for constructing netlink requests.
//!
//! The header is written first as a placeholder; its length field is only
//! patched in [`MessageBuilder::finish`], once the attributes are encoded.
//! An attribute too long for its 16-bit length is left out and reported by
//! `finish`.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{Attr, NLA_F_NESTED, NLA_HDRLEN, NlAttr, encode_attrs, nla_align};
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Token returned when starting a nested attribute.
#[derive(Debug, Clone, Copy)]
pub struct NestToken {
    offset: usize,
}

/// Builder for constructing netlink messages.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
    /// Type and value length of the first attribute that did not fit.
    oversized: Option<(u16, usize)>,
}

impl MessageBuilder {
    /// Create a new message builder with the given type and flags.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let header = NlMsgHdr::new(msg_type, flags);
        Self {
            buf: header.as_bytes().to_vec(),
            oversized: None,
        }
    }

    pub fn msg_type(&self) -> u16 {
        u16::from_ne_bytes([self.buf[4], self.buf[5]])
    }

    pub fn flags(&self) -> u16 {
        u16::from_ne_bytes([self.buf[6], self.buf[7]])
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// Append raw bytes, padded to message alignment.
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.buf.resize(nlmsg_align(self.buf.len()), 0);
    }

    /// Append a fixed-size typed payload.
    pub fn append<T: IntoBytes + Immutable>(&mut self, payload: &T) {
        self.append_bytes(payload.as_bytes());
    }

    /// Builder-style variant of [`append`](Self::append).
    pub fn payload<T: IntoBytes + Immutable>(mut self, payload: &T) -> Self {
        self.append(payload);
        self
    }

    /// Append an attribute with the given type and data.
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) {
        if !self.fits(attr_type, data.len()) {
            return;
        }
        let attr = NlAttr::new(attr_type, data.len());
        self.buf.extend_from_slice(attr.as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.resize(nla_align(self.buf.len()), 0);
    }

    /// Append an empty (flag) attribute.
    pub fn append_attr_empty(&mut self, attr_type: u16) {
        self.append_attr(attr_type, &[]);
    }

    pub fn append_attr_u8(&mut self, attr_type: u16, value: u8) {
        self.append_attr(attr_type, &[value]);
    }

    pub fn append_attr_u16(&mut self, attr_type: u16, value: u16) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    pub fn append_attr_i32(&mut self, attr_type: u16, value: i32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append a null-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        self.append_attr(attr_type, &data);
    }

    /// Append an ordered attribute list.
    pub fn append_attrs(&mut self, attrs: &[Attr]) {
        for attr in attrs {
            if !self.fits(attr.kind, attr.value_len()) {
                return;
            }
        }
        encode_attrs(attrs, &mut self.buf);
    }

    /// Builder-style variant of [`append_attrs`](Self::append_attrs).
    pub fn attrs(mut self, attrs: &[Attr]) -> Self {
        self.append_attrs(attrs);
        self
    }

    /// Start a nested attribute. Returns a token to finalize it.
    pub fn nest_start(&mut self, attr_type: u16) -> NestToken {
        let offset = self.buf.len();
        let attr = NlAttr::new(attr_type | NLA_F_NESTED, 0);
        self.buf.extend_from_slice(attr.as_bytes());
        NestToken { offset }
    }

    /// End a nested attribute started with `nest_start`.
    ///
    /// A nest that outgrew its length is dropped along with its contents.
    pub fn nest_end(&mut self, token: NestToken) {
        let len = self.buf.len() - token.offset;
        let at = token.offset + 2;
        let attr_type = u16::from_ne_bytes([self.buf[at], self.buf[at + 1]]);
        if !self.fits(attr_type, len - NLA_HDRLEN) {
            self.buf.truncate(token.offset);
            return;
        }
        self.buf[token.offset..token.offset + 2].copy_from_slice(&(len as u16).to_ne_bytes());
        self.buf.resize(nla_align(self.buf.len()), 0);
    }

    fn fits(&mut self, attr_type: u16, data_len: usize) -> bool {
        if NlAttr::check_len(attr_type, data_len).is_ok() {
            return true;
        }
        self.oversized.get_or_insert((attr_type, data_len));
        false
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        self.buf[8..12].copy_from_slice(&seq.to_ne_bytes());
    }

    /// Set the port ID.
    pub fn set_pid(&mut self, pid: u32) {
        self.buf[12..16].copy_from_slice(&pid.to_ne_bytes());
    }

    /// Patch the length field and return the message bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if let Some((attr_type, data_len)) = self.oversized {
            NlAttr::check_len(attr_type, data_len)?;
        }
        let len = u32::try_from(self.buf.len())
            .map_err(|_| Error::InvalidMessage(format!("{} bytes", self.buf.len())))?;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        Ok(self.buf)
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}
