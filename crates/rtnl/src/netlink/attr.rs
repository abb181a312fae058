//! Netlink attribute (rtattr) codec.
//!
//! Attributes are `(len: u16, type: u16)` headers followed by the value,
//! padded to [`NLA_ALIGNTO`]. The length field counts the header and the
//! unpadded value, never the padding.

use std::collections::BTreeMap;
use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::error::{Error, Result};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Largest attribute, header included, that `nla_len` can describe.
pub const NLA_MAX_LEN: usize = u16::MAX as usize;

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Attribute header (struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header, excluding padding.
    pub nla_len: u16,
    /// Attribute type, possibly carrying NLA_F_* flags.
    pub nla_type: u16,
}

impl NlAttr {
    /// Create a new attribute header.
    ///
    /// Callers check [`NlAttr::check_len`] first; a longer value would not
    /// fit the 16-bit length.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        debug_assert!(NLA_HDRLEN + data_len <= NLA_MAX_LEN, "attribute too long");
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Reject a value whose attribute would overflow `nla_len`.
    pub fn check_len(attr_type: u16, data_len: usize) -> Result<()> {
        if NLA_HDRLEN + data_len > NLA_MAX_LEN {
            return Err(Error::InvalidAttribute(format!(
                "attribute {} is {} bytes, more than {}",
                attr_type & NLA_TYPE_MASK,
                NLA_HDRLEN + data_len,
                NLA_MAX_LEN
            )));
        }
        Ok(())
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Parse from the front of a buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(hdr, _)| hdr)
            .map_err(|_| Error::Truncated {
                expected: NLA_HDRLEN,
                actual: data.len(),
            })
    }
}

/// One attribute as found on the wire, borrowing its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttr<'a> {
    /// Type including NLA_F_* flags.
    pub ty: u16,
    /// Unpadded value.
    pub value: &'a [u8],
}

impl RawAttr<'_> {
    /// Attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.ty & NLA_TYPE_MASK
    }

    /// Check if the nested flag is set.
    pub fn is_nested(&self) -> bool {
        self.ty & NLA_F_NESTED != 0
    }
}

/// Iterator over the attributes of a buffer.
///
/// Iteration ends quietly once fewer than [`NLA_HDRLEN`] bytes remain, which
/// absorbs kernel trailing padding. A header whose declared length runs past
/// the buffer yields [`Error::Truncated`] and ends the iteration.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Check if there are no more attributes.
    pub fn is_empty(&self) -> bool {
        self.data.len() < NLA_HDRLEN
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = Result<RawAttr<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }

        let hdr = match NlAttr::from_bytes(self.data) {
            Ok(hdr) => hdr,
            Err(e) => {
                self.data = &[];
                return Some(Err(e));
            }
        };

        let len = hdr.nla_len as usize;
        if len < NLA_HDRLEN {
            self.data = &[];
            return Some(Err(Error::InvalidAttribute(format!(
                "attribute {} declares length {len}",
                hdr.kind()
            ))));
        }
        if len > self.data.len() {
            let actual = self.data.len();
            self.data = &[];
            return Some(Err(Error::Truncated {
                expected: len,
                actual,
            }));
        }

        let value = &self.data[NLA_HDRLEN..len];
        self.data = &self.data[nla_align(len).min(self.data.len())..];

        Some(Ok(RawAttr {
            ty: hdr.nla_type,
            value,
        }))
    }
}

/// A compact attribute index mapped from the kernel's sparse constants.
pub trait AttrIndex: Copy + Ord + fmt::Debug {
    /// Map a kernel attribute type (flags stripped) to an index.
    fn from_kind(kind: u16) -> Option<Self>;

    /// The kernel attribute type for this index.
    fn kind(self) -> u16;
}

/// Declare an [`AttrIndex`] enum and its mapping to kernel constants.
macro_rules! attr_index {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $kind:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::netlink::attr::AttrIndex for $name {
            fn from_kind(kind: u16) -> Option<Self> {
                $(if kind == $kind {
                    return Some(Self::$variant);
                })+
                None
            }

            fn kind(self) -> u16 {
                match self {
                    $(Self::$variant => $kind),+
                }
            }
        }
    };
}
pub(crate) use attr_index;

/// Decoded attributes keyed by an enumerated attribute type.
///
/// When one message carries the same attribute type twice, the later value
/// replaces the earlier one. Whether the kernel ever does this is not
/// settled, so replacements are counted and exposed through
/// [`AttrMap::overwritten`] instead of being assumed impossible. Types with
/// no index variant are kept in arrival order in [`AttrMap::unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMap<K: AttrIndex> {
    entries: BTreeMap<K, Vec<u8>>,
    unknown: Vec<(u16, Vec<u8>)>,
    overwritten: usize,
}

impl<K: AttrIndex> Default for AttrMap<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            unknown: Vec::new(),
            overwritten: 0,
        }
    }
}

impl<K: AttrIndex> AttrMap<K> {
    /// Decode an attribute block.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut map = Self::default();
        for attr in AttrIter::new(data) {
            let attr = attr?;
            match K::from_kind(attr.kind()) {
                Some(key) => map.insert(key, attr.value.to_vec()),
                None => map.unknown.push((attr.kind(), attr.value.to_vec())),
            }
        }
        Ok(map)
    }

    /// Store a value, replacing any previous value for the same key.
    pub fn insert(&mut self, key: K, value: Vec<u8>) {
        if self.entries.insert(key, value).is_some() {
            self.overwritten += 1;
        }
    }

    /// Raw value of an attribute.
    pub fn get(&self, key: K) -> Option<&[u8]> {
        self.entries.get(&key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unknown.is_empty()
    }

    /// Known attributes in index order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &[u8])> {
        self.entries.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Attributes whose type has no index variant.
    pub fn unknown(&self) -> &[(u16, Vec<u8>)] {
        &self.unknown
    }

    /// Number of values replaced by a later duplicate.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    pub fn u8(&self, key: K) -> Option<u8> {
        self.get(key).and_then(|v| get::u8(v).ok())
    }

    pub fn u16(&self, key: K) -> Option<u16> {
        self.get(key).and_then(|v| get::u16_ne(v).ok())
    }

    pub fn u32(&self, key: K) -> Option<u32> {
        self.get(key).and_then(|v| get::u32_ne(v).ok())
    }

    pub fn i32(&self, key: K) -> Option<i32> {
        self.get(key).and_then(|v| get::i32_ne(v).ok())
    }

    pub fn u64(&self, key: K) -> Option<u64> {
        self.get(key).and_then(|v| get::u64_ne(v).ok())
    }

    /// A null-terminated string value.
    pub fn string(&self, key: K) -> Option<String> {
        self.get(key)
            .and_then(|v| get::string(v).ok())
            .map(str::to_owned)
    }

    /// Decode a nested attribute block with its own index space.
    pub fn nested<N: AttrIndex>(&self, key: K) -> Result<Option<AttrMap<N>>> {
        self.get(key).map(AttrMap::parse).transpose()
    }
}

/// An attribute value to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    /// u16 in network byte order.
    Be16(u16),
    /// u32 in network byte order.
    Be32(u32),
    /// String written with a trailing NUL.
    Str(String),
    Bytes(Vec<u8>),
    /// Zero-length flag attribute.
    Flag,
    /// Nested attribute list, encoded with NLA_F_NESTED.
    Nested(Vec<Attr>),
}

/// One attribute to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub kind: u16,
    pub value: AttrValue,
}

impl Attr {
    pub fn new(kind: u16, value: AttrValue) -> Self {
        Self { kind, value }
    }

    /// Unpadded value length.
    pub fn value_len(&self) -> usize {
        match &self.value {
            AttrValue::U8(_) => 1,
            AttrValue::U16(_) | AttrValue::Be16(_) => 2,
            AttrValue::U32(_) | AttrValue::I32(_) | AttrValue::Be32(_) => 4,
            AttrValue::U64(_) => 8,
            AttrValue::Str(s) => s.len() + 1,
            AttrValue::Bytes(b) => b.len(),
            AttrValue::Flag => 0,
            AttrValue::Nested(attrs) => attrs.iter().map(Attr::encoded_len).sum(),
        }
    }

    /// Length on the wire including padding.
    pub fn encoded_len(&self) -> usize {
        nla_align(NLA_HDRLEN + self.value_len())
    }

    /// Append this attribute to `out`, padded to [`NLA_ALIGNTO`].
    pub fn encode(&self, out: &mut Vec<u8>) {
        let ty = match self.value {
            AttrValue::Nested(_) => self.kind | NLA_F_NESTED,
            _ => self.kind,
        };
        out.extend_from_slice(NlAttr::new(ty, self.value_len()).as_bytes());

        match &self.value {
            AttrValue::U8(v) => out.push(*v),
            AttrValue::U16(v) => out.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::U32(v) => out.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::U64(v) => out.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::I32(v) => out.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::Be16(v) => out.extend_from_slice(&v.to_be_bytes()),
            AttrValue::Be32(v) => out.extend_from_slice(&v.to_be_bytes()),
            AttrValue::Str(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            AttrValue::Bytes(b) => out.extend_from_slice(b),
            AttrValue::Flag => {}
            AttrValue::Nested(attrs) => encode_attrs(attrs, out),
        }

        out.resize(nla_align(out.len()), 0);
    }
}

/// Encode an ordered attribute list.
pub fn encode_attrs(attrs: &[Attr], out: &mut Vec<u8>) {
    for attr in attrs {
        attr.encode(out);
    }
}

/// Attributes in arrival order, types kept with their flags.
///
/// Unlike [`AttrMap`] this keeps duplicates and unknown types, so encoding
/// it reproduces the block it was decoded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrList(pub Vec<(u16, Vec<u8>)>);

impl AttrList {
    pub fn parse(data: &[u8]) -> Result<Self> {
        AttrIter::new(data)
            .map(|attr| attr.map(|a| (a.ty, a.value.to_vec())))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        for (ty, value) in &self.0 {
            out.extend_from_slice(NlAttr::new(*ty, value.len()).as_bytes());
            out.extend_from_slice(value);
            out.resize(nla_align(out.len()), 0);
        }
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        data.first()
            .copied()
            .ok_or_else(|| Error::InvalidAttribute("empty u8 attribute".into()))
    }

    fn array<const N: usize>(data: &[u8], what: &str) -> Result<[u8; N]> {
        data.get(..N)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::InvalidAttribute(format!("truncated {what} attribute")))
    }

    /// Extract a u16 value (native endian).
    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        array(data, "u16").map(u16::from_ne_bytes)
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        array(data, "u32").map(u32::from_ne_bytes)
    }

    /// Extract a u64 value (native endian).
    pub fn u64_ne(data: &[u8]) -> Result<u64> {
        array(data, "u64").map(u64::from_ne_bytes)
    }

    /// Extract an i32 value (native endian).
    pub fn i32_ne(data: &[u8]) -> Result<i32> {
        array(data, "i32").map(i32::from_ne_bytes)
    }

    /// Extract a u16 value (network order).
    pub fn u16_be(data: &[u8]) -> Result<u16> {
        array(data, "u16").map(u16::from_be_bytes)
    }

    /// Extract a u32 value (network order).
    pub fn u32_be(data: &[u8]) -> Result<u32> {
        array(data, "u32").map(u32::from_be_bytes)
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }
}
