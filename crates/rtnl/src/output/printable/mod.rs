//! [`Printable`](super::Printable) implementations for each record kind.

mod address;
mod addrlabel;
mod link;
mod neighbor;
mod netconf;
mod nsid;
mod prefix;
mod route;
mod rule;

pub use address::LinkAddresses;

#[cfg(test)]
pub(crate) mod test_util {
    use crate::netlink::message::Frame;
    use crate::netlink::parse::FromNetlink;

    pub fn decode<M: FromNetlink>(bytes: &[u8]) -> M {
        M::from_bytes(Frame::parse(bytes).unwrap().payload()).unwrap()
    }
}
