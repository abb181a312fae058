//! Routing netlink protocol engine.
//!
//! Layers, bottom up:
//!
//! - [`attr`], [`message`], [`builder`], [`parse`]: the wire codec
//! - [`socket`], [`transport`]: a NETLINK_ROUTE socket plus its two-stage
//!   receive pipeline (reader, then batch reassembly)
//! - [`session`]: one request at a time, correlated by sequence number
//! - [`ops`], [`messages`], [`types`]: typed queries for each object kind
//! - [`monitor`], [`names`], [`counters`]: notification streams, capture
//!   files, name resolution and link counter deltas
//!
//! # Quick Start
//!
//! ```ignore
//! use rtnl::netlink::Session;
//!
//! let mut session = Session::open()?;
//!
//! let links = session.get_links().await?;
//! for link in &links {
//!     println!("{}: {}", link.ifindex(), link.name_or("?"));
//! }
//!
//! let addrs = session.get_addresses(libc::AF_INET as u8).await?;
//! ```
//!
//! # Monitoring
//!
//! ```ignore
//! use rtnl::netlink::monitor::{Monitor, MonitorOptions};
//! use tokio_stream::StreamExt;
//!
//! let mut monitor = Monitor::open(&MonitorOptions::new()).await?;
//! while let Some(record) = monitor.next().await {
//!     println!("{:?}", record?.event);
//! }
//! ```

pub mod attr;
mod builder;
pub mod counters;
mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod message;
pub mod messages;
pub mod monitor;
pub mod names;
mod ops;
pub mod parse;
pub mod session;
pub mod socket;
pub mod transport;
pub mod types;

pub use attr::{AttrIndex, AttrIter, AttrMap, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use error::{Error, Result};
pub use message::{Frame, MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use names::NameCache;
pub use parse::FromNetlink;
pub use session::Session;
pub use socket::{NetlinkSocket, RtnlGroup, SocketConfig};
pub use transport::{ChannelTransport, Datagram, Delivery, KernelEnd, RouteSocket, Transport};
