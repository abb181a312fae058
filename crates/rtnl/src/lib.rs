//! Async routing netlink engine for Linux.
//!
//! This crate talks NETLINK_ROUTE from scratch: the attribute codec, message
//! framing, a socket with a two-stage receive pipeline, request/response
//! sessions, and typed records for links, addresses, routes, neighbors,
//! rules, address labels, netconf and namespace ids.
//!
//! # Features
//!
//! - `output` - `ip`-style text and JSON formatting (default)
//!
//! # Example
//!
//! ```ignore
//! use rtnl::netlink::Session;
//!
//! #[tokio::main]
//! async fn main() -> rtnl::Result<()> {
//!     let mut session = Session::open()?;
//!
//!     for link in session.get_links().await? {
//!         println!("{}: {}", link.ifindex(), link.name_or("?"));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Monitoring
//!
//! ```ignore
//! use rtnl::netlink::monitor::{Monitor, MonitorObject, MonitorOptions};
//! use tokio_stream::StreamExt;
//!
//! let opts = MonitorOptions::new().objects(&[MonitorObject::Link, MonitorObject::Address]);
//! let mut monitor = Monitor::open(&opts).await?;
//!
//! while let Some(record) = monitor.next().await {
//!     println!("{:?}", record?.event);
//! }
//! ```

pub mod netlink;

#[cfg(feature = "output")]
pub mod output;

pub use netlink::{Error, Result, Session};
