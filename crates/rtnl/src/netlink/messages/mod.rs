//! Decoded routing netlink records.
//!
//! Each record keeps its fixed payload and an [`AttrMap`] keyed by a compact
//! attribute-index enum, with typed accessors over both.
//!
//! ```ignore
//! use rtnl::netlink::messages::LinkMessage;
//! use rtnl::netlink::parse::FromNetlink;
//!
//! let link = LinkMessage::from_bytes(frame.payload())?;
//! println!("{}: {:?}", link.ifindex(), link.name());
//! ```
//!
//! [`AttrMap`]: crate::netlink::attr::AttrMap

mod address;
mod addrlabel;
mod link;
mod neighbor;
mod netconf;
mod nsid;
mod prefix;
mod route;
mod rule;

pub use address::*;
pub use addrlabel::*;
pub use link::*;
pub use neighbor::*;
pub use netconf::*;
pub use nsid::*;
pub use prefix::*;
pub use route::*;
pub use rule::*;
