//! Integration tests for rtnl.
//!
//! These tests drive sessions and monitors end to end over an in-memory
//! transport. A scripted kernel task answers each request with prepared
//! datagrams, so no privileges or real sockets are needed.
//!
//! # Running
//!
//! ```bash
//! cargo test -p rtnl --test integration
//! ```
//!
//! # Organization
//!
//! - `codec` - Attribute and frame encoding through the public API
//! - `session` - Request/response correlation and error mapping
//! - `dump` - Typed queries and changes
//! - `monitor` - Notification streams, capture and replay

#[macro_use]
#[path = "common/mod.rs"]
mod common;

#[path = "integration/codec.rs"]
mod codec;

#[path = "integration/session.rs"]
mod session;

#[path = "integration/dump.rs"]
mod dump;

#[path = "integration/monitor.rs"]
mod monitor;
