//! The routing netlink socket.

use std::fs::File;
use std::io;
use std::mem;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};
use super::transport::Datagram;

/// Default number of items the delivery queue holds before backpressure.
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

/// Multicast groups of NETLINK_ROUTE (RTNLGRP_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RtnlGroup {
    Link = 1,
    Notify = 2,
    Neigh = 3,
    Tc = 4,
    Ipv4Ifaddr = 5,
    Ipv4Mroute = 6,
    Ipv4Route = 7,
    Ipv4Rule = 8,
    Ipv6Ifaddr = 9,
    Ipv6Mroute = 10,
    Ipv6Route = 11,
    Ipv6Ifinfo = 12,
    Ipv6Prefix = 18,
    Ipv6Rule = 19,
    NdUseropt = 20,
    Ipv4Netconf = 24,
    Ipv6Netconf = 25,
    Nsid = 28,
}

impl RtnlGroup {
    /// Bit of this group in the bind-time group mask.
    pub fn bit(self) -> u32 {
        1 << (self as u32 - 1)
    }

    /// Combine groups into a bind-time mask.
    pub fn mask(groups: &[RtnlGroup]) -> u32 {
        groups.iter().fold(0, |acc, g| acc | g.bit())
    }
}

/// Options for opening a [`NetlinkSocket`] and its receive pipeline.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Multicast group mask to bind with.
    pub groups: u32,
    /// Receive notifications from every namespace with an assigned nsid.
    pub all_nsid: bool,
    /// Depth of the delivery queue.
    pub depth: usize,
    /// Requested SO_RCVBUF.
    pub rcvbuf: Option<usize>,
    /// Requested SO_SNDBUF.
    pub sndbuf: Option<usize>,
    /// Network namespace file to open the socket in.
    pub namespace: Option<PathBuf>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            groups: 0,
            all_nsid: false,
            depth: DEFAULT_QUEUE_DEPTH,
            rcvbuf: None,
            sndbuf: None,
            namespace: None,
        }
    }
}

impl SocketConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the given multicast groups.
    pub fn groups(mut self, groups: &[RtnlGroup]) -> Self {
        self.groups |= RtnlGroup::mask(groups);
        self
    }

    /// Subscribe to a raw group mask.
    pub fn group_mask(mut self, mask: u32) -> Self {
        self.groups |= mask;
        self
    }

    pub fn all_nsid(mut self, enabled: bool) -> Self {
        self.all_nsid = enabled;
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth.max(1);
        self
    }

    pub fn rcvbuf(mut self, bytes: usize) -> Self {
        self.rcvbuf = Some(bytes);
        self
    }

    pub fn sndbuf(mut self, bytes: usize) -> Self {
        self.sndbuf = Some(bytes);
        self
    }

    /// Open the socket inside the namespace at `path` (e.g. `/var/run/netns/blue`).
    pub fn namespace(mut self, path: impl Into<PathBuf>) -> Self {
        self.namespace = Some(path.into());
        self
    }
}

/// Async NETLINK_ROUTE socket.
pub struct NetlinkSocket {
    fd: AsyncFd<Socket>,
    pid: u32,
    groups: u32,
    all_nsid: bool,
}

impl NetlinkSocket {
    /// Open and bind a socket as described by `config`.
    pub fn open(config: &SocketConfig) -> Result<Self> {
        match &config.namespace {
            Some(path) => Self::open_in_namespace(config, path),
            None => Self::create(config),
        }
    }

    /// Temporarily enter the namespace at `path`, create the socket there, and
    /// switch back. The socket stays bound to the target namespace.
    fn open_in_namespace(config: &SocketConfig, path: &Path) -> Result<Self> {
        let target = File::open(path).map_err(|e| {
            Error::InvalidMessage(format!("cannot open namespace '{}': {}", path.display(), e))
        })?;
        let current = File::open("/proc/self/ns/net")
            .map_err(|e| Error::InvalidMessage(format!("cannot open current namespace: {}", e)))?;

        // SAFETY: both descriptors are open network namespace files.
        if unsafe { libc::setns(target.as_raw_fd(), libc::CLONE_NEWNET) } < 0 {
            return Err(io::Error::last_os_error().into());
        }

        let result = Self::create(config);

        // SAFETY: see above.
        if unsafe { libc::setns(current.as_raw_fd(), libc::CLONE_NEWNET) } < 0 {
            tracing::warn!(
                "failed to restore original namespace: {}",
                io::Error::last_os_error()
            );
        }

        result
    }

    fn create(config: &SocketConfig) -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE)?;
        socket.set_non_blocking(true)?;

        let mut addr = SocketAddr::new(0, config.groups);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        socket.set_ext_ack(true).ok();

        let fd = socket.as_raw_fd();
        if config.all_nsid {
            setsockopt_int(fd, libc::SOL_NETLINK, libc::NETLINK_LISTEN_ALL_NSID, 1)?;
        }
        if let Some(size) = config.rcvbuf {
            set_buffer(fd, libc::SO_RCVBUF, size, "SO_RCVBUF")?;
        }
        if let Some(size) = config.sndbuf {
            set_buffer(fd, libc::SO_SNDBUF, size, "SO_SNDBUF")?;
        }

        tracing::debug!(pid, groups = config.groups, all_nsid = config.all_nsid, "opened netlink socket");

        Ok(Self {
            fd: AsyncFd::new(socket)?,
            pid,
            groups: config.groups,
            all_nsid: config.all_nsid,
        })
    }

    /// Kernel-assigned port id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Subscribed multicast group mask.
    pub fn groups(&self) -> u32 {
        self.groups
    }

    pub fn all_nsid(&self) -> bool {
        self.all_nsid
    }

    /// Send one message to the kernel.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive one datagram along with the namespace id it was reported from.
    pub async fn recv_datagram(&self) -> Result<Datagram> {
        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| recv_with_nsid(inner.get_ref().as_raw_fd())) {
                Ok(result) => {
                    let (data, nsid) = result?;
                    return Ok(Datagram { data, nsid });
                }
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

fn setsockopt_int(fd: RawFd, level: libc::c_int, name: libc::c_int, value: libc::c_int) -> io::Result<()> {
    // SAFETY: value outlives the call and its size is passed alongside.
    let ret = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            (&value as *const libc::c_int).cast(),
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn getsockopt_int(fd: RawFd, level: libc::c_int, name: libc::c_int) -> io::Result<libc::c_int> {
    let mut value: libc::c_int = 0;
    let mut len = mem::size_of::<libc::c_int>() as libc::socklen_t;
    // SAFETY: value and len are valid for writes of the advertised size.
    let ret = unsafe { libc::getsockopt(fd, level, name, (&mut value as *mut libc::c_int).cast(), &mut len) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(value)
}

/// Set a socket buffer size and check what the kernel actually granted.
///
/// The kernel doubles the requested value and caps it at the sysctl limit;
/// a grant below the request is logged, not fatal.
fn set_buffer(fd: RawFd, name: libc::c_int, size: usize, label: &str) -> io::Result<()> {
    let requested = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);
    setsockopt_int(fd, libc::SOL_SOCKET, name, requested)?;
    let granted = getsockopt_int(fd, libc::SOL_SOCKET, name)?;
    if granted < requested {
        tracing::warn!(requested, granted, "{label} smaller than requested");
    }
    Ok(())
}

/// Receive one datagram, sized by a peek, and pull the nsid out of the
/// NETLINK_LISTEN_ALL_NSID control message when the kernel attached one.
fn recv_with_nsid(fd: RawFd) -> io::Result<(Bytes, Option<i32>)> {
    let mut probe = [0u8; 16];
    // SAFETY: probe is valid for probe.len() bytes.
    let size = unsafe {
        libc::recv(
            fd,
            probe.as_mut_ptr().cast(),
            probe.len(),
            libc::MSG_PEEK | libc::MSG_TRUNC,
        )
    };
    if size < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut buf = vec![0u8; size as usize];
    let mut iov = libc::iovec {
        iov_base: buf.as_mut_ptr().cast(),
        iov_len: buf.len(),
    };
    let mut control = [0u64; 8];
    // SAFETY: msghdr is plain data; zero is a valid initial state.
    let mut hdr: libc::msghdr = unsafe { mem::zeroed() };
    hdr.msg_iov = &mut iov;
    hdr.msg_iovlen = 1;
    hdr.msg_control = control.as_mut_ptr().cast();
    hdr.msg_controllen = mem::size_of_val(&control) as _;

    // SAFETY: hdr points at iov and control, both live for the call.
    let n = unsafe { libc::recvmsg(fd, &mut hdr, 0) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    buf.truncate(n as usize);

    let mut nsid = None;
    // SAFETY: the CMSG_* helpers walk the control buffer the kernel filled,
    // bounded by hdr.msg_controllen.
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(&hdr);
        while !cmsg.is_null() {
            if (*cmsg).cmsg_level == libc::SOL_NETLINK
                && (*cmsg).cmsg_type == libc::NETLINK_LISTEN_ALL_NSID
            {
                nsid = Some(std::ptr::read_unaligned(libc::CMSG_DATA(cmsg) as *const i32));
            }
            cmsg = libc::CMSG_NXTHDR(&hdr, cmsg);
        }
    }

    Ok((Bytes::from(buf), nsid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_bits() {
        assert_eq!(RtnlGroup::Link.bit(), 0x1);
        assert_eq!(RtnlGroup::Ipv4Ifaddr.bit(), 0x10);
        assert_eq!(RtnlGroup::Nsid.bit(), 1 << 27);
        assert_eq!(
            RtnlGroup::mask(&[RtnlGroup::Link, RtnlGroup::Ipv4Route, RtnlGroup::Ipv6Route]),
            0x1 | 0x40 | 0x400
        );
    }

    #[test]
    fn test_config_builder() {
        let config = SocketConfig::new()
            .groups(&[RtnlGroup::Link])
            .group_mask(RtnlGroup::Neigh.bit())
            .all_nsid(true)
            .depth(0)
            .rcvbuf(1 << 20)
            .sndbuf(1 << 16)
            .namespace("/var/run/netns/blue");
        assert_eq!(config.groups, 0b101);
        assert!(config.all_nsid);
        assert_eq!(config.depth, 1);
        assert_eq!(config.rcvbuf, Some(1 << 20));
        assert_eq!(config.sndbuf, Some(1 << 16));
        assert_eq!(config.namespace.as_deref(), Some(Path::new("/var/run/netns/blue")));
        assert_eq!(SocketConfig::default().depth, DEFAULT_QUEUE_DEPTH);
        assert_eq!(SocketConfig::default().namespace, None);
    }

    #[test]
    fn test_missing_namespace_is_reported() {
        let config = SocketConfig::new().namespace("/nonexistent/netns/blue");
        match NetlinkSocket::open(&config) {
            Err(Error::InvalidMessage(msg)) => assert!(msg.contains("/nonexistent/netns/blue"), "{msg}"),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("opened a socket in a missing namespace"),
        }
    }
}
