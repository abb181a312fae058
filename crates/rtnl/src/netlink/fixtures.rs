//! Captured routing netlink frames for tests.
//!
//! Bodies are written out byte by byte as the kernel emits them on a
//! little-endian host; [`frame`] prepends the header.

use super::message::{NLM_F_MULTI, NlMsgType};

/// Sequence number used by the dump fixtures.
pub const SEQ: u32 = 1;
/// Port id used by the dump fixtures.
pub const PID: u32 = 100;

/// Prepend a header to `body`, padding the body to four bytes.
pub fn frame(msg_type: u16, flags: u16, seq: u32, pid: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + body.len());
    let len = 16 + body.len().next_multiple_of(4);
    out.extend_from_slice(&(len as u32).to_ne_bytes());
    out.extend_from_slice(&msg_type.to_ne_bytes());
    out.extend_from_slice(&flags.to_ne_bytes());
    out.extend_from_slice(&seq.to_ne_bytes());
    out.extend_from_slice(&pid.to_ne_bytes());
    out.extend_from_slice(body);
    out.resize(len, 0);
    out
}

/// RTM_NEWLINK for lo, as part of a dump.
pub fn link_loopback() -> Vec<u8> {
    #[rustfmt::skip]
    let body = [
        // ifinfomsg: family=0, pad=0, type=772 (ARPHRD_LOOPBACK), index=1, flags=0x49, change=0
        0x00, 0x00, // family, pad
        0x04, 0x03, // type = 772
        0x01, 0x00, 0x00, 0x00, // index = 1
        0x49, 0x00, 0x00, 0x00, // flags = IFF_UP | IFF_LOOPBACK | IFF_RUNNING
        0x00, 0x00, 0x00, 0x00, // change = 0
        // IFLA_IFNAME = "lo"
        0x07, 0x00, // len = 7
        0x03, 0x00, // type = IFLA_IFNAME (3)
        b'l', b'o', 0x00, 0x00, // "lo\0" + padding
        // IFLA_MTU = 65536
        0x08, 0x00, // len = 8
        0x04, 0x00, // type = IFLA_MTU (4)
        0x00, 0x00, 0x01, 0x00, // mtu = 65536
        // IFLA_TXQLEN = 1000
        0x08, 0x00, // len = 8
        0x0d, 0x00, // type = IFLA_TXQLEN (13)
        0xe8, 0x03, 0x00, 0x00, // txqlen = 1000
        // IFLA_OPERSTATE = 0 (UNKNOWN)
        0x05, 0x00, // len = 5
        0x10, 0x00, // type = IFLA_OPERSTATE (16)
        0x00, 0x00, 0x00, 0x00, // operstate = 0 + padding
    ];
    frame(NlMsgType::RTM_NEWLINK, NLM_F_MULTI, SEQ, PID, &body)
}

/// RTM_NEWLINK carrying IFLA_STATS64 with counters `base, base+1, ...`.
pub fn link_with_stats(index: i32, name: &str, flags: u32, operstate: u8, base: u64) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]); // family, pad, type = 1 (ether)
    body.extend_from_slice(&index.to_ne_bytes());
    body.extend_from_slice(&flags.to_ne_bytes());
    body.extend_from_slice(&0u32.to_ne_bytes()); // change

    let name_len = name.len() + 1;
    body.extend_from_slice(&((4 + name_len) as u16).to_ne_bytes());
    body.extend_from_slice(&3u16.to_ne_bytes()); // IFLA_IFNAME
    body.extend_from_slice(name.as_bytes());
    body.push(0);
    body.resize(body.len().next_multiple_of(4), 0);

    body.extend_from_slice(&[0x05, 0x00, 0x10, 0x00, operstate, 0, 0, 0]); // IFLA_OPERSTATE

    body.extend_from_slice(&((4 + 23 * 8) as u16).to_ne_bytes());
    body.extend_from_slice(&23u16.to_ne_bytes()); // IFLA_STATS64
    for i in 0..23u64 {
        body.extend_from_slice(&(base + i).to_ne_bytes());
    }

    frame(NlMsgType::RTM_NEWLINK, NLM_F_MULTI, SEQ, PID, &body)
}

/// RTM_NEWADDR for 127.0.0.1/8 on lo.
pub fn addr_loopback_v4() -> Vec<u8> {
    #[rustfmt::skip]
    let body = [
        // ifaddrmsg
        0x02, // family = AF_INET
        0x08, // prefixlen = 8
        0x80, // flags = IFA_F_PERMANENT
        0xfe, // scope = RT_SCOPE_HOST (254)
        0x01, 0x00, 0x00, 0x00, // index = 1
        // IFA_ADDRESS = 127.0.0.1
        0x08, 0x00, 0x01, 0x00,
        0x7f, 0x00, 0x00, 0x01,
        // IFA_LOCAL = 127.0.0.1
        0x08, 0x00, 0x02, 0x00,
        0x7f, 0x00, 0x00, 0x01,
        // IFA_LABEL = "lo"
        0x07, 0x00, 0x03, 0x00,
        b'l', b'o', 0x00, 0x00,
    ];
    frame(NlMsgType::RTM_NEWADDR, NLM_F_MULTI, SEQ, PID, &body)
}

/// RTM_NEWADDR for ::1/128 on lo.
pub fn addr_loopback_v6() -> Vec<u8> {
    #[rustfmt::skip]
    let body = [
        // ifaddrmsg
        0x0a, // family = AF_INET6
        0x80, // prefixlen = 128
        0x80, // flags = IFA_F_PERMANENT
        0xfe, // scope = RT_SCOPE_HOST (254)
        0x01, 0x00, 0x00, 0x00, // index = 1
        // IFA_ADDRESS = ::1
        0x14, 0x00, 0x01, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    ];
    frame(NlMsgType::RTM_NEWADDR, NLM_F_MULTI, SEQ, PID, &body)
}

/// RTM_NEWROUTE for `default via 192.168.1.1 dev 2 proto static`.
pub fn route_default_v4() -> Vec<u8> {
    #[rustfmt::skip]
    let body = [
        // rtmsg
        0x02, // family = AF_INET
        0x00, // dst_len = 0
        0x00, // src_len = 0
        0x00, // tos = 0
        0xfe, // table = RT_TABLE_MAIN (254)
        0x04, // protocol = RTPROT_STATIC (4)
        0x00, // scope = RT_SCOPE_UNIVERSE (0)
        0x01, // type = RTN_UNICAST (1)
        0x00, 0x00, 0x00, 0x00, // flags = 0
        // RTA_TABLE = 254
        0x08, 0x00, 0x0f, 0x00,
        0xfe, 0x00, 0x00, 0x00,
        // RTA_GATEWAY = 192.168.1.1
        0x08, 0x00, 0x05, 0x00,
        0xc0, 0xa8, 0x01, 0x01,
        // RTA_OIF = 2
        0x08, 0x00, 0x04, 0x00,
        0x02, 0x00, 0x00, 0x00,
    ];
    frame(NlMsgType::RTM_NEWROUTE, NLM_F_MULTI, SEQ, PID, &body)
}

/// RTM_NEWNEIGH for 192.168.1.1 lladdr 00:11:22:33:44:55 REACHABLE on index 2.
pub fn neighbor_arp() -> Vec<u8> {
    #[rustfmt::skip]
    let body = [
        // ndmsg
        0x02, 0x00, 0x00, 0x00, // family = AF_INET, pads
        0x02, 0x00, 0x00, 0x00, // ifindex = 2
        0x02, 0x00, // state = NUD_REACHABLE
        0x00, // flags
        0x01, // type = RTN_UNICAST
        // NDA_DST = 192.168.1.1
        0x08, 0x00, 0x01, 0x00,
        0xc0, 0xa8, 0x01, 0x01,
        // NDA_LLADDR
        0x0a, 0x00, 0x02, 0x00,
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x00, 0x00,
    ];
    frame(NlMsgType::RTM_NEWNEIGH, NLM_F_MULTI, SEQ, PID, &body)
}

/// RTM_NEWRULE for `32766: from all lookup main`.
pub fn rule_main() -> Vec<u8> {
    #[rustfmt::skip]
    let body = [
        // fib_rule_hdr
        0x02, // family = AF_INET
        0x00, 0x00, 0x00, // dst_len, src_len, tos
        0xfe, // table = main
        0x00, 0x00, // res1, res2
        0x01, // action = FR_ACT_TO_TBL
        0x00, 0x00, 0x00, 0x00, // flags
        // FRA_TABLE = 254
        0x08, 0x00, 0x0f, 0x00,
        0xfe, 0x00, 0x00, 0x00,
        // FRA_PRIORITY = 32766
        0x08, 0x00, 0x06, 0x00,
        0xfe, 0x7f, 0x00, 0x00,
    ];
    frame(NlMsgType::RTM_NEWRULE, NLM_F_MULTI, SEQ, PID, &body)
}

/// RTM_NEWNSID notification assigning `nsid` to the namespace of `pid`.
pub fn nsid_new(nsid: i32, pid: u32) -> Vec<u8> {
    let mut body = vec![0x00, 0x00, 0x00, 0x00]; // rtgenmsg family = AF_UNSPEC + pad
    body.extend_from_slice(&[0x08, 0x00, 0x01, 0x00]); // NETNSA_NSID
    body.extend_from_slice(&nsid.to_ne_bytes());
    body.extend_from_slice(&[0x08, 0x00, 0x02, 0x00]); // NETNSA_PID
    body.extend_from_slice(&pid.to_ne_bytes());
    frame(NlMsgType::RTM_NEWNSID, 0, 0, 0, &body)
}

/// RTM_NEWNETCONF for IPv4 on `ifindex`, forwarding on, rp_filter off.
pub fn netconf_v4(ifindex: i32) -> Vec<u8> {
    let mut body = vec![0x02, 0x00, 0x00, 0x00]; // family = AF_INET + alignment gap
    body.extend_from_slice(&[0x08, 0x00, 0x01, 0x00]); // NETCONFA_IFINDEX
    body.extend_from_slice(&ifindex.to_ne_bytes());
    body.extend_from_slice(&[0x08, 0x00, 0x02, 0x00]); // NETCONFA_FORWARDING
    body.extend_from_slice(&1u32.to_ne_bytes());
    body.extend_from_slice(&[0x08, 0x00, 0x03, 0x00]); // NETCONFA_RP_FILTER
    body.extend_from_slice(&0u32.to_ne_bytes());
    frame(NlMsgType::RTM_NEWNETCONF, 0, 0, 0, &body)
}

/// NLMSG_DONE closing a dump.
pub fn done(seq: u32, pid: u32) -> Vec<u8> {
    frame(NlMsgType::DONE, NLM_F_MULTI, seq, pid, &0i32.to_ne_bytes())
}

/// NLMSG_ERROR with `errno` (negative, or 0 for an ACK) answering `req_type`.
pub fn error(errno: i32, seq: u32, pid: u32, req_type: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&errno.to_ne_bytes());
    // echoed request header
    body.extend_from_slice(&16u32.to_ne_bytes());
    body.extend_from_slice(&req_type.to_ne_bytes());
    body.extend_from_slice(&0x5u16.to_ne_bytes()); // REQUEST | ACK
    body.extend_from_slice(&seq.to_ne_bytes());
    body.extend_from_slice(&pid.to_ne_bytes());
    frame(NlMsgType::ERROR, 0, seq, pid, &body)
}
