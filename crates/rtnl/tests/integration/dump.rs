//! Typed query and change tests.

use std::net::IpAddr;

use rtnl::netlink::message::{Frame, NLM_F_DUMP, NlMsgType};
use rtnl::netlink::messages::AddressMessage;
use rtnl::netlink::types::family;
use rtnl::netlink::types::link::iff;
use rtnl::netlink::{FromNetlink, NameCache};

use crate::common;

#[tokio::test]
async fn test_link_dump() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        assert_eq!(req.nlmsg_type, NlMsgType::RTM_GETLINK);
        assert_ne!(req.nlmsg_flags & NLM_F_DUMP, 0);
        let seq = req.nlmsg_seq;
        vec![common::datagram(&[
            common::link(seq, 1, "lo", iff::UP | iff::LOOPBACK | iff::RUNNING),
            common::link(seq, 2, "eth0", iff::UP | iff::LOWER_UP),
            common::link(seq, 3, "wlan0", 0),
            common::done(seq),
        ])]
    });

    let links = session.get_links().await.unwrap();
    let names: Vec<_> = links.iter().map(|l| l.name_or("?")).collect();
    assert_eq!(names, ["lo", "eth0", "wlan0"]);
    assert!(links[0].is_loopback());
    assert!(links[1].is_lower_up());
    assert!(!links[2].is_up());

    let cache = NameCache::from_links(&links);
    assert_eq!(cache.ifindex("wlan0"), Some(3));
    assert_eq!(cache.link_name(2), "eth0");
}

#[tokio::test]
async fn test_address_dump_by_family() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        let seq = req.nlmsg_seq;
        vec![common::datagram(&[
            common::address(seq, 1, "127.0.0.1".parse().unwrap(), 8),
            common::address(seq, 2, "192.168.1.10".parse().unwrap(), 24),
            common::done(seq),
        ])]
    });

    let addrs = session.get_addresses(family::AF_INET).await.unwrap();
    assert_eq!(addrs.len(), 2);
    assert_eq!(addrs[1].ifindex(), 2);
    assert_eq!(addrs[1].prefix_len(), 24);
    assert_eq!(addrs[1].local(), Some("192.168.1.10".parse().unwrap()));
}

#[tokio::test]
async fn test_delete_missing_address() {
    let (mut session, _kernel) = common::scripted(|req, body| {
        assert_eq!(req.nlmsg_type, NlMsgType::RTM_DELADDR);
        let frame = Frame::parse(body).unwrap();
        let addr = AddressMessage::from_bytes(frame.payload()).unwrap();
        assert_eq!(addr.ifindex(), 2);
        assert_eq!(addr.prefix_len(), 24);
        vec![common::error(req, libc::ENOENT)]
    });

    let addr: IpAddr = "10.1.2.3".parse().unwrap();
    let result = session.del_address(2, addr, 24).await;
    let err = result.as_ref().unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().starts_with("deleting 10.1.2.3/24: "));
    assert_rejected!(result, libc::ENOENT);
}

#[tokio::test]
async fn test_add_existing_address() {
    let (mut session, _kernel) = common::scripted(|req, _| vec![common::error(req, libc::EEXIST)]);

    let err = session
        .add_address(1, "127.0.0.1".parse().unwrap(), 8)
        .await
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn test_link_by_name() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        let seq = req.nlmsg_seq;
        vec![common::datagram(&[
            common::link(seq, 7, "br0", iff::UP),
            common::error(req, 0),
        ])]
    });

    assert_eq!(session.resolve_ifindex("br0").await.unwrap(), 7);
}
