//! Session integration tests.
//!
//! Correlation of replies to requests, completion on DONE or ERROR, and
//! queuing of notifications on multiplexed sessions.

use rtnl::Error;
use rtnl::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NlMsgType};
use rtnl::netlink::types::link::{IfInfoMsg, iff};
use rtnl::netlink::{MessageBuilder, RtnlGroup, SocketConfig};

use crate::common;

fn dump_links() -> MessageBuilder {
    MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST | NLM_F_DUMP).payload(&IfInfoMsg::new())
}

#[tokio::test]
async fn test_handler_sees_every_frame_before_done() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        let seq = req.nlmsg_seq;
        // split over two datagrams to cross a batch boundary
        vec![
            common::datagram(&[common::link(seq, 1, "lo", iff::LOOPBACK), common::link(seq, 2, "eth0", 0)]),
            common::datagram(&[common::link(seq, 3, "eth1", 0), common::done(seq)]),
        ]
    });

    let mut seen = Vec::new();
    session
        .request(dump_links(), |frame| {
            seen.push(frame.header.nlmsg_seq);
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(seen, [1, 1, 1]);
}

#[tokio::test]
async fn test_foreign_sequence_never_reaches_handler() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        vec![common::datagram(&[
            common::link(req.nlmsg_seq + 5, 1, "lo", 0),
            common::done(req.nlmsg_seq),
        ])]
    });

    let mut calls = 0;
    let err = session
        .request(dump_links(), |_| {
            calls += 1;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(calls, 0);
    assert!(err.is_fatal());
    match err {
        Error::ProtocolMismatch {
            expected_seq,
            actual_seq,
            expected_pid,
            ..
        } => {
            assert_eq!(expected_seq, 1);
            assert_eq!(actual_seq, 6);
            assert_eq!(expected_pid, common::PID);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_errno_maps_to_rejection() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        let errno = if req.nlmsg_seq == 1 { libc::EPERM } else { 0 };
        vec![common::error(req, errno)]
    });

    let set_up = || {
        MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_REQUEST | NLM_F_ACK)
            .payload(&IfInfoMsg::new().with_index(2).with_flags(iff::UP, iff::UP))
    };
    let first = session.ack(set_up()).await;
    assert_rejected!(first, libc::EPERM);
    assert!(session.ack(set_up()).await.is_ok());
    assert_eq!(session.last_seq(), 2);
}

#[tokio::test]
async fn test_failed_handler_leaves_session_usable() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        let seq = req.nlmsg_seq;
        vec![common::datagram(&[
            common::link(seq, 1, "lo", 0),
            common::link(seq, 2, "eth0", 0),
            common::done(seq),
        ])]
    });

    let err = session
        .request(dump_links(), |_| Err(Error::InvalidMessage("stop".into())))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMessage(_)));

    let links = session.get_links().await.unwrap();
    assert_eq!(links.len(), 2);
}

#[tokio::test]
async fn test_notifications_queued_during_dump() {
    let config = SocketConfig::new().groups(&[RtnlGroup::Link]);
    let (mut session, _kernel) = common::scripted_with(&config, |req, _| {
        let seq = req.nlmsg_seq;
        vec![common::datagram(&[
            common::notification(common::link(0, 9, "dummy0", 0)),
            common::link(seq, 1, "lo", 0),
            common::done(seq),
        ])]
    });

    let links = session.get_links().await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(session.queued_notifications(), 1);

    let note = session.next_notification().await.unwrap().unwrap();
    assert_eq!(u16::from_ne_bytes([note[4], note[5]]), NlMsgType::RTM_NEWLINK);
    assert_eq!(session.queued_notifications(), 0);
}

#[tokio::test]
async fn test_unanswered_request_fails_when_kernel_goes_away() {
    let (mut session, kernel) = common::scripted(|_, _| Vec::new());
    let request = session.get_links();
    kernel.abort();
    assert!(matches!(request.await, Err(Error::TransportClosed)));
}
