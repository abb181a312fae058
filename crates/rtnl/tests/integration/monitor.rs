//! Monitor integration tests.
//!
//! Notifications flow through the reassembly stage into decoded records;
//! a capture taken while monitoring replays to the same records.

use rtnl::netlink::ChannelTransport;
use rtnl::netlink::counters::CounterTracker;
use rtnl::netlink::message::NlMsgType;
use rtnl::netlink::monitor::{Event, Monitor, MonitorObject, MonitorOptions, MonitorRecord, Replay};
use rtnl::netlink::types::link::iff;
use tokio_stream::StreamExt;

use crate::common::{self, SharedBuf};

#[tokio::test]
async fn test_capture_replays_same_records() {
    let opts = MonitorOptions::new().objects(&[MonitorObject::Link, MonitorObject::Address]);
    let (transport, kernel) = ChannelTransport::pair(common::PID, &opts.socket_config());
    let capture = SharedBuf::default();
    let mut monitor = Monitor::new(transport).with_capture(capture.clone());

    kernel
        .send(common::datagram(&[
            common::notification(common::link(0, 5, "dummy0", iff::UP)),
            common::notification(common::address(0, 5, "10.9.8.7".parse().unwrap(), 16)),
        ]))
        .await
        .unwrap();
    let gone = common::retype(common::link(0, 5, "dummy0", 0), NlMsgType::RTM_DELLINK);
    kernel.send(common::notification(gone)).await.unwrap();
    drop(kernel);

    let mut live: Vec<MonitorRecord> = Vec::new();
    while let Some(record) = monitor.next().await {
        live.push(record.unwrap());
    }
    assert_eq!(live.len(), 3);
    assert_eq!(live[0].event.label(), Some("LINK"));
    assert_eq!(live[1].event.label(), Some("ADDR"));
    assert!(live[2].is_deleted());
    assert_eq!(monitor.names().lookup_link(5), None);

    let replayed: Vec<MonitorRecord> = Replay::new(capture.contents())
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(replayed, live);

    let stamps = Replay::new(capture.contents())
        .with_timestamps(true)
        .filter(|r| matches!(r, Ok(MonitorRecord { event: Event::Timestamp(_), .. })))
        .count();
    assert_eq!(stamps, 3);
}

#[tokio::test]
async fn test_capture_replays_source_namespace() {
    let opts = MonitorOptions::new().all_nsid(true);
    let (transport, kernel) = ChannelTransport::pair(common::PID, &opts.socket_config());
    let capture = SharedBuf::default();
    let mut monitor = Monitor::new(transport).with_capture(capture.clone());

    kernel
        .send_from(7, common::notification(common::link(0, 2, "veth1", iff::UP)))
        .await
        .unwrap();
    kernel
        .send_from(7, common::notification(common::link(0, 3, "veth3", iff::UP)))
        .await
        .unwrap();
    kernel
        .send(common::notification(common::link(0, 4, "veth2", 0)))
        .await
        .unwrap();
    drop(kernel);

    let mut live: Vec<MonitorRecord> = Vec::new();
    while let Some(record) = monitor.next().await {
        live.push(record.unwrap());
    }
    let nsids: Vec<_> = live.iter().map(|r| r.nsid).collect();
    assert_eq!(nsids, [Some(7), Some(7), None]);

    let replayed: Vec<MonitorRecord> = Replay::new(capture.contents())
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(replayed, live);
}

#[tokio::test]
async fn test_records_carry_source_namespace() {
    let opts = MonitorOptions::new().all_nsid(true);
    let (transport, kernel) = ChannelTransport::pair(common::PID, &opts.socket_config());
    let mut monitor = Monitor::new(transport);

    kernel
        .send_from(3, common::notification(common::link(0, 2, "veth1", 0)))
        .await
        .unwrap();
    kernel
        .send(common::notification(common::link(0, 4, "veth2", 0)))
        .await
        .unwrap();

    let first = monitor.next().await.unwrap().unwrap();
    assert_eq!(first.nsid, Some(3));
    let second = monitor.next().await.unwrap().unwrap();
    assert_eq!(second.nsid, None);
}

#[tokio::test]
async fn test_counters_between_dumps() {
    let (mut session, _kernel) = common::scripted(|req, _| {
        let seq = req.nlmsg_seq;
        let eth0_flags = if seq == 1 { iff::UP } else { iff::UP | iff::LOWER_UP };
        vec![common::datagram(&[
            common::link(seq, 2, "eth0", eth0_flags),
            common::done(seq),
        ])]
    });

    let mut tracker = CounterTracker::new();
    let first = tracker.update(&session.get_links().await.unwrap());
    assert!(first.iter().any(|c| c.to_string() == "eth0.admin: up"));
    assert!(first.iter().any(|c| c.to_string() == "eth0.lower: down"));

    let second = tracker.update(&session.get_links().await.unwrap());
    let lines: Vec<String> = second.iter().map(ToString::to_string).collect();
    assert_eq!(lines, ["eth0.lower: up"]);
    assert_eq!(tracker.len(), 1);
}
