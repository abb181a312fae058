//! Codec integration tests.
//!
//! Frames built through the public builder decode back into the same
//! header, payload and attributes.

use rtnl::netlink::attr::{Attr, AttrList, AttrValue, encode_attrs};
use rtnl::netlink::message::{Message, NLM_F_ACK, NLM_F_REQUEST, NlMsgType};
use rtnl::netlink::messages::{LinkAttr, LinkMessage};
use rtnl::netlink::types::link::{IfInfoMsg, iff};
use rtnl::netlink::{AttrIndex, Frame, FromNetlink, MessageBuilder, MessageIter};

use crate::common;

#[test]
fn test_builder_frame_decodes() {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_REQUEST | NLM_F_ACK)
        .payload(&IfInfoMsg::new().with_index(3).with_flags(iff::UP, iff::UP));
    builder.append_attr_str(LinkAttr::Ifname.kind(), "eth1");
    builder.append_attr_u32(LinkAttr::Mtu.kind(), 9000);
    builder.set_seq(12);
    builder.set_pid(common::PID);
    let bytes = builder.finish().unwrap();

    let msg = Message::decode(&bytes).unwrap();
    assert_eq!(msg.header.nlmsg_type, NlMsgType::RTM_NEWLINK);
    assert_eq!(msg.header.nlmsg_seq, 12);
    assert_eq!(msg.header.nlmsg_pid, common::PID);
    assert_eq!(msg.header.nlmsg_len as usize, bytes.len());
    assert_eq!(msg.attrs.0.len(), 2);
    assert_eq!(msg.encode(), bytes);

    let frame = Frame::parse(&bytes).unwrap();
    let link = LinkMessage::from_bytes(frame.payload()).unwrap();
    assert_eq!(link.ifindex(), 3);
    assert_eq!(link.name().as_deref(), Some("eth1"));
    assert_eq!(link.mtu(), Some(9000));
    assert!(link.is_up());
}

#[test]
fn test_lengths_are_aligned() {
    for name in ["a", "ab", "abc", "abcd", "abcde"] {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST)
            .payload(&IfInfoMsg::new());
        builder.append_attr_str(LinkAttr::Ifname.kind(), name);
        let bytes = builder.finish().unwrap();
        assert_eq!(bytes.len() % 4, 0, "{name}");

        // attribute length counts the NUL but not the padding
        let attr_len = u16::from_ne_bytes([bytes[32], bytes[33]]) as usize;
        assert_eq!(attr_len, 4 + name.len() + 1);
    }
}

#[test]
fn test_nested_attrs_round_trip() {
    let attrs = vec![
        Attr::new(3, AttrValue::Str("veth0".into())),
        Attr::new(
            18,
            AttrValue::Nested(vec![
                Attr::new(1, AttrValue::Str("veth".into())),
                Attr::new(2, AttrValue::Flag),
            ]),
        ),
        Attr::new(4, AttrValue::U8(7)),
    ];
    let mut buf = Vec::new();
    encode_attrs(&attrs, &mut buf);
    assert_eq!(buf.len() % 4, 0);

    let list = AttrList::parse(&buf).unwrap();
    assert_eq!(list.0.len(), 3);
    let mut again = Vec::new();
    list.encode(&mut again);
    assert_eq!(again, buf);
}

#[test]
fn test_duplicate_attribute_last_wins() {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0).payload(&IfInfoMsg::new());
    builder.append_attr_u32(LinkAttr::Mtu.kind(), 1500);
    builder.append_attr_u32(LinkAttr::Mtu.kind(), 1400);
    let bytes = builder.finish().unwrap();

    let frame = Frame::parse(&bytes).unwrap();
    let link = LinkMessage::from_bytes(frame.payload()).unwrap();
    assert_eq!(link.mtu(), Some(1400));
    assert_eq!(link.attrs.overwritten(), 1);
}

#[test]
fn test_iterate_concatenated_frames() {
    let batch = common::datagram(&[
        common::link(1, 1, "lo", iff::UP | iff::LOOPBACK),
        common::link(1, 2, "eth0", iff::UP),
        common::done(1),
    ]);
    let types: Vec<u16> = MessageIter::new(&batch)
        .map(|f| f.unwrap().msg_type())
        .collect();
    assert_eq!(
        types,
        [NlMsgType::RTM_NEWLINK, NlMsgType::RTM_NEWLINK, NlMsgType::DONE]
    );
}

#[test]
fn test_overlong_length_rejected() {
    let mut frame = common::done(1);
    frame[0..4].copy_from_slice(&64u32.to_ne_bytes());
    let mut iter = MessageIter::new(&frame);
    assert!(iter.next().unwrap().is_err());
    assert!(iter.next().is_none());
}
