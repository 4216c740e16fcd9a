use rstest::rstest;
use virtrpc_core::{decode_owned, encode_vec};
use virtrpc_proto::{MessageHeader, MessageStatus, MessageType};

#[rstest]
#[case(MessageType::Call, MessageStatus::Ok)]
#[case(MessageType::Reply, MessageStatus::Error)]
#[case(MessageType::Message, MessageStatus::Ok)]
#[case(MessageType::Stream, MessageStatus::Continue)]
#[case(MessageType::CallWithFds, MessageStatus::Ok)]
#[case(MessageType::ReplyWithFds, MessageStatus::Error)]
#[case(MessageType::StreamHole, MessageStatus::Ok)]
fn roundtrip_all_discriminants(#[case] kind: MessageType, #[case] status: MessageStatus) {
    let header = MessageHeader {
        program: 0x2000_8086,
        version: 1,
        procedure: -3,
        kind,
        serial: u32::MAX,
        status,
    };

    let bytes = encode_vec(&header).unwrap();
    assert_eq!(bytes.len(), MessageHeader::SIZE);
    assert_eq!(decode_owned::<MessageHeader>(&bytes).unwrap(), header);
}

#[test]
fn fd_passing_kinds() {
    assert!(MessageType::CallWithFds.passes_fds());
    assert!(MessageType::ReplyWithFds.passes_fds());
    assert!(!MessageType::Call.passes_fds());
    assert!(!MessageType::Stream.passes_fds());
}

#[test]
fn rejects_unknown_discriminants() {
    let good = encode_vec(&MessageHeader::default()).unwrap();

    // type word
    let mut bytes = good.clone();
    bytes[12..16].copy_from_slice(&7i32.to_be_bytes());
    assert!(decode_owned::<MessageHeader>(&bytes).is_err());

    // status word
    let mut bytes = good;
    bytes[20..24].copy_from_slice(&3i32.to_be_bytes());
    assert!(decode_owned::<MessageHeader>(&bytes).is_err());
}

#[test]
fn rejects_truncated_header() {
    let bytes = encode_vec(&MessageHeader::default()).unwrap();
    assert!(decode_owned::<MessageHeader>(&bytes[..MessageHeader::SIZE - 1]).is_err());
}
