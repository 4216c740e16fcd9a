use proptest::collection::vec;
use proptest::prelude::*;
use virtrpc_core::{XdrOpaque, XdrString};
use virtrpc_proto::{Message, MessageHeader, MessageStatus, MessageType};
use virtrpc_testsuite::receive_frame;

fn message_type() -> impl Strategy<Value = MessageType> {
    proptest::sample::select(vec![
        MessageType::Call,
        MessageType::Reply,
        MessageType::Message,
        MessageType::Stream,
        MessageType::CallWithFds,
        MessageType::ReplyWithFds,
        MessageType::StreamHole,
    ])
}

fn message_status() -> impl Strategy<Value = MessageStatus> {
    proptest::sample::select(vec![MessageStatus::Ok, MessageStatus::Error, MessageStatus::Continue])
}

prop_compose! {
    fn header()(
        program in any::<u32>(),
        version in any::<u32>(),
        procedure in any::<i32>(),
        kind in message_type(),
        serial in any::<u32>(),
        status in message_status(),
    ) -> MessageHeader {
        MessageHeader { program, version, procedure, kind, serial, status }
    }
}

proptest! {
    #[test]
    fn header_roundtrips_through_frame(header in header()) {
        let mut msg = Message::new(false);
        msg.header = header;
        msg.encode_header().unwrap();
        msg.encode_payload_raw(&[]).unwrap();

        let mut decoded = receive_frame(msg.frame()).unwrap();
        decoded.decode_header().unwrap();

        prop_assert_eq!(decoded.header, header);
        prop_assert_eq!(decoded.buffer_offset(), decoded.buffer_length());
    }

    #[test]
    fn string_payload_roundtrips(header in header(), value in ".{0,200}") {
        let payload = XdrString::new(value.clone()).unwrap();

        let mut msg = Message::new(false);
        msg.header = header;
        msg.encode_header().unwrap();
        msg.encode_payload(&payload).unwrap();

        let mut decoded = receive_frame(msg.frame()).unwrap();
        decoded.decode_header().unwrap();

        let got: XdrString = decoded.decode_payload().unwrap();
        prop_assert_eq!(got.value(), value);
    }

    // Sizes past the initial payload capacity exercise the doubling path.
    #[test]
    fn opaque_payload_roundtrips(header in header(), data in vec(any::<u8>(), 0..4096)) {
        let payload = XdrOpaque::new(data.clone()).unwrap();

        let mut msg = Message::new(false);
        msg.header = header;
        msg.encode_header().unwrap();
        msg.encode_payload(&payload).unwrap();

        let mut decoded = receive_frame(msg.frame()).unwrap();
        decoded.decode_header().unwrap();

        let got: XdrOpaque = decoded.decode_payload().unwrap();
        prop_assert_eq!(got.value(), data.as_slice());
    }

    #[test]
    fn raw_payload_roundtrips(data in vec(any::<u8>(), 0..4096)) {
        let mut msg = Message::new(false);
        msg.encode_header().unwrap();
        msg.encode_payload_raw(&data).unwrap();

        let mut decoded = receive_frame(msg.frame()).unwrap();
        decoded.decode_header().unwrap();

        prop_assert_eq!(decoded.pending(), data.as_slice());
    }

    // The offset never escapes the logical frame, whatever the inputs.
    #[test]
    fn offset_stays_within_length(data in vec(any::<u8>(), 0..2048)) {
        let mut msg = Message::new(false);
        msg.encode_header().unwrap();
        prop_assert!(msg.buffer_offset() <= msg.buffer_length());

        msg.encode_payload_raw(&data).unwrap();
        prop_assert!(msg.buffer_offset() <= msg.buffer_length());

        let mut decoded = receive_frame(msg.frame()).unwrap();
        prop_assert!(decoded.buffer_offset() <= decoded.buffer_length());

        decoded.decode_header().unwrap();
        prop_assert!(decoded.buffer_offset() <= decoded.buffer_length());
    }
}
