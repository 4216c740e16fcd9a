use std::fs::File;
use std::io::{pipe, Read as _, Write as _};
use std::os::fd::AsFd as _;

use virtrpc_proto::{
    Message, MessageHeader, MessageStatus, MessageType, RpcErrorKind, LEN_FIELD_SIZE, MAX_FDS,
};
use virtrpc_testsuite::receive_frame;

fn fd_call_header() -> MessageHeader {
    MessageHeader {
        program: 0x2000_8086,
        version: 1,
        procedure: 1,
        kind: MessageType::CallWithFds,
        serial: 1,
        status: MessageStatus::Ok,
    }
}

#[test]
fn message_owns_duplicates() {
    let (mut reader, writer) = pipe().unwrap();

    let mut msg = Message::new(false);
    msg.add_fd(writer.as_fd()).unwrap();
    assert_eq!(msg.fds().len(), 1);

    // The original write end goes away; the message's duplicate keeps the
    // pipe open.
    drop(writer);

    let mut dup = File::from(msg.dup_fd(0).unwrap());
    dup.write_all(b"ping").unwrap();
    drop(dup);

    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"ping");

    // Closing the owned duplicates closes the last write end.
    msg.clear_fds();
    assert_eq!(msg.fds().len(), 0);
    assert_eq!(reader.read(&mut buf).unwrap(), 0);
}

#[test]
fn drop_closes_untaken_fds() {
    let (mut reader, writer) = pipe().unwrap();

    let mut msg = Message::new(false);
    msg.add_fd(writer.as_fd()).unwrap();
    msg.add_fd(writer.as_fd()).unwrap();
    drop(writer);

    // The connection layer takes the first descriptor for sending; ownership
    // moves out of the message.
    let taken = msg.fds_mut().take_next().unwrap();
    assert_eq!(msg.fds().done(), 1);

    // Dropping the message closes only the remaining owned descriptor.
    drop(msg);

    let mut buf = [0u8; 4];
    File::from(taken).write_all(b"pong").unwrap();
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"pong");

    // All write ends are gone now.
    assert_eq!(reader.read(&mut buf).unwrap(), 0);
}

#[test]
fn num_fds_word_encodes_count() {
    let (_reader, writer) = pipe().unwrap();
    let (_reader2, writer2) = pipe().unwrap();

    let mut msg = Message::new(false);
    msg.header = fd_call_header();
    msg.add_fd(writer.as_fd()).unwrap();
    msg.add_fd(writer2.as_fd()).unwrap();

    msg.encode_header().unwrap();
    msg.encode_num_fds().unwrap();
    msg.encode_payload_raw(&[]).unwrap();

    let frame = msg.frame();
    assert_eq!(frame.len(), LEN_FIELD_SIZE + MessageHeader::SIZE + 4);
    assert_eq!(frame[28..32], 2u32.to_be_bytes());
}

#[test]
fn too_many_fds_is_rejected() {
    let (_reader, writer) = pipe().unwrap();

    let mut msg = Message::new(false);
    msg.header = fd_call_header();
    for _ in 0..MAX_FDS {
        msg.add_fd(writer.as_fd()).unwrap();
    }

    msg.encode_header().unwrap();
    msg.encode_num_fds().unwrap();

    // One past the limit no longer encodes.
    msg.add_fd(writer.as_fd()).unwrap();
    msg.encode_header().unwrap();
    let err = msg.encode_num_fds().unwrap_err();
    assert!(matches!(err.kind(), RpcErrorKind::Protocol { .. }));
}

#[test]
fn decode_num_fds_reserves_slots_once() {
    let (_reader, writer) = pipe().unwrap();

    let mut sender = Message::new(false);
    sender.header = fd_call_header();
    sender.add_fd(writer.as_fd()).unwrap();
    sender.add_fd(writer.as_fd()).unwrap();
    sender.encode_header().unwrap();
    sender.encode_num_fds().unwrap();
    sender.encode_payload_raw(&[]).unwrap();

    let mut msg = receive_frame(sender.frame()).unwrap();
    msg.decode_header().unwrap();

    assert_eq!(msg.decode_num_fds().unwrap(), 2);
    assert_eq!(msg.fds().len(), 2);
    assert!(!msg.fds().is_complete());

    // The transport stores descriptors as they arrive out-of-band.
    let (_r1, w1) = pipe().unwrap();
    msg.fds_mut().store_next(w1.into()).unwrap();
    assert_eq!(msg.fds().done(), 1);

    // A resumed decode of the same word must not discard the stored one.
    msg.decode_header().unwrap();
    assert_eq!(msg.decode_num_fds().unwrap(), 2);
    assert_eq!(msg.fds().done(), 1);

    let (_r2, w2) = pipe().unwrap();
    msg.fds_mut().store_next(w2.into()).unwrap();
    assert!(msg.fds().is_complete());
}

#[test]
fn dup_fd_out_of_range_is_internal_error() {
    let msg = Message::new(false);

    let err = msg.dup_fd(0).unwrap_err();
    assert!(matches!(err.kind(), RpcErrorKind::Internal { .. }));
}

#[test]
fn dup_fd_of_unfilled_slot_is_system_error() {
    // One descriptor announced but not yet received out-of-band.
    let mut msg = Message::new(false);
    msg.fds_mut().reserve_incoming(1);

    let err = msg.dup_fd(0).unwrap_err();
    assert!(matches!(err.kind(), RpcErrorKind::System));
}
