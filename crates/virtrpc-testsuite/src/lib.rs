//! Various test utilities

use expect_test::Expect;
use virtrpc_proto::{Message, RpcResult, LEN_FIELD_SIZE};

/// Asserts the encoded frame of `msg` against an expected hex dump.
pub fn assert_frame(msg: &Message, expected_bytes: Expect) {
    expected_bytes.assert_eq(&format!("{:02X?}", msg.frame()));
}

/// Feeds `bytes` into a fresh message the way the connection layer would:
/// the length word first, then the remainder once `decode_length` sized the
/// buffer. The header and payload are left undecoded.
pub fn receive_frame(bytes: &[u8]) -> RpcResult<Message> {
    let mut msg = Message::new(false);

    msg.start_receive();
    msg.pending_mut().copy_from_slice(&bytes[..LEN_FIELD_SIZE]);
    msg.advance(LEN_FIELD_SIZE);

    msg.decode_length()?;

    assert_eq!(msg.buffer_length(), bytes.len(), "frame shorter or longer than its length word");
    msg.pending_mut().copy_from_slice(&bytes[LEN_FIELD_SIZE..]);
    msg.advance(bytes.len() - LEN_FIELD_SIZE);

    Ok(msg)
}
