use virtrpc_core::{
    ensure_fixed_part_size, invalid_field_err, unexpected_message_type_err, Decode, DecodeOwned, DecodeResult,
    Encode, EncodeResult, ReadCursor, WriteCursor,
};

/// Kind of traffic a message carries.
///
/// The `*WithFds` kinds announce that a word counting passed file
/// descriptors follows the header, and that the descriptors themselves
/// arrive out-of-band on the transport.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MessageType {
    /// Client issues a procedure call.
    #[default]
    Call = 0,
    /// Server responds to a call.
    Reply = 1,
    /// Either end emits an asynchronous event.
    Message = 2,
    /// Either end sends stream data.
    Stream = 3,
    /// Procedure call with passed file descriptors.
    CallWithFds = 4,
    /// Response with passed file descriptors.
    ReplyWithFds = 5,
    /// Sparse stream hole marker.
    StreamHole = 6,
}

impl MessageType {
    /// Whether a file descriptor count word follows the header.
    pub const fn passes_fds(self) -> bool {
        matches!(self, Self::CallWithFds | Self::ReplyWithFds)
    }

    const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Call),
            1 => Some(Self::Reply),
            2 => Some(Self::Message),
            3 => Some(Self::Stream),
            4 => Some(Self::CallWithFds),
            5 => Some(Self::ReplyWithFds),
            6 => Some(Self::StreamHole),
            _ => None,
        }
    }
}

impl From<MessageType> for i32 {
    fn from(value: MessageType) -> Self {
        value as Self
    }
}

/// Outcome carried by a reply or stream message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MessageStatus {
    /// Call succeeded, or stream data follows.
    #[default]
    Ok = 0,
    /// Call failed, or stream aborted; the payload is a [`WireError`](crate::WireError).
    Error = 1,
    /// Stream finish confirmation.
    Continue = 2,
}

impl MessageStatus {
    const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Error),
            2 => Some(Self::Continue),
            _ => None,
        }
    }
}

impl From<MessageStatus> for i32 {
    fn from(value: MessageStatus) -> Self {
        value as Self
    }
}

/// The fixed header common to every message.
///
/// Six big-endian words, immediately following the frame length word:
///
/// ```diagram
///  ____________________   word
/// |      program       |   1
/// |____________________|
/// |      version       |   2
/// |____________________|
/// |     procedure      |   3
/// |____________________|
/// |       type         |   4
/// |____________________|
/// |      serial        |   5
/// |____________________|
/// |      status        |   6
/// |____________________|
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Identifies the API grouping the procedure belongs to.
    pub program: u32,
    /// Version of the program's wire contract.
    pub version: u32,
    /// Procedure within the program; values are program-specific.
    pub procedure: i32,
    /// Kind of traffic.
    pub kind: MessageType,
    /// Pairs a call with its reply; unique per connection, monotonic.
    pub serial: u32,
    /// Outcome indicator.
    pub status: MessageStatus,
}

impl MessageHeader {
    pub const NAME: &'static str = "MessageHeader";

    /// Encoded size in bytes.
    pub const SIZE: usize = 24;

    const FIXED_PART_SIZE: usize = Self::SIZE;
}

impl Encode for MessageHeader {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_fixed_part_size!(in: dst);

        dst.write_u32(self.program);
        dst.write_u32(self.version);
        dst.write_i32(self.procedure);
        dst.write_i32(i32::from(self.kind));
        dst.write_u32(self.serial);
        dst.write_i32(i32::from(self.status));

        Ok(())
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn size(&self) -> usize {
        Self::FIXED_PART_SIZE
    }
}

impl Decode<'_> for MessageHeader {
    fn decode(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let program = src.read_u32();
        let version = src.read_u32();
        let procedure = src.read_i32();

        let kind = src.read_i32();
        let kind = MessageType::from_i32(kind).ok_or_else(|| unexpected_message_type_err!(kind))?;

        let serial = src.read_u32();

        let status = src.read_i32();
        let status =
            MessageStatus::from_i32(status).ok_or_else(|| invalid_field_err!("status", "unknown status value"))?;

        Ok(Self {
            program,
            version,
            procedure,
            kind,
            serial,
            status,
        })
    }
}

impl DecodeOwned for MessageHeader {
    fn decode_owned(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        <Self as Decode<'_>>::decode(src)
    }
}

#[cfg(test)]
mod tests {
    use virtrpc_core::{decode_owned, encode_vec};

    use super::*;

    #[test]
    fn roundtrip() {
        let header = MessageHeader {
            program: 0x2000_8086,
            version: 1,
            procedure: 66,
            kind: MessageType::CallWithFds,
            serial: 7,
            status: MessageStatus::Ok,
        };

        let bytes = encode_vec(&header).unwrap();
        assert_eq!(bytes.len(), MessageHeader::SIZE);
        assert_eq!(decode_owned::<MessageHeader>(&bytes).unwrap(), header);
    }

    #[test]
    fn rejects_unknown_type() {
        let mut bytes = encode_vec(&MessageHeader::default()).unwrap();
        bytes[15] = 9;
        assert!(decode_owned::<MessageHeader>(&bytes).is_err());
    }
}
