use core::fmt;
use std::os::fd::{BorrowedFd, OwnedFd};

use tracing::{debug, trace};
use virtrpc_core::{Encode, EncodeErrorKind, ReadCursor, WriteCursor};

use crate::fds::FdSet;
use crate::header::MessageHeader;
use crate::RpcResult;

/// Size of the frame length word.
pub const LEN_FIELD_SIZE: usize = 4;

/// Upper bound on everything following the length word (header included).
///
/// This is a protocol constant: both peers enforce it, so it cannot be
/// changed without a protocol version bump.
pub const MAX_PAYLOAD_SIZE: usize = 33_554_432;

/// Upper bound on a whole frame, length word included.
pub const MAX_TOTAL_SIZE: usize = MAX_PAYLOAD_SIZE + LEN_FIELD_SIZE;

/// Starting allocation for the region past the length word when encoding.
pub const INITIAL_PAYLOAD_CAPACITY: usize = 1024;

/// Upper bound on file descriptors attached to a single message.
pub const MAX_FDS: usize = 32;

/// Hook invoked exactly once when a message is released.
pub type ReleaseHook = Box<dyn FnOnce(&mut Message) + Send>;

/// One RPC message and its reusable frame buffer.
///
/// A `Message` moves through phases: the connection layer fills the buffer
/// (or the encode entry points do), the decode entry points consume it, and
/// `clear`/`clear_payload` return it to an empty state for reuse.
/// `buffer_offset` is the read cursor while decoding and the write cursor
/// while encoding; `buffer_length` is the logical frame size, which the
/// buffer allocation always covers.
///
/// A message is not synchronized: it must be driven by one task at a time.
pub struct Message {
    tracked: bool,
    pub header: MessageHeader,
    buffer: Vec<u8>,
    buffer_length: usize,
    buffer_offset: usize,
    fds: FdSet,
    pub(crate) next: Option<Box<Message>>,
    release_hook: Option<ReleaseHook>,
}

impl Message {
    const NAME: &'static str = "Message";

    /// Creates an empty message.
    ///
    /// `tracked` marks messages the transport layer counts against its
    /// flight-control window; it survives [`Message::clear`] and is
    /// immutable for the lifetime of the message.
    pub fn new(tracked: bool) -> Self {
        debug!(tracked, "new message");

        Self {
            tracked,
            header: MessageHeader::default(),
            buffer: Vec::new(),
            buffer_length: 0,
            buffer_offset: 0,
            fds: FdSet::new(),
            next: None,
            release_hook: None,
        }
    }

    pub fn tracked(&self) -> bool {
        self.tracked
    }

    /// Logical frame size in bytes.
    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    /// Current cursor position; read cursor while decoding, write cursor
    /// while encoding, transfer progress while the connection layer is
    /// filling or draining the buffer.
    pub fn buffer_offset(&self) -> usize {
        self.buffer_offset
    }

    /// The whole logical frame.
    pub fn frame(&self) -> &[u8] {
        &self.buffer[..self.buffer_length]
    }

    /// Arms the buffer for an incoming frame: the connection layer must read
    /// exactly the length word before calling [`Message::decode_length`].
    pub fn start_receive(&mut self) {
        self.buffer_length = LEN_FIELD_SIZE;
        self.buffer_offset = 0;
        if self.buffer.len() < self.buffer_length {
            self.buffer.resize(self.buffer_length, 0);
        }
    }

    /// Bytes still to be transferred by the connection layer.
    pub fn pending(&self) -> &[u8] {
        &self.buffer[self.buffer_offset..self.buffer_length]
    }

    /// Mutable access to the yet-unfilled region, for the connection layer
    /// to read into.
    pub fn pending_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.buffer_offset..self.buffer_length]
    }

    /// Accounts `n` transferred bytes.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.buffer_offset + n <= self.buffer_length);
        self.buffer_offset += n;
    }

    /// Attached file descriptors.
    pub fn fds(&self) -> &FdSet {
        &self.fds
    }

    /// Mutable access to the file descriptor set, for the connection layer's
    /// incremental transfer bookkeeping.
    pub fn fds_mut(&mut self) -> &mut FdSet {
        &mut self.fds
    }

    /// Decodes the frame length word and prepares the buffer for the rest of
    /// the frame.
    ///
    /// Expects the buffer to hold exactly the first [`LEN_FIELD_SIZE`] bytes
    /// of a frame. On success `buffer_length` is the total frame size (the
    /// connection layer keeps reading until `buffer_offset` catches up with
    /// it) and `buffer_offset` sits past the length word.
    pub fn decode_length(&mut self) -> RpcResult<()> {
        let mut src = ReadCursor::new(&self.buffer[..self.buffer_length]);

        let total = src
            .try_read_u32()
            .map_err(|e| protocol_err!("decode_length", "unable to decode message length").with_source(e))?;
        let total = usize::try_from(total).unwrap_or(usize::MAX);

        // The length includes the length word itself. Anything too short to
        // also carry a header cannot be a real frame, so reject it here
        // rather than failing later with a misleading header error.
        if total < LEN_FIELD_SIZE + MessageHeader::SIZE {
            return Err(protocol_err!("decode_length", "packet received from peer too small"));
        }

        if total - LEN_FIELD_SIZE > MAX_PAYLOAD_SIZE {
            return Err(protocol_err!("decode_length", "packet received from peer too large"));
        }

        let pos = src.pos();

        self.buffer_length = total;
        self.buffer.resize(self.buffer_length, 0);
        self.buffer_offset = pos;

        debug!(
            total = self.buffer_length,
            remaining = self.buffer_length - self.buffer_offset,
            "got length, continuing to read"
        );

        Ok(())
    }

    /// Decodes the header of a completely received frame.
    ///
    /// Does not validate the decoded fields beyond their wire types. Upon
    /// return `buffer_offset` refers to the amount of the frame consumed by
    /// the header.
    pub fn decode_header(&mut self) -> RpcResult<()> {
        if self.buffer_length < LEN_FIELD_SIZE {
            return Err(internal_err!("decode_header", "unable to decode header until length is received"));
        }

        self.buffer_offset = LEN_FIELD_SIZE;

        let mut src = ReadCursor::new(&self.buffer[self.buffer_offset..self.buffer_length]);

        self.header = virtrpc_core::decode_cursor(&mut src)
            .map_err(|e| protocol_err!("decode_header", "unable to decode message header").with_source(e))?;

        self.buffer_offset += src.pos();

        Ok(())
    }

    /// Encodes the length word placeholder and the header, leaving the
    /// cursor ready for payload encoding.
    ///
    /// Upon return `buffer_length` is the space available to the frame and
    /// `buffer_offset` the space used by the header; the length word holds
    /// the header-only size until a payload encoder patches it.
    pub fn encode_header(&mut self) -> RpcResult<()> {
        self.buffer_length = INITIAL_PAYLOAD_CAPACITY + LEN_FIELD_SIZE;
        self.buffer.clear();
        self.buffer.resize(self.buffer_length, 0);
        self.buffer_offset = 0;

        let mut dst = WriteCursor::new(&mut self.buffer[..self.buffer_length]);

        // The real value is filled in when the payload is complete.
        dst.write_u32(0);

        self.header
            .encode(&mut dst)
            .map_err(|e| protocol_err!("encode_header", "unable to encode message header").with_source(e))?;

        self.buffer_offset = dst.pos();
        self.patch_length_word()?;

        Ok(())
    }

    /// Serializes `payload` after the header, growing the buffer as needed.
    ///
    /// The payload region (everything past the length word) starts at
    /// [`INITIAL_PAYLOAD_CAPACITY`] and doubles until the payload fits or
    /// [`MAX_PAYLOAD_SIZE`] would be exceeded. Each attempt starts from the
    /// same `buffer_offset`, so a failed probe leaves no partial data
    /// behind. On success the message is finalized for sending:
    /// `buffer_length` is the exact frame size and `buffer_offset` is zero.
    pub fn encode_payload<T>(&mut self, payload: &T) -> RpcResult<()>
    where
        T: Encode + ?Sized,
    {
        if self.buffer_length < LEN_FIELD_SIZE {
            return Err(internal_err!("encode_payload", "payload encoded before header"));
        }

        loop {
            let mut dst = WriteCursor::new(&mut self.buffer[self.buffer_offset..self.buffer_length]);

            match payload.encode(&mut dst) {
                Ok(()) => {
                    self.buffer_offset += dst.pos();
                    break;
                }
                Err(e) if matches!(e.kind(), EncodeErrorKind::NotEnoughBytes { .. }) => {
                    let grown = (self.buffer_length - LEN_FIELD_SIZE) * 2;

                    if grown > MAX_PAYLOAD_SIZE {
                        return Err(protocol_err!("encode_payload", "unable to encode message payload"));
                    }

                    self.buffer_length = grown + LEN_FIELD_SIZE;
                    self.buffer.resize(self.buffer_length, 0);

                    debug!(length = self.buffer_length, "increased message buffer");
                }
                Err(e) => {
                    return Err(protocol_err!("encode_payload", "unable to encode message payload").with_source(e));
                }
            }
        }

        self.patch_length_word()?;
        self.buffer_length = self.buffer_offset;
        self.buffer_offset = 0;

        Ok(())
    }

    /// Appends pre-serialized payload bytes after the header.
    ///
    /// Unlike [`Message::encode_payload`] the required size is known, so the
    /// buffer grows once, exactly. An empty `data` produces a header-only
    /// frame. Finalizes the message for sending on success.
    pub fn encode_payload_raw(&mut self, data: &[u8]) -> RpcResult<()> {
        if self.buffer_length < LEN_FIELD_SIZE {
            return Err(internal_err!("encode_payload_raw", "payload encoded before header"));
        }

        if !data.is_empty() {
            if self.buffer_length - self.buffer_offset < data.len() {
                if self.buffer_offset + data.len() > MAX_TOTAL_SIZE {
                    return Err(protocol_err!("encode_payload_raw", "stream data too long to send"));
                }

                self.buffer_length = self.buffer_offset + data.len();
                self.buffer.resize(self.buffer_length, 0);

                debug!(length = self.buffer_length, "increased message buffer");
            }

            self.buffer[self.buffer_offset..self.buffer_offset + data.len()].copy_from_slice(data);
            self.buffer_offset += data.len();
        }

        self.patch_length_word()?;
        self.buffer_length = self.buffer_offset;
        self.buffer_offset = 0;

        Ok(())
    }

    /// Deserializes a payload value from the remainder of the frame.
    ///
    /// Assumes [`Message::decode_header`] has run and starts at the current
    /// offset, advancing it by the bytes consumed; callers may chain decodes
    /// and are not required to consume the whole frame.
    pub fn decode_payload<T>(&mut self) -> RpcResult<T>
    where
        T: virtrpc_core::DecodeOwned,
    {
        let mut src = ReadCursor::new(&self.buffer[self.buffer_offset..self.buffer_length]);

        let value = virtrpc_core::decode_owned_cursor(&mut src)
            .map_err(|e| protocol_err!("decode_payload", "unable to decode message payload").with_source(e))?;

        self.buffer_offset += src.pos();

        Ok(value)
    }

    /// Encodes the number of attached file descriptors at the current offset.
    pub fn encode_num_fds(&mut self) -> RpcResult<()> {
        let num_fds = self.fds.len();

        if num_fds > MAX_FDS {
            return Err(protocol_err!("encode_num_fds", "too many FDs to send"));
        }

        let count = u32::try_from(num_fds).map_err(|_| protocol_err!("encode_num_fds", "too many FDs to send"))?;

        let mut dst = WriteCursor::new(&mut self.buffer[self.buffer_offset..self.buffer_length]);

        if dst.len() < size_of::<u32>() {
            return Err(protocol_err!("encode_num_fds", "unable to encode number of FDs"));
        }

        dst.write_u32(count);
        self.buffer_offset += dst.pos();

        debug!(num_fds, "sending FDs to peer");

        Ok(())
    }

    /// Decodes the number of passed file descriptors at the current offset
    /// and reserves slots for the connection layer to store them into.
    ///
    /// When slots already exist the set is left untouched, so the call is
    /// idempotent across partial-receive resumption.
    pub fn decode_num_fds(&mut self) -> RpcResult<usize> {
        let mut src = ReadCursor::new(&self.buffer[self.buffer_offset..self.buffer_length]);

        let num_fds = src
            .try_read_u32()
            .map_err(|e| protocol_err!("decode_num_fds", "unable to decode number of FDs").with_source(e))?;
        let num_fds = usize::try_from(num_fds).unwrap_or(usize::MAX);

        self.buffer_offset += src.pos();

        if num_fds > MAX_FDS {
            return Err(protocol_err!("decode_num_fds", "received too many FDs"));
        }

        self.fds.reserve_incoming(num_fds);

        debug!(num_fds = self.fds.len(), "expecting FDs from peer");

        Ok(self.fds.len())
    }

    /// Attaches a duplicate of `fd` (with close-on-exec set) to the message.
    /// The caller keeps its descriptor; the message owns the duplicate.
    pub fn add_fd(&mut self, fd: BorrowedFd<'_>) -> RpcResult<()> {
        self.fds.append(fd)
    }

    /// Returns a fresh duplicate (with close-on-exec set) of the descriptor
    /// at `slot`; the caller owns it.
    pub fn dup_fd(&self, slot: usize) -> RpcResult<OwnedFd> {
        self.fds.duplicate(slot)
    }

    /// Closes every owned descriptor and releases the slot storage.
    pub fn clear_fds(&mut self) {
        self.fds.clear();
    }

    /// Drops buffer and descriptors; header, queue linkage and release hook
    /// survive.
    pub fn clear_payload(&mut self) {
        self.clear_fds();

        self.buffer_offset = 0;
        self.buffer_length = 0;
        self.buffer = Vec::new();
    }

    /// Resets everything except `tracked`, for reuse of the allocation-free
    /// parts of the message.
    pub fn clear(&mut self) {
        debug!(num_fds = self.fds.len(), "clearing message");

        self.clear_payload();
        self.header = MessageHeader::default();
        self.next = None;
        self.release_hook = None;
    }

    /// Registers a hook run exactly once when the message is dropped, before
    /// descriptors are closed. Replaces any previously registered hook.
    ///
    /// The hook must not assume anything about the message contents beyond
    /// what it captured itself.
    pub fn set_release_hook(&mut self, hook: ReleaseHook) {
        self.release_hook = Some(hook);
    }

    fn patch_length_word(&mut self) -> RpcResult<()> {
        let len = u32::try_from(self.buffer_offset)
            .map_err(|_| internal_err!(Self::NAME, "frame length overflows the length word"))?;

        trace!(len, "encoded length");

        let mut dst = WriteCursor::new(&mut self.buffer[..LEN_FIELD_SIZE]);
        dst.write_u32(len);

        Ok(())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(Self::NAME)
            .field("tracked", &self.tracked)
            .field("header", &self.header)
            .field("buffer_length", &self.buffer_length)
            .field("buffer_offset", &self.buffer_offset)
            .field("fds", &self.fds)
            .finish_non_exhaustive()
    }
}

impl Drop for Message {
    fn drop(&mut self) {
        debug!(
            num_fds = self.fds.len(),
            has_hook = self.release_hook.is_some(),
            "dropping message"
        );

        if let Some(hook) = self.release_hook.take() {
            hook(self);
        }

        // Unlink any queued successors iteratively so a long chain does not
        // recurse through nested drops.
        let mut next = self.next.take();
        while let Some(mut msg) = next {
            next = msg.next.take();
        }
    }
}
