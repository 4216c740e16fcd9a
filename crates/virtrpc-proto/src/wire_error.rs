use virtrpc_core::{
    ensure_size, invalid_field_err, pad4, read_padding, write_padding, DecodeOwned, DecodeResult, Encode,
    EncodeResult, ReadCursor, WriteCursor,
};

use crate::thread_error;

/// Numeric error codes carried on the wire.
pub mod code {
    /// Success sentinel; a record with this code is considered unset.
    pub const OK: i32 = 0;
    /// Failure inside the daemon or library, not attributable to the peer.
    pub const INTERNAL: i32 = 1;
    /// Malformed or out-of-bounds wire data.
    pub const PROTOCOL: i32 = 2;
    /// An operating system call failed.
    pub const SYSTEM: i32 = 3;
}

/// Subsystem the error originated from.
pub mod domain {
    pub const NONE: i32 = 0;
    /// The RPC transport and codec layer.
    pub const RPC: i32 = 1;
}

/// Severity of a reported error.
pub mod level {
    pub const NONE: i32 = 0;
    pub const WARNING: i32 = 1;
    pub const ERROR: i32 = 2;
}

/// The structured error payload of a reply with status `Error`.
///
/// Field meanings match [`RaisedError`](crate::RaisedError); the strings are
/// optional on the wire (a presence word followed by the string when set).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WireError {
    pub code: i32,
    pub domain: i32,
    pub message: Option<String>,
    pub level: i32,
    pub str1: Option<String>,
    pub str2: Option<String>,
    pub str3: Option<String>,
    pub int1: i32,
    pub int2: i32,
}

impl WireError {
    pub const NAME: &'static str = "WireError";

    /// Snapshots the current thread's last error into this record.
    ///
    /// May be called several times along a failure path; only the first call
    /// takes effect, so cleanup code cannot overwrite the original cause.
    /// When no error was raised on this thread the record is filled with an
    /// internal-error note saying so.
    pub fn capture_last(&mut self) {
        if self.code != code::OK {
            return;
        }

        *self = Self::default();

        match thread_error::last_error() {
            Some(err) => {
                self.code = err.code;
                self.domain = err.domain;
                self.message = err.message;
                self.level = err.level;
                self.str1 = err.str1;
                self.str2 = err.str2;
                self.str3 = err.str3;
                self.int1 = err.int1;
                self.int2 = err.int2;
            }
            None => {
                self.code = code::INTERNAL;
                self.domain = domain::RPC;
                self.level = level::ERROR;
                self.message = Some("library function returned an error but did not set the last error".to_owned());
            }
        }
    }
}

impl Encode for WireError {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(in: dst, size: self.size());

        dst.write_i32(self.code);
        dst.write_i32(self.domain);
        encode_opt_string(dst, self.message.as_deref())?;
        dst.write_i32(self.level);
        encode_opt_string(dst, self.str1.as_deref())?;
        encode_opt_string(dst, self.str2.as_deref())?;
        encode_opt_string(dst, self.str3.as_deref())?;
        dst.write_i32(self.int1);
        dst.write_i32(self.int2);

        Ok(())
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn size(&self) -> usize {
        5 * 4
            + opt_string_size(self.message.as_deref())
            + opt_string_size(self.str1.as_deref())
            + opt_string_size(self.str2.as_deref())
            + opt_string_size(self.str3.as_deref())
    }
}

impl DecodeOwned for WireError {
    fn decode_owned(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        let code = decode_i32(src)?;
        let domain = decode_i32(src)?;
        let message = decode_opt_string(src)?;
        let level = decode_i32(src)?;
        let str1 = decode_opt_string(src)?;
        let str2 = decode_opt_string(src)?;
        let str3 = decode_opt_string(src)?;
        let int1 = decode_i32(src)?;
        let int2 = decode_i32(src)?;

        Ok(Self {
            code,
            domain,
            message,
            level,
            str1,
            str2,
            str3,
            int1,
            int2,
        })
    }
}

fn opt_string_size(value: Option<&str>) -> usize {
    match value {
        Some(s) => 4 + 4 + s.len() + pad4(s.len()),
        None => 4,
    }
}

// XDR optional data: a presence word, then the value when present.

fn encode_opt_string(dst: &mut WriteCursor<'_>, value: Option<&str>) -> EncodeResult<()> {
    match value {
        Some(s) => {
            let len = s.len();
            let len_word = u32::try_from(len)
                .map_err(|_| invalid_field_err(WireError::NAME, "string length", "too long"))?;

            dst.write_u32(1);
            dst.write_u32(len_word);
            dst.write_slice(s.as_bytes());
            write_padding(dst, len);
        }
        None => dst.write_u32(0),
    }

    Ok(())
}

fn decode_i32(src: &mut ReadCursor<'_>) -> DecodeResult<i32> {
    ensure_size!(ctx: WireError::NAME, in: src, size: 4);
    Ok(src.read_i32())
}

fn decode_opt_string(src: &mut ReadCursor<'_>) -> DecodeResult<Option<String>> {
    ensure_size!(ctx: WireError::NAME, in: src, size: 4);

    match src.read_u32() {
        0 => Ok(None),
        1 => {
            ensure_size!(ctx: WireError::NAME, in: src, size: 4);
            let len = usize::try_from(src.read_u32()).unwrap_or(usize::MAX);

            ensure_size!(ctx: WireError::NAME, in: src, size: len + pad4(len));

            let value = String::from_utf8(src.read_slice(len).to_vec())
                .map_err(|_| invalid_field_err(WireError::NAME, "string bytes", "not valid UTF-8"))?;
            read_padding(src, len);

            Ok(Some(value))
        }
        _ => Err(invalid_field_err(
            WireError::NAME,
            "optional string",
            "presence word is neither 0 nor 1",
        )),
    }
}
