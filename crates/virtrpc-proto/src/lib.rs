#![cfg_attr(doc, doc = include_str!("../README.md"))]

use core::fmt;

#[macro_use]
mod macros;

mod fds;
mod header;
mod message;
mod queue;
mod thread_error;
mod wire_error;

pub use self::fds::FdSet;
pub use self::header::{MessageHeader, MessageStatus, MessageType};
pub use self::message::{
    Message, ReleaseHook, INITIAL_PAYLOAD_CAPACITY, LEN_FIELD_SIZE, MAX_FDS, MAX_PAYLOAD_SIZE, MAX_TOTAL_SIZE,
};
pub use self::queue::MessageQueue;
pub use self::thread_error::{clear_last_error, last_error, raise, RaisedError};
pub use self::wire_error::{code, domain, level, WireError};

/// A result type for codec operations, which can either succeed with a value
/// of type `T` or fail with an [`RpcError`].
pub type RpcResult<T> = Result<T, RpcError>;

/// The error type shared by all codec entry points.
pub type RpcError = virtrpc_core::Error<RpcErrorKind>;

/// Failure categories of the RPC codec.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum RpcErrorKind {
    /// Malformed wire data: bad length, undecodable header or payload, FD
    /// count over the limit.
    Protocol { description: &'static str },
    /// API misuse: an operation invoked on a message in the wrong state.
    Internal { description: &'static str },
    /// An OS-level operation failed; the `io::Error` is attached as source.
    System,
}

impl std::error::Error for RpcErrorKind {}

impl fmt::Display for RpcErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol { description } => {
                write!(f, "protocol violation: {description}")
            }
            Self::Internal { description } => {
                write!(f, "internal error: {description}")
            }
            Self::System => {
                write!(f, "system call failed")
            }
        }
    }
}

/// Constructors for [`RpcError`].
pub trait RpcErrorExt {
    fn protocol(context: &'static str, description: &'static str) -> Self;
    fn internal(context: &'static str, description: &'static str) -> Self;
    fn system<E>(context: &'static str, source: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static;
}

impl RpcErrorExt for RpcError {
    fn protocol(context: &'static str, description: &'static str) -> Self {
        Self::new(context, RpcErrorKind::Protocol { description })
    }

    fn internal(context: &'static str, description: &'static str) -> Self {
        Self::new(context, RpcErrorKind::Internal { description })
    }

    fn system<E>(context: &'static str, source: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        Self::new(context, RpcErrorKind::System).with_source(source)
    }
}
