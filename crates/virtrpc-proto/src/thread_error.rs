use std::cell::RefCell;

use crate::wire_error::{code, domain, level};
use crate::{RpcError, RpcErrorKind};

/// The most recent error reported on the current thread.
///
/// Mirrors the record dispatch layers forward to peers: a numeric code and
/// domain, a severity level, a human-readable message and up to three
/// auxiliary strings and two auxiliary integers whose meaning depends on the
/// code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaisedError {
    pub code: i32,
    pub domain: i32,
    pub level: i32,
    pub message: Option<String>,
    pub str1: Option<String>,
    pub str2: Option<String>,
    pub str3: Option<String>,
    pub int1: i32,
    pub int2: i32,
}

impl RaisedError {
    /// An error-level record with the given code and message.
    pub fn new(code: i32, domain: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            domain,
            level: level::ERROR,
            message: Some(message.into()),
            str1: None,
            str2: None,
            str3: None,
            int1: 0,
            int2: 0,
        }
    }
}

impl From<&RpcError> for RaisedError {
    fn from(error: &RpcError) -> Self {
        let code = match error.kind() {
            RpcErrorKind::Protocol { .. } => code::PROTOCOL,
            RpcErrorKind::System => code::SYSTEM,
            _ => code::INTERNAL,
        };

        Self::new(code, domain::RPC, error.report().to_string())
    }
}

thread_local! {
    // Per-thread by contract with the surrounding runtime: workers report
    // into their own slot and snapshot it before any cleanup runs.
    static LAST_ERROR: RefCell<Option<RaisedError>> = const { RefCell::new(None) };
}

/// Records `error` as the current thread's last error, replacing any
/// previous one.
pub fn raise(error: RaisedError) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(error));
}

/// Returns a copy of the current thread's last error, if any.
pub fn last_error() -> Option<RaisedError> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Empties the current thread's last-error slot.
pub fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}
