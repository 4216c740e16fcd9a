use virtrpc_core::{decode_owned, encode_vec};
use virtrpc_proto::{clear_last_error, code, domain, level, raise, RaisedError, WireError};

#[test]
fn first_error_wins() {
    clear_last_error();
    raise(RaisedError::new(code::PROTOCOL, domain::RPC, "bad frame length"));

    let mut record = WireError::default();
    record.capture_last();
    assert_eq!(record.code, code::PROTOCOL);
    assert_eq!(record.message.as_deref(), Some("bad frame length"));

    // A later failure on the cleanup path must not replace the cause.
    raise(RaisedError::new(code::SYSTEM, domain::RPC, "close failed"));
    record.capture_last();
    assert_eq!(record.code, code::PROTOCOL);
    assert_eq!(record.message.as_deref(), Some("bad frame length"));
}

#[test]
fn empty_slot_yields_internal_sentinel() {
    clear_last_error();

    let mut record = WireError::default();
    record.capture_last();

    assert_eq!(record.code, code::INTERNAL);
    assert_eq!(record.domain, domain::RPC);
    assert_eq!(record.level, level::ERROR);
    assert!(record.message.is_some());
}

#[test]
fn capture_copies_auxiliary_fields() {
    clear_last_error();
    raise(RaisedError {
        code: code::SYSTEM,
        domain: domain::RPC,
        level: level::WARNING,
        message: Some("dup failed".to_owned()),
        str1: Some("fd".to_owned()),
        str2: None,
        str3: Some("EBADF".to_owned()),
        int1: 9,
        int2: -1,
    });

    let mut record = WireError::default();
    record.capture_last();

    assert_eq!(record.level, level::WARNING);
    assert_eq!(record.str1.as_deref(), Some("fd"));
    assert_eq!(record.str2, None);
    assert_eq!(record.str3.as_deref(), Some("EBADF"));
    assert_eq!(record.int1, 9);
    assert_eq!(record.int2, -1);
}

#[test]
fn record_roundtrips() {
    let record = WireError {
        code: code::PROTOCOL,
        domain: domain::RPC,
        message: Some("packet received from peer too large".to_owned()),
        level: level::ERROR,
        str1: None,
        str2: Some("aux".to_owned()),
        str3: None,
        int1: 42,
        int2: 0,
    };

    let bytes = encode_vec(&record).unwrap();
    assert_eq!(decode_owned::<WireError>(&bytes).unwrap(), record);
}

#[test]
fn unset_record_roundtrips() {
    let record = WireError::default();

    let bytes = encode_vec(&record).unwrap();
    // Five numeric words and four absent optional strings.
    assert_eq!(bytes.len(), 9 * 4);
    assert_eq!(decode_owned::<WireError>(&bytes).unwrap(), record);
}
