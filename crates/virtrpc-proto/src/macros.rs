//! Shorthand constructors for [`RpcError`](crate::RpcError)

/// Creates an `RpcError` with `Protocol` kind.
#[macro_export]
macro_rules! protocol_err {
    ( $context:expr, $description:expr $(,)? ) => {{
        <$crate::RpcError as $crate::RpcErrorExt>::protocol($context, $description)
    }};
}

/// Creates an `RpcError` with `Internal` kind.
#[macro_export]
macro_rules! internal_err {
    ( $context:expr, $description:expr $(,)? ) => {{
        <$crate::RpcError as $crate::RpcErrorExt>::internal($context, $description)
    }};
}

/// Creates an `RpcError` with `System` kind from an OS error.
#[macro_export]
macro_rules! system_err {
    ( $context:expr, $source:expr $(,)? ) => {{
        <$crate::RpcError as $crate::RpcErrorExt>::system($context, $source)
    }};
}
