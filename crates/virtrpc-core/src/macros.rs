//! Helper macros for encoding and decoding
//!
//! Some are exported and available to external crates

/// Fails the surrounding function with a "not enough bytes" error when the
/// cursor holds fewer than `size` bytes.
#[macro_export]
macro_rules! ensure_size {
    (ctx: $ctx:expr, in: $buf:ident, size: $expected:expr) => {{
        let received = $buf.len();
        let expected = $expected;
        if !(received >= expected) {
            return Err($crate::not_enough_bytes_err($ctx, received, expected));
        }
    }};
    (in: $buf:ident, size: $expected:expr) => {{
        $crate::ensure_size!(ctx: Self::NAME, in: $buf, size: $expected)
    }};
}

/// Shorthand for [`ensure_size!`] with `Self::FIXED_PART_SIZE`.
#[macro_export]
macro_rules! ensure_fixed_part_size {
    (in: $buf:ident) => {{
        $crate::ensure_size!(ctx: Self::NAME, in: $buf, size: Self::FIXED_PART_SIZE)
    }};
}

/// Fallible integer narrowing reported as an "invalid field" error.
#[macro_export]
macro_rules! cast_length {
    ($ctx:expr, $field:expr, $len:expr) => {{
        $len.try_into()
            .map_err(|_| $crate::invalid_field_err($ctx, $field, "too many elements"))
    }};
    ($field:expr, $len:expr) => {{
        $crate::cast_length!(Self::NAME, $field, $len)
    }};
}

/// Creates an "invalid field" error.
#[macro_export]
macro_rules! invalid_field_err {
    ( $context:expr, $field:expr , $reason:expr $(,)? ) => {{
        $crate::invalid_field_err($context, $field, $reason)
    }};
    ( $field:expr , $reason:expr $(,)? ) => {{
        $crate::invalid_field_err!(Self::NAME, $field, $reason)
    }};
}

/// Creates an "unexpected message type" error.
#[macro_export]
macro_rules! unexpected_message_type_err {
    ( $context:expr, $got:expr $(,)? ) => {{
        $crate::unexpected_message_type_err($context, $got)
    }};
    ( $got:expr $(,)? ) => {{
        $crate::unexpected_message_type_err!(Self::NAME, $got)
    }};
}

/// Creates a generic "other" error.
#[macro_export]
macro_rules! other_err {
    ( $context:expr, $description:expr $(,)? ) => {{
        $crate::other_err($context, $description)
    }};
    ( $description:expr $(,)? ) => {{
        $crate::other_err!(Self::NAME, $description)
    }};
}

/// Asserts that the traits support dynamic dispatch.
///
/// From <https://docs.rs/static_assertions/latest/src/static_assertions/assert_obj_safe.rs.html#72-76>
#[macro_export]
macro_rules! assert_obj_safe {
    ($($xs:path),+ $(,)?) => {
        $(const _: Option<&dyn $xs> = None;)+
    };
}

/// Implements [`DecodeOwned`](crate::DecodeOwned) for a plain old data structure
/// already implementing [`Decode`](crate::Decode).
#[macro_export]
macro_rules! impl_decode_owned {
    ($ty:ty) => {
        impl $crate::DecodeOwned for $ty {
            fn decode_owned(src: &mut $crate::ReadCursor<'_>) -> $crate::DecodeResult<Self> {
                <Self as $crate::Decode<'_>>::decode(src)
            }
        }
    };
}
