#![cfg_attr(doc, doc = include_str!("../README.md"))]

// The codec casts u32 wire lengths to usize without further checks; rule out
// exotic 16-bit targets at compile time.
const _: () = assert!(size_of::<usize>() >= 4);

#[macro_use]
mod macros;

mod cursor;
mod decode;
mod encode;
mod error;
mod padding;
mod xdr;

// Flat API hierarchy of common traits and types

pub use self::cursor::*;
pub use self::decode::*;
pub use self::encode::*;
pub use self::error::*;
pub use self::padding::*;
pub use self::xdr::*;
