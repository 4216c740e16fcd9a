//! XDR primitive encodings
//!
//! The wire representation is the External Data Representation standard:
//! big-endian words, every item padded to a multiple of four bytes. Plain
//! integers and `bool` encode as single words; strings and opaque byte
//! sequences carry a length word followed by their bytes and zero padding.

use crate::{
    pad4, read_padding, write_padding, Decode, DecodeOwned, DecodeResult, Encode, EncodeResult, ReadCursor,
    WriteCursor,
};

impl Encode for u32 {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(ctx: "XDR_UNSIGNED", in: dst, size: 4);
        dst.write_u32(*self);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "XDR_UNSIGNED"
    }

    fn size(&self) -> usize {
        4
    }
}

impl Decode<'_> for u32 {
    fn decode(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_size!(ctx: "XDR_UNSIGNED", in: src, size: 4);
        Ok(src.read_u32())
    }
}

impl Encode for i32 {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(ctx: "XDR_INT", in: dst, size: 4);
        dst.write_i32(*self);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "XDR_INT"
    }

    fn size(&self) -> usize {
        4
    }
}

impl Decode<'_> for i32 {
    fn decode(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_size!(ctx: "XDR_INT", in: src, size: 4);
        Ok(src.read_i32())
    }
}

impl Encode for u64 {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(ctx: "XDR_UHYPER", in: dst, size: 8);
        dst.write_u64(*self);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "XDR_UHYPER"
    }

    fn size(&self) -> usize {
        8
    }
}

impl Decode<'_> for u64 {
    fn decode(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_size!(ctx: "XDR_UHYPER", in: src, size: 8);
        Ok(src.read_u64())
    }
}

impl Encode for i64 {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(ctx: "XDR_HYPER", in: dst, size: 8);
        dst.write_i64(*self);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "XDR_HYPER"
    }

    fn size(&self) -> usize {
        8
    }
}

impl Decode<'_> for i64 {
    fn decode(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_size!(ctx: "XDR_HYPER", in: src, size: 8);
        Ok(src.read_i64())
    }
}

impl Encode for bool {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(ctx: "XDR_BOOL", in: dst, size: 4);
        dst.write_u32(u32::from(*self));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "XDR_BOOL"
    }

    fn size(&self) -> usize {
        4
    }
}

impl Decode<'_> for bool {
    fn decode(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_size!(ctx: "XDR_BOOL", in: src, size: 4);
        match src.read_u32() {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(invalid_field_err!("XDR_BOOL", "value", "neither TRUE nor FALSE")),
        }
    }
}

impl_decode_owned!(u32);
impl_decode_owned!(i32);
impl_decode_owned!(u64);
impl_decode_owned!(i64);
impl_decode_owned!(bool);

/// An XDR string: length word, UTF-8 bytes, zero padding to a word boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XdrString(String);

impl XdrString {
    const NAME: &'static str = "XDR_STRING";
    const FIXED_PART_SIZE: usize = 4;

    /// Creates a new `XdrString`. Fails if the byte length overflows the length word.
    pub fn new(value: impl Into<String>) -> EncodeResult<Self> {
        let value = value.into();

        // The length word counts encoded UTF-8 bytes, not characters.
        let _: u32 = cast_length!(Self::NAME, "string length", value.as_bytes().len())?;

        Ok(Self(value))
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Encode for XdrString {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(in: dst, size: self.size());

        let len = self.0.as_bytes().len();

        dst.write_u32(u32::try_from(len).map_err(|_| invalid_field_err!("string length", "too long"))?);
        dst.write_slice(self.0.as_bytes());
        write_padding(dst, len);

        Ok(())
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn size(&self) -> usize {
        let len = self.0.as_bytes().len();
        Self::FIXED_PART_SIZE + len + pad4(len)
    }
}

impl DecodeOwned for XdrString {
    fn decode_owned(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let len = usize::try_from(src.read_u32()).map_err(|_| invalid_field_err!("string length", "too long"))?;

        ensure_size!(in: src, size: len + pad4(len));

        let value = String::from_utf8(src.read_slice(len).to_vec())
            .map_err(|_| invalid_field_err!("string bytes", "not valid UTF-8"))?;
        read_padding(src, len);

        Ok(Self(value))
    }
}

/// A variable-length XDR opaque: length word, raw bytes, zero padding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XdrOpaque(Vec<u8>);

impl XdrOpaque {
    const NAME: &'static str = "XDR_OPAQUE";
    const FIXED_PART_SIZE: usize = 4;

    /// Creates a new `XdrOpaque`. Fails if the byte length overflows the length word.
    pub fn new(value: impl Into<Vec<u8>>) -> EncodeResult<Self> {
        let value = value.into();

        let _: u32 = cast_length!(Self::NAME, "opaque length", value.len())?;

        Ok(Self(value))
    }

    pub fn value(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Encode for XdrOpaque {
    fn encode(&self, dst: &mut WriteCursor<'_>) -> EncodeResult<()> {
        ensure_size!(in: dst, size: self.size());

        let len = self.0.len();

        dst.write_u32(u32::try_from(len).map_err(|_| invalid_field_err!("opaque length", "too long"))?);
        dst.write_slice(&self.0);
        write_padding(dst, len);

        Ok(())
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn size(&self) -> usize {
        Self::FIXED_PART_SIZE + self.0.len() + pad4(self.0.len())
    }
}

impl DecodeOwned for XdrOpaque {
    fn decode_owned(src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let len = usize::try_from(src.read_u32()).map_err(|_| invalid_field_err!("opaque length", "too long"))?;

        ensure_size!(in: src, size: len + pad4(len));

        let value = src.read_slice(len).to_vec();
        read_padding(src, len);

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_owned, encode_vec};

    #[test]
    fn string_pads_to_word_boundary() {
        let s = XdrString::new("hello").unwrap();
        let bytes = encode_vec(&s).unwrap();
        assert_eq!(bytes, [0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o', 0, 0, 0]);
        assert_eq!(decode_owned::<XdrString>(&bytes).unwrap(), s);
    }

    #[test]
    fn opaque_empty_is_single_word() {
        let o = XdrOpaque::new(Vec::new()).unwrap();
        assert_eq!(encode_vec(&o).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn string_rejects_truncated_padding() {
        // length word says 5 bytes, but the padded region is cut short
        let bytes = [0u8, 0, 0, 5, b'h', b'e', b'l', b'l', b'o'];
        assert!(decode_owned::<XdrString>(&bytes).is_err());
    }
}
