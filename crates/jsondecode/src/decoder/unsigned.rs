//! Decoding of inline values, including unsigned integers carried in
//! signed slots.

use super::{Decoder, parse_literal};
use crate::{error::DecodingError, reader::Reader};

/// Parses unsigned literals of each width and hands back the bit pattern as
/// the signed type of the same width, so `255` read as a byte is `-1`.
#[derive(Debug)]
pub struct UnsignedDecoder<'d, 'src> {
    reader: &'d mut Reader<'src>,
}

impl<'d, 'src> UnsignedDecoder<'d, 'src> {
    pub(super) fn new(reader: &'d mut Reader<'src>) -> Self {
        Self { reader }
    }

    /// # Errors
    ///
    /// If the literal is not a `u8`.
    pub fn decode_byte(&mut self) -> Result<i8, DecodingError> {
        let value: u8 = parse_literal(self.reader, "u8")?;
        Ok(i8::from_ne_bytes(value.to_ne_bytes()))
    }

    /// # Errors
    ///
    /// If the literal is not a `u16`.
    pub fn decode_short(&mut self) -> Result<i16, DecodingError> {
        let value: u16 = parse_literal(self.reader, "u16")?;
        Ok(i16::from_ne_bytes(value.to_ne_bytes()))
    }

    /// # Errors
    ///
    /// If the literal is not a `u32`.
    pub fn decode_int(&mut self) -> Result<i32, DecodingError> {
        let value: u32 = parse_literal(self.reader, "u32")?;
        Ok(i32::from_ne_bytes(value.to_ne_bytes()))
    }

    /// # Errors
    ///
    /// If the literal is not a `u64`.
    pub fn decode_long(&mut self) -> Result<i64, DecodingError> {
        let value: u64 = parse_literal(self.reader, "u64")?;
        Ok(i64::from_ne_bytes(value.to_ne_bytes()))
    }
}

/// The decoder returned by [`Decoder::decode_inline`].
#[derive(Debug)]
pub enum InlineDecoder<'d, 'src> {
    /// The value is decoded like any other.
    Signed(Decoder<'d, 'src>),
    /// The value is an unsigned integer.
    Unsigned(UnsignedDecoder<'d, 'src>),
}

macro_rules! dispatch {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty;)*) => {$(
        $(#[$doc])*
        pub fn $name(&mut self) -> Result<$ty, DecodingError> {
            match self {
                InlineDecoder::Signed(decoder) => decoder.$name(),
                InlineDecoder::Unsigned(decoder) => decoder.$name(),
            }
        }
    )*};
}

impl InlineDecoder<'_, '_> {
    dispatch! {
        /// # Errors
        ///
        /// If the literal does not fit in 8 bits.
        decode_byte -> i8;
        /// # Errors
        ///
        /// If the literal does not fit in 16 bits.
        decode_short -> i16;
        /// # Errors
        ///
        /// If the literal does not fit in 32 bits.
        decode_int -> i32;
        /// # Errors
        ///
        /// If the literal does not fit in 64 bits.
        decode_long -> i64;
    }
}
