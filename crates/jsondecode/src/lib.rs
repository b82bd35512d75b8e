//! Descriptor-driven JSON decoding.
//!
//! The decoder reads a complete JSON text into strongly typed values. What
//! it expects at each position comes from a [`Descriptor`]: classes become
//! objects with named fields, lists become arrays, maps become objects read
//! as key/value pairs, and polymorphic values become a `{"type", "value"}`
//! wrapper. Types describe and read themselves through the [`Decode`] trait.
//!
//! Strings without escapes are never copied; the reader hands out slices of
//! the input and only unescapes into a scratch buffer when it meets a
//! backslash.
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use jsondecode::DecoderOptions;
//!
//! let scores: BTreeMap<String, Vec<u32>> =
//!     jsondecode::from_str(r#"{"ann": [3, 9], "bob": []}"#, DecoderOptions::default())?;
//! assert_eq!(scores["ann"], [3, 9]);
//! # Ok::<(), jsondecode::DecodingError>(())
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod char_class;
mod decode;
mod decoder;
mod descriptor;
mod error;
mod options;
mod reader;
mod unicode;

pub use char_class::{TokenClass, byte_to_token_class, char_to_token_class, escape_to_char};
pub use decode::{Decode, from_str};
pub use decoder::{Decoder, InlineDecoder, Mode, UnsignedDecoder};
pub use descriptor::{Descriptor, Field, Kind, Name, PrimitiveKind};
pub use error::{DecodingError, ErrorKind};
pub use options::DecoderOptions;
pub use reader::{Reader, Snapshot};
