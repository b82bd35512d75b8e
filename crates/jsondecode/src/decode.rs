//! The [`Decode`] trait and the [`from_str`] entry point.

use alloc::{borrow::Cow, boxed::Box, collections::BTreeMap, string::String, vec::Vec};

use crate::{
    decoder::{Decoder, Mode},
    descriptor::{Descriptor, PrimitiveKind},
    error::{DecodingError, ErrorKind},
    options::DecoderOptions,
    reader::Reader,
};

/// A type that can be decoded from JSON text.
///
/// Implementations describe their shape through [`Decode::descriptor`] and
/// read themselves from a [`Decoder`] positioned at their value.
///
/// ```
/// use jsondecode::{Decode, Decoder, DecoderOptions, DecodingError, Descriptor, Field};
///
/// #[derive(Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Decode for Point {
///     fn descriptor() -> Descriptor {
///         Descriptor::class(
///             "Point",
///             [Field::new("x", i32::descriptor()), Field::new("y", i32::descriptor())],
///         )
///     }
///
///     fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
///         let descriptor = Self::descriptor();
///         let mut fields = decoder.begin_structure(&descriptor)?;
///         let (mut x, mut y) = (0, 0);
///         while let Some(index) = fields.decode_element_index(&descriptor)? {
///             match index {
///                 0 => x = fields.decode_int()?,
///                 _ => y = fields.decode_int()?,
///             }
///         }
///         fields.end_structure(&descriptor)?;
///         Ok(Point { x, y })
///     }
/// }
///
/// let point: Point = jsondecode::from_str(r#"{"y": 2, "x": 1}"#, DecoderOptions::default())?;
/// assert_eq!(point, Point { x: 1, y: 2 });
/// # Ok::<(), DecodingError>(())
/// ```
pub trait Decode: Sized {
    /// The shape of `Self`.
    fn descriptor() -> Descriptor;

    /// Reads a `Self` from `decoder`.
    ///
    /// # Errors
    ///
    /// Any failure while reading; the decode cannot continue afterwards.
    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError>;
}

/// Decodes a `T` from the whole of `text`.
///
/// # Errors
///
/// Any [`DecodingError`] raised while decoding, or content after the value
/// unless [`DecoderOptions::allow_trailing_content`] is set.
pub fn from_str<T: Decode>(text: &str, options: DecoderOptions) -> Result<T, DecodingError> {
    let mut reader = Reader::new(text);
    #[cfg(any(test, feature = "fuzzing"))]
    reader.set_panic_on_error(options.panic_on_error);
    let value = Decoder::new(&mut reader, Mode::Object, &options).decode_serializable_value()?;
    if !options.allow_trailing_content {
        reader.expect_eof()?;
    }
    Ok(value)
}

impl Decode for bool {
    fn descriptor() -> Descriptor {
        Descriptor::primitive("bool", PrimitiveKind::Boolean)
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        decoder.decode_boolean()
    }
}

macro_rules! impl_decode_primitive {
    ($($t:ty => $kind:ident, $method:ident;)+) => {
        $(
            impl Decode for $t {
                fn descriptor() -> Descriptor {
                    Descriptor::primitive(stringify!($t), PrimitiveKind::$kind)
                }

                fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
                    decoder.$method()
                }
            }
        )+
    };
}

impl_decode_primitive! {
    i8 => Byte, decode_byte;
    i16 => Short, decode_short;
    i32 => Int, decode_int;
    i64 => Long, decode_long;
    f32 => Float, decode_float;
    f64 => Double, decode_double;
    char => Char, decode_char;
}

macro_rules! impl_decode_unsigned {
    ($($t:ty as $signed:ty => $method:ident;)+) => {
        $(
            impl Decode for $t {
                fn descriptor() -> Descriptor {
                    Descriptor::unsigned(stringify!($t), <$signed>::descriptor())
                }

                fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
                    let bits = decoder.decode_inline(&Self::descriptor()).$method()?;
                    Ok(<$t>::from_ne_bytes(bits.to_ne_bytes()))
                }
            }
        )+
    };
}

impl_decode_unsigned! {
    u8 as i8 => decode_byte;
    u16 as i16 => decode_short;
    u32 as i32 => decode_int;
    u64 as i64 => decode_long;
}

impl Decode for String {
    fn descriptor() -> Descriptor {
        Descriptor::primitive("string", PrimitiveKind::String)
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        decoder.decode_string().map(Cow::into_owned)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn descriptor() -> Descriptor {
        T::descriptor().nullable()
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        decoder.decode_nullable_serializable_value()
    }
}

impl<T: Decode> Decode for Box<T> {
    fn descriptor() -> Descriptor {
        T::descriptor()
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        T::decode(decoder).map(Box::new)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn descriptor() -> Descriptor {
        Descriptor::list(T::descriptor())
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        let descriptor = Self::descriptor();
        let mut elements = decoder.begin_structure(&descriptor)?;
        let mut out = Vec::new();
        while elements.decode_element_index(&descriptor)?.is_some() {
            out.push(elements.decode_serializable_value()?);
        }
        elements.end_structure(&descriptor)?;
        Ok(out)
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn descriptor() -> Descriptor {
        Descriptor::map(K::descriptor(), V::descriptor())
    }

    fn decode(decoder: &mut Decoder<'_, '_>) -> Result<Self, DecodingError> {
        let descriptor = Self::descriptor();
        let mut entries = decoder.begin_structure(&descriptor)?;
        let mut out = BTreeMap::new();
        while entries.decode_element_index(&descriptor)?.is_some() {
            let key = entries.decode_serializable_value()?;
            if entries.decode_element_index(&descriptor)?.is_none() {
                return Err(entries.fail(
                    ErrorKind::Structural,
                    "Expected a value after the map key",
                ));
            }
            out.insert(key, entries.decode_serializable_value()?);
        }
        entries.end_structure(&descriptor)?;
        Ok(out)
    }
}
