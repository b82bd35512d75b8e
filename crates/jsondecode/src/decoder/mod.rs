//! Descriptor-driven decoding on top of a [`Reader`].
//!
//! A [`Decoder`] stands for one structural level of the document. It knows
//! the [`Mode`] of that level and an element cursor, and answers one
//! question repeatedly: which element comes next? The caller decodes that
//! element (a primitive through the `decode_*` methods, or a nested value
//! through [`Decoder::begin_structure`]) and asks again until the level is
//! done.
//!
//! All levels share the one reader by mutable reborrow. A child decoder
//! borrows its parent's reader for as long as it lives, so only the
//! innermost level can move the cursor.

mod unsigned;

use alloc::{borrow::Cow, format, string::String};
use core::str::FromStr;

use log::{debug, trace};

pub use self::unsigned::{InlineDecoder, UnsignedDecoder};
use crate::{
    char_class::TokenClass,
    decode::Decode,
    descriptor::{Descriptor, Kind},
    error::{DecodingError, ErrorKind},
    options::DecoderOptions,
    reader::Reader,
};

/// The structural context of a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `{...}` with named fields.
    Object,
    /// `[...]` with positional elements.
    Array,
    /// `{...}` read as alternating keys and values.
    Map,
    /// `{"type": ..., "value": ...}`.
    PolymorphicWrapper,
}

impl Mode {
    #[must_use]
    pub fn for_descriptor(descriptor: &Descriptor) -> Self {
        match descriptor.kind() {
            Kind::List { .. } => Mode::Array,
            Kind::Map { .. } => Mode::Map,
            Kind::Polymorphic { .. } => Mode::PolymorphicWrapper,
            Kind::Class { .. }
            | Kind::Primitive(_)
            | Kind::Enum { .. }
            | Kind::Inline { .. }
            | Kind::Contextual => Mode::Object,
        }
    }

    #[must_use]
    pub fn begin_token(self) -> TokenClass {
        match self {
            Mode::Array => TokenClass::BeginArray,
            Mode::Object | Mode::Map | Mode::PolymorphicWrapper => TokenClass::BeginObject,
        }
    }

    #[must_use]
    pub fn end_token(self) -> TokenClass {
        match self {
            Mode::Array => TokenClass::EndArray,
            Mode::Object | Mode::Map | Mode::PolymorphicWrapper => TokenClass::EndObject,
        }
    }
}

/// One structural level of a decode.
#[derive(Debug)]
pub struct Decoder<'r, 'src> {
    reader: &'r mut Reader<'src>,
    options: &'r DecoderOptions,
    mode: Mode,
    // -1 before the first element. In map mode odd values (and -1) mean the
    // next element is a key.
    current_index: isize,
}

impl<'r, 'src> Decoder<'r, 'src> {
    pub fn new(reader: &'r mut Reader<'src>, mode: Mode, options: &'r DecoderOptions) -> Self {
        Self {
            reader,
            options,
            mode,
            current_index: -1,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn options(&self) -> &DecoderOptions {
        self.options
    }

    /// Builds an error at the current position.
    #[must_use]
    pub fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> DecodingError {
        self.reader.fail(kind, message)
    }

    // --- Structure ----------------------------------------------------------

    /// Consumes the opening token for `descriptor` and returns the decoder
    /// for its elements.
    ///
    /// Inline types have no token of their own: the returned decoder reads
    /// the wrapped value in place, in this decoder's mode.
    ///
    /// # Errors
    ///
    /// If the opening token is missing or directly followed by a comma.
    pub fn begin_structure(
        &mut self,
        descriptor: &Descriptor,
    ) -> Result<Decoder<'_, 'src>, DecodingError> {
        if matches!(descriptor.kind(), Kind::Inline { .. }) {
            trace!("begin inline '{}'", descriptor.name());
            return Ok(Decoder::new(&mut *self.reader, self.mode, self.options));
        }
        let mode = Mode::for_descriptor(descriptor);
        self.reader.consume_expected(mode.begin_token())?;
        if self.reader.peek_token() == TokenClass::Comma {
            return Err(self.fail(ErrorKind::Structural, "Unexpected leading comma"));
        }
        trace!("begin {mode:?} '{}'", descriptor.name());
        Ok(Decoder::new(&mut *self.reader, mode, self.options))
    }

    /// Consumes the closing token of this level, if `descriptor` has one.
    ///
    /// With `ignore_unknown_keys`, whatever is left of an object without
    /// fields is skipped first.
    ///
    /// # Errors
    ///
    /// If the closing token is missing.
    pub fn end_structure(mut self, descriptor: &Descriptor) -> Result<(), DecodingError> {
        if matches!(descriptor.kind(), Kind::Inline { .. }) {
            trace!("end inline '{}'", descriptor.name());
            return Ok(());
        }
        if self.options.ignore_unknown_keys
            && self.mode == Mode::Object
            && descriptor.element_count() == 0
        {
            while self.decode_element_index(descriptor)?.is_some() {}
        }
        self.reader.consume_expected(self.mode.end_token())?;
        trace!("end {:?} '{}'", self.mode, descriptor.name());
        Ok(())
    }

    /// Resolves the index of the next element, or `None` once the level has
    /// no more elements.
    ///
    /// # Errors
    ///
    /// On missing, leading or trailing commas, on a missing `:`, and on
    /// unknown keys unless `ignore_unknown_keys` is set.
    pub fn decode_element_index(
        &mut self,
        descriptor: &Descriptor,
    ) -> Result<Option<usize>, DecodingError> {
        match self.mode {
            Mode::Object | Mode::PolymorphicWrapper => self.decode_object_index(descriptor),
            Mode::Array => self.decode_list_index(),
            Mode::Map => self.decode_map_index(),
        }
    }

    fn next_index(&mut self) -> usize {
        self.current_index += 1;
        self.current_index.unsigned_abs()
    }

    fn decode_object_index(
        &mut self,
        descriptor: &Descriptor,
    ) -> Result<Option<usize>, DecodingError> {
        let mut has_comma = self.reader.try_consume_comma();
        while self.reader.can_consume_value() {
            if self.current_index >= 0 && !has_comma {
                return Err(self.fail(
                    ErrorKind::Structural,
                    "Expected comma after the key-value pair",
                ));
            }
            self.current_index += 1;
            let key_pos = self.reader.position();
            let key = if self.options.is_lenient {
                self.reader.consume_string_lenient()?
            } else {
                self.reader.consume_key_string()?
            };
            self.reader
                .consume_expected_with(TokenClass::Colon, |actual| {
                    format!("Expected ':' after the key '{key}', but had {actual} instead")
                })?;
            let Some(index) = descriptor.element_index(&key) else {
                if !self.options.ignore_unknown_keys {
                    return Err(self.reader.fail_at(
                        ErrorKind::Schema,
                        format!(
                            "Encountered an unknown key '{key}'. Set 'ignore_unknown_keys' in \
                             DecoderOptions to skip unknown keys"
                        ),
                        key_pos,
                    ));
                }
                debug!("skipping unknown key '{key}' of '{}'", descriptor.name());
                self.reader.skip_element()?;
                has_comma = self.reader.try_consume_comma();
                continue;
            };
            if self.options.coerce_input_values && self.coerce_input_value(descriptor, index)? {
                debug!("coerced '{key}' of '{}' to its default", descriptor.name());
                has_comma = self.reader.try_consume_comma();
                continue;
            }
            return Ok(Some(index));
        }
        if has_comma {
            return Err(self.fail(ErrorKind::Structural, "Unexpected trailing comma"));
        }
        Ok(None)
    }

    /// Whether the value of element `index` should be dropped in favor of
    /// the field's default: `null` for a non-nullable field, or an unknown
    /// name for an enum field. A coerced value is consumed.
    fn coerce_input_value(
        &mut self,
        descriptor: &Descriptor,
        index: usize,
    ) -> Result<bool, DecodingError> {
        if !descriptor.is_nullable(index) && !self.reader.try_consume_not_null() {
            return Ok(true);
        }
        let Some(element) = descriptor.element_descriptor(index) else {
            return Ok(false);
        };
        if !matches!(element.kind(), Kind::Enum { .. }) {
            return Ok(false);
        }
        let Some(name) = self.reader.peek_string(self.options.is_lenient)? else {
            return Ok(false);
        };
        if element.element_index(&name).is_some() {
            return Ok(false);
        }
        self.reader.skip_element()?;
        Ok(true)
    }

    fn decode_list_index(&mut self) -> Result<Option<usize>, DecodingError> {
        let has_comma = self.reader.try_consume_comma();
        if self.reader.can_consume_value() {
            if self.current_index == -1 && has_comma {
                return Err(self.fail(ErrorKind::Structural, "Unexpected leading comma"));
            }
            if self.current_index != -1 && !has_comma {
                return Err(self.fail(ErrorKind::Structural, "Expected end of the array or comma"));
            }
            return Ok(Some(self.next_index()));
        }
        if has_comma {
            return Err(self.fail(ErrorKind::Structural, "Unexpected trailing comma"));
        }
        Ok(None)
    }

    fn decode_map_index(&mut self) -> Result<Option<usize>, DecodingError> {
        let decoding_key = self.current_index % 2 != 0;
        let mut has_comma = false;
        if decoding_key {
            has_comma = self.reader.try_consume_comma();
        } else {
            self.reader
                .consume_expected_with(TokenClass::Colon, |actual| {
                    format!("Expected ':' after the map key, but had {actual} instead")
                })?;
        }
        if self.reader.can_consume_value() {
            if decoding_key {
                if self.current_index == -1 && has_comma {
                    return Err(self.fail(ErrorKind::Structural, "Unexpected leading comma"));
                }
                if self.current_index != -1 && !has_comma {
                    return Err(self.fail(
                        ErrorKind::Structural,
                        "Expected comma after the key-value pair",
                    ));
                }
            }
            return Ok(Some(self.next_index()));
        }
        if !decoding_key {
            return Err(self.fail(ErrorKind::Structural, "Expected a value after the map key"));
        }
        if has_comma {
            return Err(self.fail(ErrorKind::Structural, "Unexpected trailing comma"));
        }
        Ok(None)
    }

    // --- Values -------------------------------------------------------------

    /// Decodes a nested value of type `T`.
    ///
    /// # Errors
    ///
    /// Whatever `T::decode` reports.
    pub fn decode_serializable_value<T: Decode>(&mut self) -> Result<T, DecodingError> {
        T::decode(self)
    }

    /// Decodes `null` as `None`, anything else as a `T`.
    ///
    /// # Errors
    ///
    /// Whatever `T::decode` reports.
    pub fn decode_nullable_serializable_value<T: Decode>(
        &mut self,
    ) -> Result<Option<T>, DecodingError> {
        if self.decode_not_null_mark() {
            T::decode(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Decodes a `{"type": ..., "value": ...}` wrapper. `f` receives the type
    /// name and the decoder positioned at the payload.
    ///
    /// # Errors
    ///
    /// If `"type"` is missing, comes after `"value"`, or names a type the
    /// descriptor does not accept, if `"value"` is missing or repeated, or
    /// whatever `f` reports.
    pub fn decode_polymorphic<T>(
        &mut self,
        descriptor: &Descriptor,
        f: impl FnOnce(&str, &mut Decoder<'_, 'src>) -> Result<T, DecodingError>,
    ) -> Result<T, DecodingError> {
        let mut f = Some(f);
        let mut type_name: Option<Cow<'src, str>> = None;
        let mut value = None;
        let mut wrapper = self.begin_structure(descriptor)?;
        while let Some(index) = wrapper.decode_element_index(descriptor)? {
            if index == 0 {
                let name_pos = wrapper.literal_start();
                let name = wrapper.decode_string()?;
                if !descriptor.accepts_variant(&name) {
                    return Err(wrapper.reader.fail_at(
                        ErrorKind::Schema,
                        format!("Unknown type '{name}' for '{}'", descriptor.name()),
                        name_pos,
                    ));
                }
                type_name = Some(name);
                continue;
            }
            let Some(name) = type_name.as_deref() else {
                return Err(wrapper.fail(
                    ErrorKind::Schema,
                    "Expected 'type' before 'value' in a polymorphic value",
                ));
            };
            let Some(f) = f.take() else {
                return Err(wrapper.fail(
                    ErrorKind::Schema,
                    "Duplicate 'value' in a polymorphic value",
                ));
            };
            value = Some(f(name, &mut wrapper)?);
        }
        wrapper.end_structure(descriptor)?;
        value.ok_or_else(|| {
            self.fail(
                ErrorKind::Schema,
                format!("Missing 'value' for '{}'", descriptor.name()),
            )
        })
    }

    /// Whether the next value is not `null`. A `null` is consumed.
    pub fn decode_not_null_mark(&mut self) -> bool {
        self.reader.try_consume_not_null()
    }

    /// Decodes `true` or `false`, quoted or not.
    ///
    /// # Errors
    ///
    /// On any other literal.
    pub fn decode_boolean(&mut self) -> Result<bool, DecodingError> {
        let (text, start) = read_literal(self.reader, "bool")?;
        match &*text {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(conversion_error(self.reader, "bool", &text, start)),
        }
    }

    /// # Errors
    ///
    /// If the literal is not an `i8`.
    pub fn decode_byte(&mut self) -> Result<i8, DecodingError> {
        parse_literal(self.reader, "i8")
    }

    /// # Errors
    ///
    /// If the literal is not an `i16`.
    pub fn decode_short(&mut self) -> Result<i16, DecodingError> {
        parse_literal(self.reader, "i16")
    }

    /// # Errors
    ///
    /// If the literal is not an `i32`.
    pub fn decode_int(&mut self) -> Result<i32, DecodingError> {
        parse_literal(self.reader, "i32")
    }

    /// # Errors
    ///
    /// If the literal is not an `i64`.
    pub fn decode_long(&mut self) -> Result<i64, DecodingError> {
        parse_literal(self.reader, "i64")
    }

    /// # Errors
    ///
    /// If the literal is not an `f32`, or is not finite and special values
    /// are not allowed.
    pub fn decode_float(&mut self) -> Result<f32, DecodingError> {
        let start = self.literal_start();
        let value: f32 = parse_literal(self.reader, "f32")?;
        self.check_finite(value.is_finite(), start)?;
        Ok(value)
    }

    /// # Errors
    ///
    /// If the literal is not an `f64`, or is not finite and special values
    /// are not allowed.
    pub fn decode_double(&mut self) -> Result<f64, DecodingError> {
        let start = self.literal_start();
        let value: f64 = parse_literal(self.reader, "f64")?;
        self.check_finite(value.is_finite(), start)?;
        Ok(value)
    }

    fn literal_start(&mut self) -> usize {
        self.reader.peek_token();
        self.reader.position()
    }

    fn check_finite(&self, finite: bool, start: usize) -> Result<(), DecodingError> {
        if finite || self.options.allow_special_floating_point_values {
            return Ok(());
        }
        Err(self.reader.fail_at(
            ErrorKind::Conversion,
            "Unexpected special floating-point value. Set \
             'allow_special_floating_point_values' in DecoderOptions to accept NaN and Infinity",
            start,
        ))
    }

    /// # Errors
    ///
    /// Unless the literal is exactly one character.
    pub fn decode_char(&mut self) -> Result<char, DecodingError> {
        let (text, start) = read_literal(self.reader, "char")?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(self.reader.fail_at(
                ErrorKind::Conversion,
                format!("Expected single char, but had '{text}'"),
                start,
            )),
        }
    }

    /// Decodes a quoted string, or also a bare literal when lenient. The
    /// result borrows from the input unless it contained escapes.
    ///
    /// # Errors
    ///
    /// On `null`, on a missing quote in strict mode, and on malformed
    /// strings.
    pub fn decode_string(&mut self) -> Result<Cow<'src, str>, DecodingError> {
        if self.reader.peek_token() == TokenClass::Null {
            return Err(self.fail(ErrorKind::Schema, "Expected string, but had 'null' instead"));
        }
        if self.options.is_lenient {
            self.reader.consume_string_lenient()
        } else {
            self.reader.consume_string()
        }
    }

    /// Decodes an enum name and resolves it to its ordinal.
    ///
    /// # Errors
    ///
    /// If the name is not a variant of `descriptor`.
    pub fn decode_enum(&mut self, descriptor: &Descriptor) -> Result<usize, DecodingError> {
        let start = self.literal_start();
        let name = self.decode_string()?;
        descriptor.element_index(&name).ok_or_else(|| {
            self.reader.fail_at(
                ErrorKind::Schema,
                format!(
                    "'{}' does not contain element with name '{name}'",
                    descriptor.name()
                ),
                start,
            )
        })
    }

    /// Returns a decoder for the single value of an inline type: an
    /// [`UnsignedDecoder`] for unsigned wrappers, otherwise this decoder.
    pub fn decode_inline(&mut self, descriptor: &Descriptor) -> InlineDecoder<'_, 'src> {
        if descriptor.is_unsigned_numeric() {
            InlineDecoder::Unsigned(UnsignedDecoder::new(&mut *self.reader))
        } else {
            InlineDecoder::Signed(Decoder {
                reader: &mut *self.reader,
                options: self.options,
                mode: self.mode,
                current_index: self.current_index,
            })
        }
    }
}

/// Reads the text of a scalar, quoted or not. Returns the text and the byte
/// offset where it starts.
fn read_literal<'src>(
    reader: &mut Reader<'src>,
    type_name: &str,
) -> Result<(Cow<'src, str>, usize), DecodingError> {
    if reader.peek_token() == TokenClass::Null {
        return Err(reader.fail(
            ErrorKind::Schema,
            format!("Expected {type_name}, but had 'null' instead"),
        ));
    }
    let start = reader.position();
    let text = reader.consume_string_lenient()?;
    Ok((text, start))
}

fn conversion_error(
    reader: &Reader<'_>,
    type_name: &str,
    text: &str,
    start: usize,
) -> DecodingError {
    reader.fail_at(
        ErrorKind::Conversion,
        format!("Failed to parse type '{type_name}' for input '{text}'"),
        start,
    )
}

fn parse_literal<T: FromStr>(reader: &mut Reader<'_>, type_name: &str) -> Result<T, DecodingError> {
    let (text, start) = read_literal(reader, type_name)?;
    text.parse()
        .map_err(|_| conversion_error(reader, type_name, &text, start))
}
