//! Reader: a cursor over the complete JSON text.
//!
//! The reader owns nothing but its position and a scratch buffer. The
//! source is borrowed for `'src` and never modified, which lets every
//! string without escapes come back as a borrowed `&'src str`.
//!
//! What it does
//! - Classifies the next character through the
//!   [`char_class`](crate::char_class) tables, skipping JSON whitespace
//!   first.
//! - Extracts quoted strings in a single pass. Plain content is only
//!   located, never copied; on the first backslash the prefix is copied into
//!   the scratch buffer, and from then on the reader appends the plain chunk
//!   between two escapes followed by the decoded escape.
//! - Extracts unquoted literals (`123`, `true`, `-1.5e3`, lenient bare
//!   words) as borrowed slices. Numbers are never parsed here; the decoder
//!   hands the text to Rust's own `FromStr` implementations.
//! - Skips whole values, balancing nested brackets.
//!
//! Invariants
//! - `pos` is a byte offset that always sits on a `char` boundary, at an
//!   unconsumed character or at the end of the input.
//! - `pos` only moves forward, except through [`Reader::restore`].
//! - Errors carry the absolute character offset of the failure; byte
//!   offsets never leave this module.

use alloc::{borrow::Cow, format, string::String, vec::Vec};

use bstr::ByteSlice;
use log::debug;

use crate::{
    char_class::{TokenClass, byte_to_token_class, escape_to_char},
    error::{DecodingError, ErrorKind},
    unicode,
};

const NULL: &[u8] = b"null";

/// Bytes that end a run of plain string content: the closing quote, the
/// escape character and the control characters JSON forbids in strings.
const STRING_STOP: [u8; 34] = {
    let mut set = [0u8; 34];
    set[0] = b'"';
    set[1] = b'\\';
    let mut c = 0u8;
    while c < 0x20 {
        set[c as usize + 2] = c;
        c += 1;
    }
    set
};

/// A saved cursor position; see [`Reader::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pos: usize,
}

/// A cursor over an immutable JSON text.
#[derive(Debug)]
pub struct Reader<'src> {
    source: &'src str,
    pos: usize,
    // Unescape buffer, only touched by strings that contain an escape.
    scratch: String,
    #[cfg(any(test, feature = "fuzzing"))]
    panic_on_error: bool,
}

impl<'src> Reader<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            scratch: String::new(),
            #[cfg(any(test, feature = "fuzzing"))]
            panic_on_error: false,
        }
    }

    #[cfg(any(test, feature = "fuzzing"))]
    pub(crate) fn set_panic_on_error(&mut self, panic_on_error: bool) {
        self.panic_on_error = panic_on_error;
    }

    #[must_use]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// The current byte offset into the source.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Saves the cursor so a speculative read can be undone.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { pos: self.pos }
    }

    /// Moves the cursor back to a saved position.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
    }

    // --- Classification -----------------------------------------------------

    fn skip_whitespace(&mut self) -> usize {
        let bytes = self.source.as_bytes();
        while let Some(&b) = bytes.get(self.pos) {
            if byte_to_token_class(b) != TokenClass::Whitespace {
                break;
            }
            self.pos += 1;
        }
        self.pos
    }

    /// `null` followed by something that cannot continue a literal.
    fn is_null_at(&self, pos: usize) -> bool {
        let rest = &self.source.as_bytes()[pos..];
        rest.starts_with(NULL)
            && rest
                .get(NULL.len())
                .is_none_or(|&b| byte_to_token_class(b) != TokenClass::Other)
    }

    fn class_at(&self, pos: usize) -> TokenClass {
        match self.source.as_bytes().get(pos) {
            None => TokenClass::Eof,
            Some(&b) => match byte_to_token_class(b) {
                TokenClass::Other if self.is_null_at(pos) => TokenClass::Null,
                class => class,
            },
        }
    }

    /// Human readable form of whatever sits at `pos`, for error messages.
    fn describe_at(&self, pos: usize) -> String {
        if self.is_null_at(pos) {
            return String::from("'null'");
        }
        match bstr::decode_utf8(&self.source.as_bytes()[pos..]) {
            (Some(c), _) if c.is_control() => format!("'{}'", c.escape_debug()),
            (Some(c), _) => format!("'{c}'"),
            (None, _) => String::from("end of input"),
        }
    }

    /// Skips whitespace and returns the class of the next character without
    /// consuming it.
    pub fn peek_token(&mut self) -> TokenClass {
        let pos = self.skip_whitespace();
        self.class_at(pos)
    }

    /// Skips whitespace and consumes the next character (all of `null` for
    /// [`TokenClass::Null`]).
    pub fn consume_token(&mut self) -> TokenClass {
        let token = self.peek_token();
        self.pos += match token {
            TokenClass::Eof => 0,
            TokenClass::Null => NULL.len(),
            _ => bstr::decode_utf8(&self.source.as_bytes()[self.pos..]).1,
        };
        token
    }

    /// Consumes the next token, failing unless it is `expected`.
    ///
    /// # Errors
    ///
    /// A structural error naming both tokens.
    pub fn consume_expected(&mut self, expected: TokenClass) -> Result<(), DecodingError> {
        let pos = self.skip_whitespace();
        if self.class_at(pos) == expected {
            self.consume_token();
            return Ok(());
        }
        let actual = self.describe_at(pos);
        Err(self.fail_at(
            ErrorKind::Structural,
            format!("Expected {expected}, but had {actual} instead"),
            pos,
        ))
    }

    /// Consumes the next token, failing with the message built by `error_fn`
    /// from the actual token unless it is `expected`.
    ///
    /// # Errors
    ///
    /// A structural error at the position of the unexpected token.
    pub fn consume_expected_with(
        &mut self,
        expected: TokenClass,
        error_fn: impl FnOnce(TokenClass) -> String,
    ) -> Result<(), DecodingError> {
        let pos = self.skip_whitespace();
        let actual = self.class_at(pos);
        if actual != expected {
            return Err(self.fail_at(ErrorKind::Structural, error_fn(actual), pos));
        }
        self.consume_token();
        Ok(())
    }

    /// Consumes a `,` if one is next, reporting whether it did.
    pub fn try_consume_comma(&mut self) -> bool {
        let pos = self.skip_whitespace();
        if self.class_at(pos) == TokenClass::Comma {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Whether the next character starts a value. `false` at `}` `]` `,`
    /// `:` and at the end of input.
    pub fn can_consume_value(&mut self) -> bool {
        matches!(
            self.peek_token(),
            TokenClass::BeginObject
                | TokenClass::BeginArray
                | TokenClass::String
                | TokenClass::Other
                | TokenClass::Null
        )
    }

    /// Returns `false` and consumes the literal if the next value is `null`;
    /// returns `true` and consumes nothing otherwise.
    pub fn try_consume_not_null(&mut self) -> bool {
        let pos = self.skip_whitespace();
        if self.is_null_at(pos) {
            self.pos = pos + NULL.len();
            false
        } else {
            true
        }
    }

    // --- Strings ------------------------------------------------------------

    /// Consumes a quoted string and returns its unescaped content.
    ///
    /// The result borrows from the source unless the string contains an
    /// escape.
    ///
    /// # Errors
    ///
    /// If the next token is not `"`, on invalid escapes, on unescaped control
    /// characters and when the closing quote is missing.
    pub fn consume_string(&mut self) -> Result<Cow<'src, str>, DecodingError> {
        let pos = self.skip_whitespace();
        if self.class_at(pos) != TokenClass::String {
            return Err(self.fail_at(
                ErrorKind::Structural,
                format!(
                    "Expected string literal with quotes, but had {} instead",
                    self.describe_at(pos)
                ),
                pos,
            ));
        }
        self.pos = pos + 1;
        self.read_quoted()
    }

    /// Consumes an object key.
    ///
    /// Keys are located with a direct search for the closing quote. A key
    /// that turns out to contain a backslash is re-read through the escape
    /// aware path of [`Reader::consume_string`].
    ///
    /// # Errors
    ///
    /// As [`Reader::consume_string`].
    pub fn consume_key_string(&mut self) -> Result<Cow<'src, str>, DecodingError> {
        let pos = self.skip_whitespace();
        if self.class_at(pos) != TokenClass::String {
            return Err(self.fail_at(
                ErrorKind::Structural,
                format!(
                    "Expected quoted object key, but had {} instead",
                    self.describe_at(pos)
                ),
                pos,
            ));
        }
        let start = pos + 1;
        let bytes = self.source.as_bytes();
        let Some(len) = bytes[start..].find_byte(b'"') else {
            return Err(self.fail_at(
                ErrorKind::Lexical,
                "Unexpected end of input: unterminated object key",
                bytes.len(),
            ));
        };
        let end = start + len;
        self.pos = start;
        if bytes[start..end].iter().any(|&b| b == b'\\' || b < 0x20) {
            return self.read_quoted();
        }
        self.pos = end + 1;
        Ok(Cow::Borrowed(&self.source[start..end]))
    }

    /// Consumes either a quoted string or a bare run of literal characters.
    ///
    /// # Errors
    ///
    /// If the next token starts neither, or as [`Reader::consume_string`].
    pub fn consume_string_lenient(&mut self) -> Result<Cow<'src, str>, DecodingError> {
        let pos = self.skip_whitespace();
        match self.class_at(pos) {
            TokenClass::String => self.consume_string(),
            TokenClass::Other | TokenClass::Null => {
                let end = self.literal_end(pos);
                self.pos = end;
                Ok(Cow::Borrowed(&self.source[pos..end]))
            }
            _ => Err(self.fail_at(
                ErrorKind::Structural,
                format!(
                    "Expected beginning of a string or literal, but had {} instead",
                    self.describe_at(pos)
                ),
                pos,
            )),
        }
    }

    /// Reads the next string without consuming it.
    ///
    /// Returns `None` if the next value is not a string: not quoted, or not
    /// a bare literal when `lenient`, or `null`.
    ///
    /// # Errors
    ///
    /// As [`Reader::consume_string`].
    pub fn peek_string(&mut self, lenient: bool) -> Result<Option<Cow<'src, str>>, DecodingError> {
        let snapshot = self.snapshot();
        let value = match self.peek_token() {
            TokenClass::String => Some(self.consume_string()?),
            TokenClass::Other if lenient => Some(self.consume_string_lenient()?),
            _ => None,
        };
        self.restore(snapshot);
        Ok(value)
    }

    fn literal_end(&self, start: usize) -> usize {
        let bytes = self.source.as_bytes();
        bytes[start..]
            .iter()
            .position(|&b| byte_to_token_class(b) != TokenClass::Other)
            .map_or(bytes.len(), |n| start + n)
    }

    /// Reads string content; the cursor is just past the opening quote.
    fn read_quoted(&mut self) -> Result<Cow<'src, str>, DecodingError> {
        let source = self.source;
        let bytes = source.as_bytes();
        let start = self.pos;
        let mut chunk_start = start;
        let mut cursor = start;
        let mut escaped = false;
        loop {
            let Some(offset) = bytes[cursor..].find_byteset(STRING_STOP) else {
                return Err(self.fail_at(
                    ErrorKind::Lexical,
                    "Unexpected end of input: unterminated string",
                    bytes.len(),
                ));
            };
            let at = cursor + offset;
            match bytes[at] {
                b'"' => {
                    self.pos = at + 1;
                    if !escaped {
                        return Ok(Cow::Borrowed(&source[start..at]));
                    }
                    self.scratch.push_str(&source[chunk_start..at]);
                    return Ok(Cow::Owned(core::mem::take(&mut self.scratch)));
                }
                b'\\' => {
                    if !escaped {
                        self.scratch.clear();
                        escaped = true;
                    }
                    self.scratch.push_str(&source[chunk_start..at]);
                    cursor = self.append_escape(at + 1)?;
                    chunk_start = cursor;
                }
                control => {
                    return Err(self.fail_at(
                        ErrorKind::Lexical,
                        format!("Unescaped control character U+{control:04X} in string"),
                        at,
                    ));
                }
            }
        }
    }

    /// Decodes the escape whose letter is at `at`; returns the offset just
    /// past it.
    fn append_escape(&mut self, at: usize) -> Result<usize, DecodingError> {
        let Some(&letter) = self.source.as_bytes().get(at) else {
            return Err(self.fail_at(
                ErrorKind::Lexical,
                "Unexpected end of input after escape character",
                at,
            ));
        };
        if letter == b'u' {
            return self.append_unicode_escape(at + 1);
        }
        match escape_to_char(letter) {
            Some(c) => {
                self.scratch.push(c);
                Ok(at + 1)
            }
            None => Err(self.fail_at(
                ErrorKind::Lexical,
                format!("Invalid escaped char {}", self.describe_at(at)),
                at,
            )),
        }
    }

    /// `at` is the first hex digit after `\u`.
    fn append_unicode_escape(&mut self, at: usize) -> Result<usize, DecodingError> {
        let escape_start = at - 2;
        let unit = self.read_code_unit(at)?;
        let mut next = at + 4;
        let decoded = if unicode::is_high_surrogate(unit) {
            if !self.source.as_bytes()[next..].starts_with(b"\\u") {
                return Err(self.fail_at(
                    ErrorKind::Lexical,
                    format!("Unpaired surrogate \\u{unit:04X} in string"),
                    escape_start,
                ));
            }
            let low = self.read_code_unit(next + 2)?;
            next += 6;
            unicode::join_surrogates(unit, low)
        } else {
            char::from_u32(u32::from(unit))
        };
        let Some(c) = decoded else {
            return Err(self.fail_at(
                ErrorKind::Lexical,
                format!("Unpaired surrogate \\u{unit:04X} in string"),
                escape_start,
            ));
        };
        self.scratch.push(c);
        Ok(next)
    }

    fn read_code_unit(&self, at: usize) -> Result<u16, DecodingError> {
        let bytes = self.source.as_bytes();
        let Some(&[a, b, c, d]) = bytes.get(at..at + 4) else {
            return Err(self.fail_at(
                ErrorKind::Lexical,
                "Unexpected end of input in unicode escape",
                bytes.len(),
            ));
        };
        unicode::decode_code_unit([a, b, c, d]).map_err(|i| {
            let digit = self.describe_at(at + i);
            self.fail_at(
                ErrorKind::Lexical,
                format!("Invalid hex digit {digit} in unicode escape"),
                at + i,
            )
        })
    }

    // --- Whole values -------------------------------------------------------

    /// Consumes and discards one complete value, including nested objects
    /// and arrays.
    ///
    /// # Errors
    ///
    /// On bracket mismatches (naming both brackets), on end of input inside
    /// the value, and on anything that cannot start a value.
    pub fn skip_element(&mut self) -> Result<(), DecodingError> {
        let mut open: Vec<(u8, usize)> = Vec::new();
        loop {
            let pos = self.skip_whitespace();
            match self.class_at(pos) {
                TokenClass::String => {
                    self.consume_string()?;
                }
                TokenClass::Other | TokenClass::Null => {
                    self.consume_string_lenient()?;
                }
                TokenClass::BeginObject | TokenClass::BeginArray => {
                    open.push((self.source.as_bytes()[pos], pos));
                    self.pos = pos + 1;
                }
                TokenClass::EndObject | TokenClass::EndArray if !open.is_empty() => {
                    let close = self.source.as_bytes()[pos];
                    let (bracket, bracket_pos) = open.pop().unwrap_or_default();
                    let expected = if bracket == b'{' { b'}' } else { b']' };
                    if close != expected {
                        let opened_at = self.source[..bracket_pos].chars().count();
                        let (bracket, close) = (char::from(bracket), char::from(close));
                        let expected = char::from(expected);
                        return Err(self.fail_at(
                            ErrorKind::Structural,
                            format!(
                                "Bracket mismatch: '{bracket}' opened at position {opened_at} \
                                 was closed by '{close}', expected '{expected}'"
                            ),
                            pos,
                        ));
                    }
                    self.pos = pos + 1;
                }
                TokenClass::Comma | TokenClass::Colon if !open.is_empty() => {
                    self.pos = pos + 1;
                }
                TokenClass::Eof => {
                    return Err(self.fail_at(
                        ErrorKind::Lexical,
                        "Unexpected end of input while skipping a value",
                        pos,
                    ));
                }
                _ => {
                    let actual = self.describe_at(pos);
                    return Err(self.fail_at(
                        ErrorKind::Structural,
                        format!("Expected a value, but had {actual} instead"),
                        pos,
                    ));
                }
            }
            if open.is_empty() {
                return Ok(());
            }
        }
    }

    /// Succeeds if only whitespace remains.
    ///
    /// # Errors
    ///
    /// A structural error at the first trailing character.
    pub fn expect_eof(&mut self) -> Result<(), DecodingError> {
        let pos = self.skip_whitespace();
        if pos == self.source.len() {
            return Ok(());
        }
        Err(self.fail_at(
            ErrorKind::Structural,
            format!(
                "Expected end of input after the root value, but had {} instead",
                self.describe_at(pos)
            ),
            pos,
        ))
    }

    // --- Failure ------------------------------------------------------------

    /// Builds an error at the current position.
    #[must_use]
    pub fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> DecodingError {
        self.fail_at(kind, message, self.pos)
    }

    /// Builds an error at byte offset `pos`.
    #[must_use]
    pub fn fail_at(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
        pos: usize,
    ) -> DecodingError {
        let err = DecodingError::new(kind, message.into(), self.source, pos);
        debug!("{err}");
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(!self.panic_on_error, "{err}");
        err
    }
}

#[cfg(test)]
mod tests;
