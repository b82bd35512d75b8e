use alloc::string::String;

use bstr::ByteSlice;
use thiserror::Error;

/// The broad category of a [`DecodingError`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unexpected or missing `,` `:` `{` `}` `[` `]`, leading or trailing
    /// commas, content after the root value.
    #[error("Structural")]
    Structural,
    /// Unterminated strings, invalid escapes, invalid characters, end of
    /// input in the middle of a token.
    #[error("Lexical")]
    Lexical,
    /// Input that is well-formed JSON but does not fit the descriptor:
    /// unknown keys, unknown enum names, unexpected `null`.
    #[error("Schema")]
    Schema,
    /// A literal that does not convert to the requested primitive type.
    #[error("Conversion")]
    Conversion,
}

/// An error raised while decoding. Every error aborts the whole decode.
///
/// The error keeps the input text so it can point at the failing character,
/// see [`DecodingError::render`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} error: {message} at {line}:{column}")]
pub struct DecodingError {
    kind: ErrorKind,
    message: String,
    position: usize,
    line: usize,
    column: usize,
    input: String,
}

impl DecodingError {
    /// Builds an error at byte offset `byte_pos` of `input`.
    pub(crate) fn new(kind: ErrorKind, message: String, input: &str, byte_pos: usize) -> Self {
        let byte_pos = byte_pos.min(input.len());
        let prefix = &input.as_bytes()[..byte_pos];
        let position = prefix.chars().count();
        let line = prefix.find_iter(b"\n").count() + 1;
        let line_start = prefix.rfind_byte(b'\n').map_or(0, |i| i + 1);
        let column = prefix[line_start..].chars().count() + 1;
        Self {
            kind,
            message,
            position,
            line,
            column,
            input: String::from(input),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Absolute character offset (not byte offset) of the failure.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// 1-based line of the failure.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column of the failure, counted in characters.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// The complete input the decoder was reading.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Renders the message, the offending input line and a caret under the
    /// failing column.
    ///
    /// ```rust
    /// use jsondecode::DecoderOptions;
    ///
    /// let err = jsondecode::from_str::<Vec<i32>>("[1,2,]", DecoderOptions::default())
    ///     .unwrap_err();
    /// assert_eq!(
    ///     err.render(),
    ///     "Structural error: Unexpected trailing comma at 1:6\n[1,2,]\n     ^"
    /// );
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        use core::fmt::Write;

        let source_line = self.input.lines().nth(self.line - 1).unwrap_or("");
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write!(out, "{self}\n{source_line}\n");
        for _ in 1..self.column {
            out.push(' ');
        }
        out.push('^');
        out
    }
}
