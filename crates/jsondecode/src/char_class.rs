//! Character classification for the reader.
//!
//! Both tables are built at compile time and never change. Classification of
//! a byte is a single array lookup; every byte at or above `0x80` (the lead
//! and continuation bytes of multi-byte UTF-8 sequences) is
//! [`TokenClass::Other`], so runs of literal characters never split a
//! code point.

use core::fmt;

/// The lexical category of the next unconsumed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Part of an unquoted literal: digits, letters, `-`, `.`, `+`, and any
    /// non-ASCII character.
    Other,
    /// `"`
    String,
    /// `\`
    StringEscape,
    Whitespace,
    Comma,
    Colon,
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    /// The literal `null`. Never produced by the table itself; the reader
    /// reports it when a whole `null` word sits at the cursor.
    Null,
    /// A control character outside a string.
    Invalid,
    Eof,
}

impl TokenClass {
    fn describe(self) -> &'static str {
        match self {
            TokenClass::Other => "literal",
            TokenClass::String => "'\"'",
            TokenClass::StringEscape => "'\\'",
            TokenClass::Whitespace => "whitespace",
            TokenClass::Comma => "','",
            TokenClass::Colon => "':'",
            TokenClass::BeginObject => "'{'",
            TokenClass::EndObject => "'}'",
            TokenClass::BeginArray => "'['",
            TokenClass::EndArray => "']'",
            TokenClass::Null => "'null'",
            TokenClass::Invalid => "invalid character",
            TokenClass::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

const CHAR_TO_TOKEN: [TokenClass; 128] = {
    let mut table = [TokenClass::Other; 128];
    let mut i = 0;
    while i < 0x20 {
        table[i] = TokenClass::Invalid;
        i += 1;
    }
    table[b'\t' as usize] = TokenClass::Whitespace;
    table[b'\n' as usize] = TokenClass::Whitespace;
    table[b'\r' as usize] = TokenClass::Whitespace;
    table[b' ' as usize] = TokenClass::Whitespace;
    table[b',' as usize] = TokenClass::Comma;
    table[b':' as usize] = TokenClass::Colon;
    table[b'{' as usize] = TokenClass::BeginObject;
    table[b'}' as usize] = TokenClass::EndObject;
    table[b'[' as usize] = TokenClass::BeginArray;
    table[b']' as usize] = TokenClass::EndArray;
    table[b'"' as usize] = TokenClass::String;
    table[b'\\' as usize] = TokenClass::StringEscape;
    table
};

// 0 marks a letter that is not a valid short escape.
const ESCAPE_TO_CHAR: [u8; 128] = {
    let mut table = [0u8; 128];
    table[b'b' as usize] = 0x08;
    table[b't' as usize] = b'\t';
    table[b'n' as usize] = b'\n';
    table[b'f' as usize] = 0x0C;
    table[b'r' as usize] = b'\r';
    table[b'/' as usize] = b'/';
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table
};

/// Classifies a single byte of UTF-8 input.
#[inline]
#[must_use]
pub const fn byte_to_token_class(b: u8) -> TokenClass {
    if b < 0x80 {
        CHAR_TO_TOKEN[b as usize]
    } else {
        TokenClass::Other
    }
}

/// Classifies a character; everything above ASCII is [`TokenClass::Other`].
#[inline]
#[must_use]
pub const fn char_to_token_class(c: char) -> TokenClass {
    if c.is_ascii() {
        CHAR_TO_TOKEN[c as usize]
    } else {
        TokenClass::Other
    }
}

/// Maps the letter after a backslash to the character it stands for.
///
/// `u` is not in the table: `\uXXXX` is decoded separately from its four
/// hex digits.
#[inline]
#[must_use]
pub const fn escape_to_char(letter: u8) -> Option<char> {
    if letter >= 0x80 {
        return None;
    }
    match ESCAPE_TO_CHAR[letter as usize] {
        0 => None,
        c => Some(c as char),
    }
}
