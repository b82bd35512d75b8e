use alloc::{
    borrow::Cow,
    format,
    string::{String, ToString},
};

use quickcheck::QuickCheck;
use rstest::rstest;

use super::*;

fn expect_err<T: core::fmt::Debug>(result: Result<T, DecodingError>) -> DecodingError {
    match result {
        Err(err) => err,
        Ok(value) => panic!("expected an error, got {value:?}"),
    }
}

#[test]
fn tokens_skip_whitespace() {
    let mut r = Reader::new("  { \"a\" :\t[1, null] }\n");
    assert_eq!(r.consume_token(), TokenClass::BeginObject);
    assert_eq!(r.peek_token(), TokenClass::String);
    assert_eq!(r.consume_key_string().unwrap(), "a");
    assert_eq!(r.consume_token(), TokenClass::Colon);
    assert_eq!(r.consume_token(), TokenClass::BeginArray);
    assert_eq!(r.consume_string_lenient().unwrap(), "1");
    assert!(r.try_consume_comma());
    assert!(!r.try_consume_not_null());
    assert_eq!(r.consume_token(), TokenClass::EndArray);
    assert_eq!(r.consume_token(), TokenClass::EndObject);
    assert_eq!(r.peek_token(), TokenClass::Eof);
    r.expect_eof().unwrap();
}

#[rstest]
#[case("null", TokenClass::Null)]
#[case("null,", TokenClass::Null)]
#[case("null]", TokenClass::Null)]
#[case("nullable", TokenClass::Other)]
#[case("nul", TokenClass::Other)]
#[case("nullé", TokenClass::Other)]
fn null_is_a_whole_word(#[case] input: &str, #[case] expected: TokenClass) {
    assert_eq!(Reader::new(input).peek_token(), expected);
}

#[test]
fn consume_token_steps_over_multibyte_characters() {
    let mut r = Reader::new("é,");
    assert_eq!(r.consume_token(), TokenClass::Other);
    assert_eq!(r.position(), 2);
    assert_eq!(r.consume_token(), TokenClass::Comma);
}

#[test]
fn try_consume_not_null_leaves_other_values() {
    let mut r = Reader::new(" nullx");
    assert!(r.try_consume_not_null());
    assert_eq!(r.consume_string_lenient().unwrap(), "nullx");
}

#[rstest]
#[case("{", true)]
#[case("[", true)]
#[case("\"s\"", true)]
#[case("12", true)]
#[case("null", true)]
#[case("}", false)]
#[case("]", false)]
#[case(",", false)]
#[case(":", false)]
#[case("   ", false)]
fn can_consume_value(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(Reader::new(input).can_consume_value(), expected);
}

#[test]
fn consume_expected_reports_both_tokens() {
    let mut r = Reader::new(" ]");
    let err = expect_err(r.consume_expected(TokenClass::BeginObject));
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.message(), "Expected '{', but had ']' instead");
    assert_eq!(err.position(), 1);
}

#[test]
fn consume_expected_with_uses_custom_message() {
    let mut r = Reader::new("1");
    let err = expect_err(r.consume_expected_with(TokenClass::Colon, |actual| {
        format!("Expected ':' after the key, found {actual}")
    }));
    assert_eq!(err.message(), "Expected ':' after the key, found literal");
}

#[test]
fn plain_string_is_borrowed() {
    let mut r = Reader::new("\"hello wörld\" ,");
    match r.consume_string().unwrap() {
        Cow::Borrowed(s) => assert_eq!(s, "hello wörld"),
        other => panic!("expected borrowed, got {other:?}"),
    }
    assert_eq!(r.peek_token(), TokenClass::Comma);
}

#[test]
fn empty_string_is_borrowed() {
    let mut r = Reader::new("\"\"");
    match r.consume_string().unwrap() {
        Cow::Borrowed(s) => assert!(s.is_empty()),
        other => panic!("expected borrowed, got {other:?}"),
    }
}

#[test]
fn escaped_string_is_owned() {
    let mut r = Reader::new(r#""a\nb\t\"\\\/\u0041\b\f\r""#);
    match r.consume_string().unwrap() {
        Cow::Owned(s) => assert_eq!(s, "a\nb\t\"\\/A\u{8}\u{c}\r"),
        other => panic!("expected owned, got {other:?}"),
    }
    r.expect_eof().unwrap();
}

#[test]
fn escaped_and_plain_strings_alternate() {
    let mut r = Reader::new(r#""x\ty" "plain" "\u00e9\u00e8""#);
    let first = r.consume_string().unwrap();
    assert!(matches!(first, Cow::Owned(_)));
    assert_eq!(first, "x\ty");
    assert!(matches!(r.consume_string().unwrap(), Cow::Borrowed("plain")));
    let last = r.consume_string().unwrap();
    assert!(matches!(last, Cow::Owned(_)));
    assert_eq!(last, "éè");
}

#[test]
fn surrogate_pair_is_joined() {
    let mut r = Reader::new(r#""smile \ud83d\ude00!""#);
    assert_eq!(r.consume_string().unwrap(), "smile 😀!");
}

#[rstest]
#[case::lone_high(r#""\ud83d""#)]
#[case::high_then_text(r#""\ud83dabc""#)]
#[case::high_then_high(r#""\ud83d\ud83d""#)]
#[case::lone_low(r#""\ude00""#)]
fn unpaired_surrogates_are_rejected(#[case] input: &str) {
    let err = expect_err(Reader::new(input).consume_string());
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(err.position(), 1);
}

#[rstest]
#[case::bad_letter(r#""a\qb""#, 3, "Invalid escaped char 'q'")]
#[case::bad_hex(r#""\u00g0""#, 5, "Invalid hex digit 'g' in unicode escape")]
#[case::short_hex(r#""\u00"#, 5, "Unexpected end of input in unicode escape")]
#[case::unterminated(r#""abc"#, 4, "Unexpected end of input: unterminated string")]
#[case::escape_at_end(r#""abc\"#, 5, "Unexpected end of input after escape character")]
fn lexical_string_errors(#[case] input: &str, #[case] position: usize, #[case] message: &str) {
    let err = expect_err(Reader::new(input).consume_string());
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(err.position(), position);
    assert_eq!(err.message(), message);
}

#[test]
fn raw_control_character_is_rejected() {
    let err = expect_err(Reader::new("\"é\u{1}\"").consume_string());
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(
        err.message(),
        "Unescaped control character U+0001 in string"
    );
    assert_eq!(err.position(), 2);
}

#[test]
fn consume_string_requires_quote() {
    let err = expect_err(Reader::new("null").consume_string());
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(
        err.message(),
        "Expected string literal with quotes, but had 'null' instead"
    );
}

#[test]
fn key_fast_path_borrows() {
    let mut r = Reader::new("\"name\":1");
    assert!(matches!(r.consume_key_string().unwrap(), Cow::Borrowed("name")));
    assert_eq!(r.peek_token(), TokenClass::Colon);
}

#[test]
fn key_with_escapes_falls_back() {
    let mut r = Reader::new(r#""na\"me\u0021":1"#);
    assert_eq!(r.consume_key_string().unwrap(), "na\"me!");
    assert_eq!(r.peek_token(), TokenClass::Colon);
}

#[test]
fn unterminated_key_is_lexical() {
    let err = expect_err(Reader::new("\"name").consume_key_string());
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(err.position(), 5);
}

#[rstest]
#[case("abc,", "abc")]
#[case("-12.5e3]", "-12.5e3")]
#[case("true}", "true")]
#[case("null ", "null")]
#[case("héllo\n", "héllo")]
#[case("\"quoted\"", "quoted")]
fn lenient_reads_literals(#[case] input: &str, #[case] expected: &str) {
    let literal = Reader::new(input).consume_string_lenient().unwrap();
    assert_eq!(literal, expected);
}

#[test]
fn lenient_rejects_structure() {
    let err = expect_err(Reader::new("  {").consume_string_lenient());
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.position(), 2);
}

#[test]
fn peek_string_does_not_move() {
    let mut r = Reader::new(" \"a\\tb\" rest");
    let before = r.position();
    assert_eq!(r.peek_string(false).unwrap().as_deref(), Some("a\tb"));
    assert_eq!(r.position(), before);
    assert_eq!(r.consume_string().unwrap(), "a\tb");
}

#[rstest]
#[case("ONE", false, None)]
#[case("ONE", true, Some("ONE"))]
#[case("null", true, None)]
#[case("[1]", true, None)]
#[case("\"ONE\"", false, Some("ONE"))]
fn peek_string_cases(#[case] input: &str, #[case] lenient: bool, #[case] expected: Option<&str>) {
    let mut r = Reader::new(input);
    assert_eq!(r.peek_string(lenient).unwrap().as_deref(), expected);
    assert_eq!(r.position(), 0);
}

#[test]
fn snapshot_restore() {
    let mut r = Reader::new("[1, 2]");
    let snapshot = r.snapshot();
    r.consume_token();
    r.consume_string_lenient().unwrap();
    r.restore(snapshot);
    assert_eq!(r.consume_token(), TokenClass::BeginArray);
}

#[test]
fn skip_nested_value() {
    let mut r = Reader::new(r#"{"a":[1,{"b":"]}"}],"c":null} , 2"#);
    r.skip_element().unwrap();
    assert_eq!(r.consume_token(), TokenClass::Comma);
    assert_eq!(r.consume_string_lenient().unwrap(), "2");
}

#[rstest]
#[case("42, 1", TokenClass::Comma)]
#[case("\"s\"}", TokenClass::EndObject)]
#[case("null]", TokenClass::EndArray)]
#[case("[]:", TokenClass::Colon)]
fn skip_scalar_or_empty(#[case] input: &str, #[case] next: TokenClass) {
    let mut r = Reader::new(input);
    r.skip_element().unwrap();
    assert_eq!(r.peek_token(), next);
}

#[test]
fn skip_reports_bracket_mismatch() {
    let err = expect_err(Reader::new(r#"[1,{"a":2]"#).skip_element());
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(
        err.message(),
        "Bracket mismatch: '{' opened at position 3 was closed by ']', expected '}'"
    );
    assert_eq!(err.position(), 9);
}

#[test]
fn skip_reports_eof() {
    let err = expect_err(Reader::new("[1, [2").skip_element());
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(err.position(), 6);
}

#[rstest]
#[case("}")]
#[case(",")]
#[case("")]
fn skip_requires_a_value(#[case] input: &str) {
    assert!(Reader::new(input).skip_element().is_err());
}

#[test]
fn expect_eof_rejects_trailing_content() {
    let mut r = Reader::new("1 2");
    r.consume_string_lenient().unwrap();
    let err = expect_err(r.expect_eof());
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.position(), 2);
}

#[test]
#[should_panic(expected = "Lexical error")]
fn panic_on_error_panics_at_the_failure() {
    let mut r = Reader::new("\"abc");
    r.set_panic_on_error(true);
    let _ = r.consume_string();
}

fn quickcheck_tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}

/// Property: any string encoded by `serde_json` reads back unchanged, and is
/// borrowed exactly when the encoder did not need an escape.
#[test]
fn string_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: String) -> bool {
        let encoded = serde_json::to_string(&value).unwrap();
        let mut r = Reader::new(&encoded);
        let decoded = r.consume_string().unwrap();
        let needs_escape = value.chars().any(|c| c == '"' || c == '\\' || c < ' ');
        decoded == value.as_str()
            && matches!(decoded, Cow::Borrowed(_)) != needs_escape
            && r.expect_eof().is_ok()
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(String) -> bool);
}

/// Property: encoding every character as `\uXXXX` code units (surrogate
/// pairs above the BMP) decodes to the original string.
#[test]
fn unicode_escape_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: String) -> bool {
        let mut encoded = String::from("\"");
        for unit in value.encode_utf16() {
            encoded.push_str(&format!("\\u{unit:04x}"));
        }
        encoded.push('"');
        Reader::new(&encoded).consume_string().unwrap() == value.as_str()
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(String) -> bool);
}

#[test]
fn key_fast_path_matches_string_path() {
    for input in ["\"k\"", "\"k\\\\\"", "\"\\u006b\"", "\"ключ\""] {
        let key = Reader::new(input).consume_key_string().unwrap().to_string();
        let value = Reader::new(input).consume_string().unwrap().to_string();
        assert_eq!(key, value);
    }
}
