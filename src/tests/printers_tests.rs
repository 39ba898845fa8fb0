// src/tests/printers_tests.rs

//! tests for `printers.rs`

#![allow(non_snake_case)]

use crate::debug::printers::{buffer_to_String_noraw, byte_to_char_noraw, str_to_String_noraw};

use ::test_case::test_case;

#[test_case(b"", ""; "empty")]
#[test_case(b"abc", "abc"; "plain")]
#[test_case(b"\ttimestamp=x\t\n", "␉timestamp=x␉␊"; "tskv")]
#[test_case(b"a\r\nb", "a␍␊b"; "crlf")]
#[test_case(b"a\xffb", "a\u{FFFD}b"; "invalid UTF-8")]
fn test_buffer_to_String_noraw(
    buffer: &[u8],
    expect: &str,
) {
    assert_eq!(buffer_to_String_noraw(buffer), expect);
}

#[test]
fn test_str_to_String_noraw() {
    assert_eq!(str_to_String_noraw("\0a\x1b"), "␀a␛");
}

#[test]
fn test_byte_to_char_noraw() {
    assert_eq!(byte_to_char_noraw(b'\n'), '␊');
    assert_eq!(byte_to_char_noraw(b'x'), 'x');
}
