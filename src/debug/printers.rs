// src/debug/printers.rs

//! Printers for error messages and for the debug tracing of raw log bytes.

#[doc(hidden)]
#[allow(unused_imports)]
use ::utf8_iter::Utf8CharsEx; // `.chars()` on `&[u8]`

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// messages to stderr
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `eprintln!` with an `ERROR: ` prefix.
#[macro_export]
macro_rules! e_err {
    ($($args:tt)*) => {{
        eprint!("ERROR: ");
        eprintln!($($args)*)
    }}
}
pub use e_err;

/// `eprintln!` with a `WARNING: ` prefix.
#[macro_export]
macro_rules! e_wrn {
    ($($args:tt)*) => {{
        eprint!("WARNING: ");
        eprintln!($($args)*)
    }}
}
pub use e_wrn;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// control characters made visible
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Replace a control character with its Unicode "control picture",
/// e.g. `'\t'` becomes `'␉'`. Other chars are returned unchanged.
///
/// Traced lines are mostly tab-separated; one picture keeps one column.
pub const fn char_to_char_noraw(c: char) -> char {
    match c {
        '\0' => '␀',
        '\x07' => '␇',
        '\x08' => '␈',
        '\t' => '␉',
        '\n' => '␊',
        '\x0B' => '␋',
        '\x0C' => '␌',
        '\r' => '␍',
        '\x1B' => '␛',
        '\x7F' => '␡',
        _ => c,
    }
}

#[doc(hidden)]
pub const fn byte_to_char_noraw(byte: u8) -> char {
    char_to_char_noraw(byte as char)
}

/// Printable copy of a line of raw log bytes. Invalid UTF-8 becomes
/// `'\u{FFFD}'`.
#[doc(hidden)]
#[allow(non_snake_case)]
pub fn buffer_to_String_noraw(buffer: &[u8]) -> String {
    buffer
        .chars()
        .map(char_to_char_noraw)
        .collect()
}

#[doc(hidden)]
#[allow(non_snake_case)]
pub fn str_to_String_noraw(str_buf: &str) -> String {
    str_buf
        .chars()
        .map(char_to_char_noraw)
        .collect()
}
