// src/data/mod.rs

//! The `data` module is datetime helpers and the timestamp extraction of
//! a single line.
//!
//! ## Definitions of data
//!
//! ### Line
//!
//! A "line" is sequence of bytes that:
//!
//! * begin after a prior "line" or the beginning of a file.
//! * end with a newline character `'\n'` or the end of a file.
//!
//! A "line" is isolated by a [`WindowReader`]. The terminating newline is
//! not part of the line.
//!
//! ### Timestamp
//!
//! A "timestamp" is the datetime substring of a line matched by the first
//! capture group of a regular expression and parsed with a strftime layout.
//! At most one timestamp is taken from a line.
//!
//! A timestamp is found by a [`TimestampExtractor`].
//!
//! [`WindowReader`]: crate::readers::windowreader::WindowReader
//! [`TimestampExtractor`]: crate::data::timestamp::TimestampExtractor

pub mod datetime;
pub mod timestamp;
