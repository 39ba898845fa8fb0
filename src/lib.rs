// src/lib.rs

//! _ttaillib_ finds where the trailing time span of an append-only log file
//! begins, e.g. "the last 10 minutes of `/var/log/app.log`", without reading
//! the whole file.
//!
//! Each line of a log file carries one timestamp. Timestamps grow with the
//! byte offset. The offset of the first line within the trailing duration
//! is found with a binary search over fixed-size windows of the file, the
//! bytes from that offset are then copied out.
//!
//! * [`SearchConfig`] settings of a search, built from a named [`LogFormat`]
//!   and overrides
//! * [`FileSession`] searches one file and copies out the result
//! * [`OffsetLocator`] the binary search
//! * [`WindowReader`] finds complete lines within windows of a file
//! * [`TimestampExtractor`] finds and parses the timestamp of a line
//!
//! Driver program `ttail` is in `src/bin/ttail.rs`.
//!
//! [`SearchConfig`]: crate::config::searchconfig::SearchConfig
//! [`LogFormat`]: crate::config::formats::LogFormat
//! [`FileSession`]: crate::readers::filesession::FileSession
//! [`OffsetLocator`]: crate::readers::offsetlocator::OffsetLocator
//! [`WindowReader`]: crate::readers::windowreader::WindowReader
//! [`TimestampExtractor`]: crate::data::timestamp::TimestampExtractor

pub mod common;
pub mod config;
pub mod data;
pub mod debug;
pub mod readers;
#[cfg(test)]
pub mod tests;
