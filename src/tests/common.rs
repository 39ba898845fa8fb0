// src/tests/common.rs

//! Common data and helper functions for tests.

#![allow(non_upper_case_globals)]

use crate::common::{FileOffset, FileSz};
use crate::config::searchconfig::{ReferenceTime, SearchConfig, SearchConfigBuilder};
use crate::data::datetime::{DateTimeL, Duration, FixedOffset, TimeZone};
use crate::readers::bytesource::ByteSource;
use crate::readers::windowreader::WindowSz;

use std::io::{Read, Result, Seek, SeekFrom};
use std::sync::Arc;

extern crate lazy_static;
use lazy_static::lazy_static;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

lazy_static! {
    pub static ref FO_0: FixedOffset = FixedOffset::east_opt(0).unwrap();
    pub static ref FO_P1: FixedOffset = FixedOffset::east_opt(3600).unwrap();
    pub static ref FO_M8: FixedOffset = FixedOffset::west_opt(3600 * 8).unwrap();
    pub static ref FO_P5_30: FixedOffset = FixedOffset::east_opt(3600 * 5 + 1800).unwrap();
}

/// year used for layouts without a year
pub const YEAR_TEST: i32 = 2023;

/// Byte length of a line from [`tskv_lines`].
pub const TSKV_LINE_LEN: FileOffset = 41;

pub fn ymdhms(
    fixedoffset: &FixedOffset,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> DateTimeL {
    fixedoffset
        .with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

/// `2023-12-25T10:00:00+00:00`, the first timestamp of most test data
pub fn dt_start() -> DateTimeL {
    ymdhms(&FO_0, 2023, 12, 25, 10, 0, 0)
}

/// One TSKV line, e.g. `"\ttimestamp=2023-12-25T10:00:00\tmsg=00001\n"`.
pub fn tskv_line(
    dt: &DateTimeL,
    msg: &str,
) -> String {
    format!("\ttimestamp={}\tmsg={}\n", dt.format("%Y-%m-%dT%H:%M:%S"), msg)
}

/// `count` TSKV lines one `step` apart beginning at `start`.
/// Each line is [`TSKV_LINE_LEN`] bytes for `count` up to 100000.
pub fn tskv_lines(
    start: &DateTimeL,
    count: usize,
    step: Duration,
) -> String {
    let mut data = String::with_capacity(count * TSKV_LINE_LEN as usize);
    let mut dt: DateTimeL = *start;
    for index in 0..count {
        data.push_str(tskv_line(&dt, format!("{:05}", index).as_str()).as_str());
        dt = dt + step;
    }

    data
}

/// Build log data line by line and remember the offset of each line.
#[derive(Debug, Default)]
pub struct LogBuilder {
    pub data: String,
    pub offsets: Vec<FileOffset>,
}

impl LogBuilder {
    pub fn new() -> LogBuilder {
        LogBuilder::default()
    }

    /// Append `line`, a newline is added. Returns the offset of the line.
    pub fn line(
        &mut self,
        line: &str,
    ) -> FileOffset {
        let at = self.data.len() as FileOffset;
        self.offsets.push(at);
        self.data.push_str(line);
        self.data.push('\n');

        at
    }

    /// Append a TSKV line for `dt`. Returns the offset of the line.
    pub fn tskv(
        &mut self,
        dt: &DateTimeL,
        msg: &str,
    ) -> FileOffset {
        let line = tskv_line(dt, msg);
        self.line(line.trim_end_matches('\n'))
    }

    pub fn len(&self) -> FileOffset {
        self.data.len() as FileOffset
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }
}

/// A TSKV [`SearchConfig`] in UTC.
pub fn config_tskv(
    reference: ReferenceTime,
    duration: Duration,
    windowsz: WindowSz,
) -> Arc<SearchConfig> {
    Arc::new(
        SearchConfigBuilder::new()
            .reference(reference)
            .duration(duration)
            .windowsz(windowsz)
            .tz_offset(*FO_0)
            .year_filler(YEAR_TEST)
            .build()
            .unwrap(),
    )
}

/// A [`ByteSource`] where every read fails.
#[derive(Debug, Default)]
pub struct FailingSource {
    pub size: FileSz,
}

impl Read for FailingSource {
    fn read(
        &mut self,
        _buf: &mut [u8],
    ) -> Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "read failed"))
    }
}

impl Seek for FailingSource {
    fn seek(
        &mut self,
        _pos: SeekFrom,
    ) -> Result<u64> {
        Ok(0)
    }
}

impl ByteSource for FailingSource {
    fn read_at(
        &self,
        _buf: &mut [u8],
        _offset: FileOffset,
    ) -> Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "read_at failed"))
    }

    fn size(&self) -> Result<FileSz> {
        Ok(self.size)
    }
}
