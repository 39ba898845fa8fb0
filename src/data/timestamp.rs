// src/data/timestamp.rs

//! Implements [`TimestampExtractor`], finds and parses the one timestamp of
//! a log line.
//!
//! [`TimestampExtractor`]: crate::data::timestamp::TimestampExtractor

#[cfg(any(debug_assertions, test))]
use crate::debug::printers::buffer_to_String_noraw;
use crate::data::datetime::{
    datetime_parse_from_str,
    pattern_has_tz,
    pattern_has_year,
    DateTimeLOpt,
    FixedOffset,
    Year,
};

use std::fmt;
use std::fmt::Write as _; // for `write!` onto a `String`
use std::sync::Arc;

use ::memchr::memmem;
use ::regex::bytes::{CaptureLocations, Regex};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TSKV fast path
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The default tab-separated key-value ("TSKV") timestamp pattern.
/// The first capture group is the datetime substring.
pub const TSKV_PATTERN: &str =
    r"\ttimestamp=([0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2})\t";

/// The default strftime layout matching [`TSKV_PATTERN`].
pub const TSKV_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// Literal that precedes a TSKV timestamp.
const TSKV_KEY: &[u8] = b"\ttimestamp=";

/// Byte length of a TSKV timestamp, e.g. `2023-12-25T10:00:00`.
const TSKV_STAMP_LEN: usize = 19;

/// Does `stamp` have the shape `NNNN-NN-NNTNN:NN:NN` followed by a tab?
///
/// Same rule as the capture group and trailing `\t` of [`TSKV_PATTERN`].
#[inline(always)]
fn tskv_stamp_shape(stamp: &[u8]) -> bool {
    if stamp.len() != TSKV_STAMP_LEN + 1 {
        return false;
    }
    for (at, b) in stamp[..TSKV_STAMP_LEN].iter().enumerate() {
        let ok = match at {
            4 | 7 => *b == b'-',
            10 => *b == b'T',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        };
        if !ok {
            return false;
        }
    }

    stamp[TSKV_STAMP_LEN] == b'\t'
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimestampExtractor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Extracts the timestamp from a line of bytes.
///
/// The configured [`Regex`] is applied to the line, the first capture group
/// is decoded as UTF-8 and parsed with the strftime `layout`.
/// A line that does not match, or a match that does not parse, has no
/// timestamp; that is `None`, never an error.
///
/// For the default TSKV pattern and layout a literal scan replaces the
/// regular expression. Both ways return the same value for any line.
///
/// A `TimestampExtractor` owns scratch storage so it is not shared between
/// concurrent searches, create one per search.
///
/// [`Regex`]: https://docs.rs/regex/1.11.1/regex/bytes/struct.Regex.html
pub struct TimestampExtractor {
    /// the timestamp pattern; the first capture group is the datetime substring
    pattern: Arc<Regex>,
    /// strftime layout of the datetime substring
    layout: String,
    /// `layout` prefixed with `"%Y "`, used when `layout` has no year
    layout_with_year: String,
    /// `layout` has a numeric timezone
    has_tz: bool,
    /// `layout` has a year
    has_year: bool,
    /// fallback timezone for a `layout` without a timezone
    tz_offset: FixedOffset,
    /// fallback year for a `layout` without a year
    year_filler: Year,
    /// use the TSKV literal scan
    tskv_fast: bool,
    /// reusable capture group locations
    locs: CaptureLocations,
    /// reusable buffer for year filling
    scratch: String,
    /// finds `TSKV_KEY`
    finder: memmem::Finder<'static>,
    /// count of calls to `extract`
    pub(crate) extract_count: u64,
    /// count of calls to `extract` that returned `Some`
    pub(crate) extract_found: u64,
}

impl fmt::Debug for TimestampExtractor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("TimestampExtractor")
            .field("pattern", &self.pattern.as_str())
            .field("layout", &self.layout)
            .field("has_tz", &self.has_tz)
            .field("has_year", &self.has_year)
            .field("tz_offset", &self.tz_offset)
            .field("year_filler", &self.year_filler)
            .field("tskv_fast", &self.tskv_fast)
            .finish()
    }
}

impl TimestampExtractor {
    /// Create a new `TimestampExtractor`.
    ///
    /// `layout` is a chrono strftime pattern. The `pattern` must have at
    /// least one capture group, see [`SearchConfigBuilder::build`].
    ///
    /// [`SearchConfigBuilder::build`]: crate::config::searchconfig::SearchConfigBuilder::build
    pub fn new(
        pattern: Arc<Regex>,
        layout: &str,
        tz_offset: FixedOffset,
        year_filler: Year,
    ) -> TimestampExtractor {
        defn!("({:?}, {:?}, {:?}, {:?})", pattern.as_str(), layout, tz_offset, year_filler);
        let has_tz = pattern_has_tz(layout);
        let has_year = pattern_has_year(layout);
        let tskv_fast = pattern.as_str() == TSKV_PATTERN && layout == TSKV_LAYOUT;
        let locs = pattern.capture_locations();
        let mut layout_with_year = String::with_capacity(layout.len() + 3);
        layout_with_year.push_str("%Y ");
        layout_with_year.push_str(layout);
        defx!("has_tz {}, has_year {}, tskv_fast {}", has_tz, has_year, tskv_fast);

        TimestampExtractor {
            pattern,
            layout: String::from(layout),
            layout_with_year,
            has_tz,
            has_year,
            tz_offset,
            year_filler,
            tskv_fast,
            locs,
            scratch: String::with_capacity(64),
            finder: memmem::Finder::new(TSKV_KEY),
            extract_count: 0,
            extract_found: 0,
        }
    }

    /// Is the TSKV literal scan used?
    pub const fn is_tskv_fast(&self) -> bool {
        self.tskv_fast
    }

    /// Find and parse the timestamp of the `line`.
    pub fn extract(
        &mut self,
        line: &[u8],
    ) -> DateTimeLOpt {
        self.extract_count += 1;
        let result = match self.tskv_fast {
            true => self.extract_tskv(line),
            false => self.extract_regex(line),
        };
        if result.is_some() {
            self.extract_found += 1;
        }

        result
    }

    /// Find and parse the timestamp of the `line` with the regular expression.
    pub fn extract_regex(
        &mut self,
        line: &[u8],
    ) -> DateTimeLOpt {
        defn!("({:?})", buffer_to_String_noraw(line));
        if self
            .pattern
            .captures_read(&mut self.locs, line)
            .is_none()
        {
            defx!("no match");
            return None;
        }
        let (start, end) = match self.locs.get(1) {
            Some(se) => se,
            None => {
                defx!("no capture group 1");
                return None;
            }
        };
        let result = self.parse(&line[start..end]);
        defx!("return {:?}", result);

        result
    }

    /// Find and parse the timestamp of the `line` with a literal scan for
    /// `"\ttimestamp="`.
    ///
    /// The first occurrence followed by a timestamp shape and a tab is
    /// parsed, like the leftmost match of the default pattern.
    pub fn extract_tskv(
        &mut self,
        line: &[u8],
    ) -> DateTimeLOpt {
        defn!("({:?})", buffer_to_String_noraw(line));
        let mut stamp: Option<(usize, usize)> = None;
        for at in self.finder.find_iter(line) {
            let a = at + TSKV_KEY.len();
            let b = a + TSKV_STAMP_LEN + 1;
            if b > line.len() {
                // later occurrences are even closer to the end
                break;
            }
            if tskv_stamp_shape(&line[a..b]) {
                stamp = Some((a, a + TSKV_STAMP_LEN));
                break;
            }
        }
        let result = match stamp {
            Some((a, b)) => self.parse(&line[a..b]),
            None => None,
        };
        defx!("return {:?}", result);

        result
    }

    /// Parse the captured datetime substring.
    fn parse(
        &mut self,
        data: &[u8],
    ) -> DateTimeLOpt {
        let data: &str = match std::str::from_utf8(data) {
            Ok(val) => val,
            Err(_err) => {
                defñ!("from_utf8 failed {}", _err);
                return None;
            }
        };
        if self.has_year {
            return datetime_parse_from_str(data, &self.layout, self.has_tz, &self.tz_offset);
        }
        // prepend the filler year to the data, the layout already has it
        self.scratch.clear();
        // writing to a `String` cannot fail
        let _ = write!(self.scratch, "{} ", self.year_filler);
        self.scratch.push_str(data);

        datetime_parse_from_str(&self.scratch, &self.layout_with_year, self.has_tz, &self.tz_offset)
    }

    /// The strftime layout.
    pub fn layout(&self) -> &str {
        self.layout.as_str()
    }
}
