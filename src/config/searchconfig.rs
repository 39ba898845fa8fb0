// src/config/searchconfig.rs

//! Implements [`SearchConfig`], the validated, immutable settings of one
//! search, and its [`SearchConfigBuilder`].
//!
//! [`SearchConfig`]: crate::config::searchconfig::SearchConfig
//! [`SearchConfigBuilder`]: crate::config::searchconfig::SearchConfigBuilder

use crate::config::formats::LogFormat;
use crate::data::datetime::{
    layout_to_strftime,
    local_now_offset,
    local_now_year,
    DateTimeL,
    Duration,
    FixedOffset,
    Year,
};
use crate::data::timestamp::{TimestampExtractor, TSKV_LAYOUT, TSKV_PATTERN};
use crate::readers::windowreader::{WindowSz, WINDOWSZ_DEF, WINDOWSZ_MAX, WINDOWSZ_MIN};

use std::fmt;
use std::io::{Error, ErrorKind, Result};
use std::sync::Arc;

use ::regex::bytes::Regex;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Default count of windows read backward from the end of a file when
/// looking for the last line timestamp.
pub const STEPS_LIMIT_DEF: usize = 1024;

/// Default trailing duration in seconds.
pub const DURATION_DEF_SECS: i64 = 10;

/// The moment that the trailing duration is measured back from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReferenceTime {
    /// The wall clock when the search begins.
    #[default]
    Now,
    /// The timestamp of the last line of the file that has one.
    LastLine,
    /// A given datetime.
    Fixed(DateTimeL),
}

impl fmt::Display for ReferenceTime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        match self {
            ReferenceTime::Now => write!(f, "now"),
            ReferenceTime::LastLine => write!(f, "last line"),
            ReferenceTime::Fixed(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// Settings of a search.
///
/// Create with [`SearchConfigBuilder`]. Immutable after creation; shared
/// between threads within an `Arc`.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub reference: ReferenceTime,
    /// the trailing duration, never negative
    pub duration: Duration,
    /// bytes read per window, within `WINDOWSZ_MIN` and `WINDOWSZ_MAX`
    pub windowsz: WindowSz,
    /// count of windows read backward for `ReferenceTime::LastLine`
    pub steps_limit: usize,
    /// the first capture group is the datetime substring
    pub pattern: Arc<Regex>,
    /// chrono strftime pattern of the datetime substring
    pub layout: String,
    /// offset of timestamps without a timezone
    pub tz_offset: FixedOffset,
    /// year of timestamps without a year
    pub year_filler: Year,
}

impl SearchConfig {
    /// A new [`TimestampExtractor`] for this configuration.
    pub fn new_extractor(&self) -> TimestampExtractor {
        TimestampExtractor::new(
            self.pattern.clone(),
            self.layout.as_str(),
            self.tz_offset,
            self.year_filler,
        )
    }
}

/// Builds a [`SearchConfig`].
///
/// A value is taken from, in order of precedence, the explicit setter, the
/// [`LogFormat`] passed to [`format`], the default.
///
/// [`format`]: SearchConfigBuilder::format
#[derive(Clone, Debug, Default)]
pub struct SearchConfigBuilder {
    reference: ReferenceTime,
    duration: Option<Duration>,
    windowsz: Option<WindowSz>,
    steps_limit: Option<usize>,
    pattern: Option<String>,
    layout: Option<String>,
    tz_offset: Option<FixedOffset>,
    year_filler: Option<Year>,
    format: Option<LogFormat>,
}

impl SearchConfigBuilder {
    pub fn new() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    pub fn reference(
        mut self,
        reference: ReferenceTime,
    ) -> Self {
        self.reference = reference;
        self
    }

    pub fn duration(
        mut self,
        duration: Duration,
    ) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn windowsz(
        mut self,
        windowsz: WindowSz,
    ) -> Self {
        self.windowsz = Some(windowsz);
        self
    }

    pub fn steps_limit(
        mut self,
        steps_limit: usize,
    ) -> Self {
        self.steps_limit = Some(steps_limit);
        self
    }

    /// Regular expression with the datetime substring as the first capture
    /// group.
    pub fn pattern(
        mut self,
        pattern: &str,
    ) -> Self {
        self.pattern = Some(String::from(pattern));
        self
    }

    /// A chrono strftime pattern, or a Go reference layout.
    pub fn layout(
        mut self,
        layout: &str,
    ) -> Self {
        self.layout = Some(String::from(layout));
        self
    }

    pub fn tz_offset(
        mut self,
        tz_offset: FixedOffset,
    ) -> Self {
        self.tz_offset = Some(tz_offset);
        self
    }

    pub fn year_filler(
        mut self,
        year: Year,
    ) -> Self {
        self.year_filler = Some(year);
        self
    }

    /// Overlay the non-empty fields of a `LogFormat` over the defaults.
    pub fn format(
        mut self,
        format: &LogFormat,
    ) -> Self {
        self.format = Some(format.clone());
        self
    }

    /// Validate and create the `SearchConfig`.
    ///
    /// Errors are `ErrorKind::InvalidInput`.
    pub fn build(self) -> Result<SearchConfig> {
        defn!("{:?}", self);
        let format: LogFormat = self.format.unwrap_or_default();

        let windowsz: WindowSz = self
            .windowsz
            .or(format.windowsz.filter(|sz| *sz != 0))
            .unwrap_or(WINDOWSZ_DEF);
        if !(WINDOWSZ_MIN..=WINDOWSZ_MAX).contains(&windowsz) {
            defx!("bad windowsz {}", windowsz);
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("window size {} must be from {} to {}", windowsz, WINDOWSZ_MIN, WINDOWSZ_MAX),
            ));
        }

        let steps_limit: usize = self
            .steps_limit
            .or(format.steps_limit.filter(|sl| *sl != 0))
            .unwrap_or(STEPS_LIMIT_DEF);
        if steps_limit == 0 {
            defx!("bad steps_limit");
            return Err(Error::new(ErrorKind::InvalidInput, "steps limit must be greater than 0"));
        }

        let duration: Duration = self
            .duration
            .unwrap_or_else(|| Duration::seconds(DURATION_DEF_SECS));
        if duration < Duration::zero() {
            defx!("negative duration {:?}", duration);
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("duration {} is negative", duration),
            ));
        }

        let pattern_s: String = match self.pattern {
            Some(val) => val,
            None => match format.pattern {
                Some(val) if !val.is_empty() => val,
                _ => String::from(TSKV_PATTERN),
            },
        };
        let pattern: Regex = match Regex::new(pattern_s.as_str()) {
            Ok(val) => val,
            Err(err) => {
                defx!("bad pattern {:?}", pattern_s);
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("invalid timestamp pattern {:?}; {}", pattern_s, err),
                ));
            }
        };
        // `captures_len` counts the implicit whole-match group
        if pattern.captures_len() < 2 {
            defx!("no capture group {:?}", pattern_s);
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("timestamp pattern {:?} has no capture group", pattern_s),
            ));
        }

        let layout_s: String = match self.layout {
            Some(val) => val,
            None => match format.layout {
                Some(val) if !val.is_empty() => val,
                _ => String::from(TSKV_LAYOUT),
            },
        };
        if layout_s.is_empty() {
            defx!("empty layout");
            return Err(Error::new(ErrorKind::InvalidInput, "timestamp layout is empty"));
        }
        let layout: String = layout_to_strftime(layout_s.as_str());

        let config = SearchConfig {
            reference: self.reference,
            duration,
            windowsz,
            steps_limit,
            pattern: Arc::new(pattern),
            layout,
            tz_offset: self.tz_offset.unwrap_or_else(local_now_offset),
            year_filler: self.year_filler.unwrap_or_else(local_now_year),
        };
        defx!("return {:?}", config);

        Ok(config)
    }
}
