// src/config/formats.rs

//! Implements the [`FormatRegistry`] of named log formats, the built-in
//! formats merged with the formats of an optional TOML file.
//!
//! A TOML file has one table per format. All keys are optional.
//!
//! ```toml
//! [myapp]
//! bufSize = 32768
//! stepsLimit = 64
//! timeReStr = '^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]'
//! timeLayout = "2006-01-02 15:04:05"
//! ```
//!
//! `timeLayout` is a Go reference layout or a chrono strftime pattern.
//!
//! [`FormatRegistry`]: crate::config::formats::FormatRegistry

use crate::common::FPath;
use crate::data::datetime::{layout_to_strftime, FixedOffset, Year};
use crate::data::timestamp::{TimestampExtractor, TSKV_LAYOUT, TSKV_PATTERN};

use std::collections::BTreeMap;
use std::io::{Error, ErrorKind, Result};
use std::sync::Arc;

use ::regex::bytes::Regex;
use ::serde::Deserialize;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Default path of the format file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ttail/types.toml";

/// Name of the default format.
pub const FORMAT_DEFAULT: &str = "tskv";

/// Settings of a named log format. Unset fields keep the defaults of the
/// [`SearchConfigBuilder`].
///
/// [`SearchConfigBuilder`]: crate::config::searchconfig::SearchConfigBuilder
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct LogFormat {
    #[serde(rename = "bufSize")]
    pub windowsz: Option<usize>,
    #[serde(rename = "stepsLimit")]
    pub steps_limit: Option<usize>,
    #[serde(rename = "timeReStr")]
    pub pattern: Option<String>,
    #[serde(rename = "timeLayout")]
    pub layout: Option<String>,
}

impl LogFormat {
    fn new(
        pattern: &str,
        layout: &str,
    ) -> LogFormat {
        LogFormat {
            windowsz: None,
            steps_limit: None,
            pattern: Some(String::from(pattern)),
            layout: Some(String::from(layout)),
        }
    }
}

/// Built-in formats; name, timestamp pattern, layout.
const BUILTIN_FORMATS: [(&str, &str, &str); 25] = [
    (FORMAT_DEFAULT, TSKV_PATTERN, TSKV_LAYOUT),
    ("kern", r"^(\d{4}-\d{2}-\d{2}T\d\d:\d\d:\d\d)", "2006-01-02T15:04:05"),
    ("apache", r"\[(\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2})\s", "02/Jan/2006:15:04:05"),
    ("apache_common", r"\[(\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2})\s", "02/Jan/2006:15:04:05"),
    ("apache_combined", r"\[(\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2})\s", "02/Jan/2006:15:04:05"),
    ("nginx", r"\[(\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2})\s", "02/Jan/2006:15:04:05"),
    ("nginx_iso", r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})", "2006-01-02T15:04:05"),
    ("java", r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})", "2006-01-02 15:04:05"),
    ("java_iso", r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})", "2006-01-02T15:04:05"),
    ("python", r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}),\d+", "2006-01-02 15:04:05"),
    ("go", r"^(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2})", "2006/01/02 15:04:05"),
    ("docker", r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z)", "2006-01-02T15:04:05.000000000Z"),
    ("docker_local", r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})", "2006-01-02T15:04:05"),
    ("kubernetes", r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z)", "2006-01-02T15:04:05.000000000Z"),
    ("syslog", r"^(\w{3}\s+\d{1,2} \d{2}:\d{2}:\d{2})", "Jan _2 15:04:05"),
    ("syslog_rfc5424", r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})", "2006-01-02T15:04:05"),
    ("mysql", r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z)", "2006-01-02T15:04:05.000000Z"),
    ("mysql_general", r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})", "2006-01-02 15:04:05"),
    ("postgresql", r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d+)", "2006-01-02 15:04:05.000"),
    ("elasticsearch", r"\[(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}),\d+\]", "2006-01-02T15:04:05"),
    ("logstash", r#""@timestamp":"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z)""#, "2006-01-02T15:04:05.000Z"),
    ("json", r#""timestamp":"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})""#, "2006-01-02T15:04:05"),
    ("json_time", r#""time":"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})""#, "2006-01-02T15:04:05"),
    ("rails", r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})", "2006-01-02 15:04:05"),
    ("django", r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}),\d+", "2006-01-02 15:04:05"),
];

/// Built-in formats tried by [`FormatRegistry::detect`], most particular
/// first. Formats with the same pattern as an earlier entry are left out.
const DETECT_ORDER: [&str; 14] = [
    FORMAT_DEFAULT,
    "logstash",
    "json",
    "json_time",
    "elasticsearch",
    "apache",
    "docker",
    "python",
    "postgresql",
    "java",
    "go",
    "kern",
    "syslog",
    "nginx_iso",
];

fn builtin_format(name: &str) -> Option<LogFormat> {
    BUILTIN_FORMATS
        .iter()
        .find(|(name_, _, _)| *name_ == name)
        .map(|(_, pattern, layout)| LogFormat::new(pattern, layout))
}

/// Named log formats.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatRegistry {
    formats: BTreeMap<String, LogFormat>,
}

impl FormatRegistry {
    /// Only the built-in formats.
    pub fn builtin() -> FormatRegistry {
        let mut formats: BTreeMap<String, LogFormat> = BTreeMap::new();
        for (name, pattern, layout) in BUILTIN_FORMATS.iter() {
            formats.insert(String::from(*name), LogFormat::new(pattern, layout));
        }

        FormatRegistry { formats }
    }

    /// The built-in formats and the formats of TOML text `data`.
    /// A format of `data` replaces the built-in format of the same name.
    pub fn from_toml_str(data: &str) -> Result<FormatRegistry> {
        defn!();
        let file_formats: BTreeMap<String, LogFormat> = match toml::from_str(data) {
            Ok(val) => val,
            Err(err) => {
                defx!("toml error {}", err);
                return Err(Error::new(ErrorKind::InvalidData, format!("invalid format file; {}", err)));
            }
        };
        let mut registry = FormatRegistry::builtin();
        for (name, format) in file_formats.into_iter() {
            defo!("format {:?} {:?}", name, format);
            registry.formats.insert(name, format);
        }
        defx!();

        Ok(registry)
    }

    /// The built-in formats and the formats of the TOML file at `path`.
    /// A file that does not exist is the built-in formats only.
    pub fn load(path: &FPath) -> Result<FormatRegistry> {
        defn!("({:?})", path);
        let data: String = match std::fs::read_to_string(path) {
            Ok(val) => val,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                defx!("not found, return builtin");
                return Ok(FormatRegistry::builtin());
            }
            Err(err) => {
                defx!("error {}", err);
                return Err(Error::new(err.kind(), format!("{}: {}", path, err)));
            }
        };
        let registry = match FormatRegistry::from_toml_str(data.as_str()) {
            Ok(val) => val,
            Err(err) => {
                defx!("error {}", err);
                return Err(Error::new(err.kind(), format!("{}: {}", path, err)));
            }
        };
        defx!("{} formats", registry.formats.len());

        Ok(registry)
    }

    /// The format named `name`.
    pub fn get(
        &self,
        name: &str,
    ) -> Result<&LogFormat> {
        match self.formats.get(name) {
            Some(format) => Ok(format),
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("failed to find options for log type: {}", name),
            )),
        }
    }

    /// Names of all formats, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.formats.keys().map(|name| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Name of the first built-in format that extracts a timestamp from any
    /// of the `lines`.
    pub fn detect(
        lines: &[&[u8]],
        tz_offset: FixedOffset,
        year_filler: Year,
    ) -> Option<&'static str> {
        defn!("({} lines)", lines.len());
        for name in DETECT_ORDER.iter() {
            let format = match builtin_format(name) {
                Some(val) => val,
                None => continue,
            };
            let (pattern, layout) = match (format.pattern, format.layout) {
                (Some(pattern), Some(layout)) => (pattern, layout),
                _ => continue,
            };
            let regex = match Regex::new(pattern.as_str()) {
                Ok(val) => val,
                Err(_err) => {
                    defo!("{:?} bad pattern {}", name, _err);
                    continue;
                }
            };
            let layout = layout_to_strftime(layout.as_str());
            let mut extractor = TimestampExtractor::new(Arc::new(regex), layout.as_str(), tz_offset, year_filler);
            if lines
                .iter()
                .any(|line| extractor.extract(line).is_some())
            {
                defx!("return {:?}", name);
                return Some(*name);
            }
        }
        defx!("return None");

        None
    }
}
