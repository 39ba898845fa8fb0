// src/tests/searchconfig_tests.rs

//! tests for `searchconfig.rs`

#![allow(non_snake_case)]

use crate::tests::common::{ymdhms, FO_0, FO_P1, YEAR_TEST};
use crate::config::formats::LogFormat;
use crate::config::searchconfig::{
    ReferenceTime,
    SearchConfigBuilder,
    DURATION_DEF_SECS,
    STEPS_LIMIT_DEF,
};
use crate::data::datetime::Duration;
use crate::data::timestamp::{TSKV_LAYOUT, TSKV_PATTERN};
use crate::readers::windowreader::{WindowSz, WINDOWSZ_DEF, WINDOWSZ_MAX, WINDOWSZ_MIN};

use std::io::ErrorKind;

use ::si_trace_print::stack::stack_offset_set;
use ::test_case::test_case;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn format_myapp() -> LogFormat {
    LogFormat {
        windowsz: Some(32768),
        steps_limit: Some(64),
        pattern: Some(String::from(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]")),
        layout: Some(String::from("2006-01-02 15:04:05")),
    }
}

#[test]
fn test_defaults() {
    stack_offset_set(Some(2));
    let config = SearchConfigBuilder::new().build().unwrap();
    assert_eq!(config.reference, ReferenceTime::Now);
    assert_eq!(config.duration, Duration::seconds(DURATION_DEF_SECS));
    assert_eq!(config.windowsz, WINDOWSZ_DEF);
    assert_eq!(config.steps_limit, STEPS_LIMIT_DEF);
    assert_eq!(config.pattern.as_str(), TSKV_PATTERN);
    assert_eq!(config.layout, TSKV_LAYOUT);
    assert!(config.new_extractor().is_tskv_fast());
}

#[test]
fn test_setters() {
    let fixed = ymdhms(&FO_0, 2023, 12, 25, 10, 0, 0);
    let config = SearchConfigBuilder::new()
        .reference(ReferenceTime::Fixed(fixed))
        .duration(Duration::minutes(5))
        .windowsz(1024)
        .steps_limit(8)
        .pattern(r"^(\S+) ")
        .layout("%Y-%m-%dT%H:%M:%S")
        .tz_offset(*FO_P1)
        .year_filler(YEAR_TEST)
        .build()
        .unwrap();
    assert_eq!(config.reference, ReferenceTime::Fixed(fixed));
    assert_eq!(config.duration, Duration::minutes(5));
    assert_eq!(config.windowsz, 1024);
    assert_eq!(config.steps_limit, 8);
    assert_eq!(config.pattern.as_str(), r"^(\S+) ");
    assert_eq!(config.tz_offset, *FO_P1);
    assert_eq!(config.year_filler, YEAR_TEST);
    assert!(!config.new_extractor().is_tskv_fast());
}

#[test]
fn test_zero_duration() {
    let config = SearchConfigBuilder::new()
        .duration(Duration::zero())
        .build()
        .unwrap();
    assert_eq!(config.duration, Duration::zero());
}

#[test]
fn test_layout_go_translated() {
    let config = SearchConfigBuilder::new()
        .layout("02/Jan/2006:15:04:05")
        .build()
        .unwrap();
    assert_eq!(config.layout, "%d/%b/%Y:%H:%M:%S");
}

#[test_case(WINDOWSZ_MIN, true; "min")]
#[test_case(WINDOWSZ_MAX, true; "max")]
#[test_case(0, false; "zero")]
#[test_case(WINDOWSZ_MIN - 1, false; "below min")]
#[test_case(WINDOWSZ_MAX + 1, false; "above max")]
fn test_windowsz_bounds(
    windowsz: WindowSz,
    ok: bool,
) {
    let result = SearchConfigBuilder::new().windowsz(windowsz).build();
    assert_eq!(result.is_ok(), ok, "windowsz {}", windowsz);
    if let Err(err) = result {
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}

#[test]
fn test_steps_limit_zero() {
    let err = SearchConfigBuilder::new()
        .steps_limit(0)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_negative_duration() {
    let err = SearchConfigBuilder::new()
        .duration(Duration::seconds(-1))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test_case(r"(unclosed"; "does not compile")]
#[test_case(r"\d{4}-\d{2}-\d{2}"; "no capture group")]
#[test_case(r"(?:\d{4})"; "only non-capturing group")]
fn test_bad_pattern(pattern: &str) {
    let err = SearchConfigBuilder::new()
        .pattern(pattern)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("pattern"), "{}", err);
}

#[test]
fn test_empty_layout() {
    let err = SearchConfigBuilder::new()
        .layout("")
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_format_overlay() {
    let config = SearchConfigBuilder::new()
        .format(&format_myapp())
        .build()
        .unwrap();
    assert_eq!(config.windowsz, 32768);
    assert_eq!(config.steps_limit, 64);
    assert_eq!(config.pattern.as_str(), r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]");
    assert_eq!(config.layout, "%Y-%m-%d %H:%M:%S");
}

/// Explicit setters win over the format, in any call order.
#[test]
fn test_explicit_over_format() {
    let config1 = SearchConfigBuilder::new()
        .windowsz(1024)
        .layout("%Y-%m-%d %H:%M:%S%.f")
        .format(&format_myapp())
        .build()
        .unwrap();
    let config2 = SearchConfigBuilder::new()
        .format(&format_myapp())
        .windowsz(1024)
        .layout("%Y-%m-%d %H:%M:%S%.f")
        .build()
        .unwrap();
    for config in [config1, config2] {
        assert_eq!(config.windowsz, 1024);
        assert_eq!(config.layout, "%Y-%m-%d %H:%M:%S%.f");
        // not set explicitly
        assert_eq!(config.steps_limit, 64);
    }
}

/// Zero and empty fields of a format keep the defaults.
#[test]
fn test_format_empty_fields() {
    let format = LogFormat {
        windowsz: Some(0),
        steps_limit: Some(0),
        pattern: Some(String::new()),
        layout: Some(String::new()),
    };
    let config = SearchConfigBuilder::new()
        .format(&format)
        .build()
        .unwrap();
    assert_eq!(config.windowsz, WINDOWSZ_DEF);
    assert_eq!(config.steps_limit, STEPS_LIMIT_DEF);
    assert_eq!(config.pattern.as_str(), TSKV_PATTERN);
    assert_eq!(config.layout, TSKV_LAYOUT);
}

#[test]
fn test_format_windowsz_invalid() {
    let format = LogFormat {
        windowsz: Some(4),
        ..Default::default()
    };
    let err = SearchConfigBuilder::new()
        .format(&format)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_ReferenceTime_Display() {
    assert_eq!(ReferenceTime::Now.to_string(), "now");
    assert_eq!(ReferenceTime::LastLine.to_string(), "last line");
    let fixed = ReferenceTime::Fixed(ymdhms(&FO_P1, 2023, 12, 25, 10, 0, 0));
    assert_eq!(fixed.to_string(), "2023-12-25T10:00:00+01:00");
    assert_eq!(ReferenceTime::default(), ReferenceTime::Now);
}
