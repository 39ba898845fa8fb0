// src/data/datetime.rs

//! Functions to transform datetime substrings of log lines into chrono
//! [`DateTime`] instances.
//!
//! A datetime substring is parsed with a chrono [`strftime`] pattern, the
//! _layout_. Layouts without a timezone are resolved with a fallback
//! [`FixedOffset`]. Layouts without a year are filled with a fallback
//! [`Year`].
//!
//! Layouts may also be written as Go reference layouts, e.g.
//! `"02/Jan/2006:15:04:05"`; see [`layout_go_to_strftime`].
//!
//! [`DateTime`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html
//! [`strftime`]: https://docs.rs/chrono/0.4.40/chrono/format/strftime/index.html
//! [`FixedOffset`]: https://docs.rs/chrono/0.4.40/chrono/offset/struct.FixedOffset.html

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

#[cfg(any(debug_assertions, test))]
use crate::debug::printers::str_to_String_noraw;

use std::collections::BTreeMap;

extern crate chrono;
#[doc(hidden)]
pub use chrono::{
    DateTime,
    Datelike, // adds method `.year()` onto `DateTime`
    Duration,
    FixedOffset,
    Local,
    NaiveDateTime,
    Offset,
    TimeZone,
    Utc,
};

extern crate lazy_static;
use lazy_static::lazy_static;

extern crate si_trace_print;
#[allow(unused_imports)]
use si_trace_print::{dpfn, dpfo, dpfx, dpfñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DateTime types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Year filled into timestamps whose layout has none.
pub type Year = i32;

/// A [`strftime`] layout as understood by [`DateTime::parse_from_str`].
///
/// [`strftime`]: https://docs.rs/chrono/0.4.40/chrono/format/strftime/index.html
/// [`DateTime::parse_from_str`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html#method.parse_from_str
pub type DateTimePattern_str = str;

/// A chrono [`DateTime`] type used in _ttaillib_.
///
/// [`DateTime`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html
pub type DateTimeL = DateTime<FixedOffset>;
pub type DateTimeLOpt = Option<DateTimeL>;

/// strftime specifiers that carry a numeric timezone offset.
const PATTERN_TZ_SPECIFIERS: [&str; 5] = ["%z", "%:z", "%::z", "%:::z", "%#z"];

/// strftime specifiers that carry a year.
const PATTERN_YEAR_SPECIFIERS: [&str; 8] = ["%Y", "%y", "%C", "%G", "%F", "%D", "%c", "%+"];

/// Does the strftime `pattern` have a timezone offset?
///
/// A named timezone `%Z` is not counted; chrono cannot resolve it to an
/// offset so it is parsed and then ignored.
pub fn pattern_has_tz(pattern: &DateTimePattern_str) -> bool {
    PATTERN_TZ_SPECIFIERS
        .iter()
        .any(|spec| pattern.contains(spec))
}

/// Does the strftime `pattern` have a year? Epoch seconds `%s` count as a year.
pub fn pattern_has_year(pattern: &DateTimePattern_str) -> bool {
    pattern.contains("%s")
        || PATTERN_YEAR_SPECIFIERS
            .iter()
            .any(|spec| pattern.contains(spec))
}

/// Parse the timestamp `data` with the strftime `pattern`.
///
/// When `has_tz` is `false` the parsed wall-clock time is placed in
/// `tz_offset`. Returns `None` if `data` does not parse.
///
/// [`&str`]: str
/// [`Option<DateTime<FixedOffset>>`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html
pub fn datetime_parse_from_str(
    data: &str,
    pattern: &DateTimePattern_str,
    has_tz: bool,
    tz_offset: &FixedOffset,
) -> DateTimeLOpt {
    dpfn!("(pattern {:?}, tz_offset {:?}, data {:?})", pattern, tz_offset, str_to_String_noraw(data));

    if has_tz {
        match DateTime::parse_from_str(data, pattern) {
            Ok(val) => {
                dpfx!("return Some({:?})", val);

                Some(val)
            }
            Err(_err) => {
                dpfx!("DateTime::parse_from_str({:?}, {:?}) failed ParseError: {}", data, pattern, _err);

                None
            }
        }
    } else {
        // wall-clock time, then `tz_offset`
        let dt_naive = match NaiveDateTime::parse_from_str(data, pattern) {
            Ok(val) => val,
            Err(_err) => {
                dpfx!("NaiveDateTime.parse_from_str({:?}, {:?}) failed ParseError: {}", data, pattern, _err);
                return None;
            }
        };
        match tz_offset
            .from_local_datetime(&dt_naive)
            .earliest()
        {
            Some(val) => {
                dpfx!("return Some({:?})", val);

                Some(val)
            }
            None => {
                dpfx!("tz_offset.from_local_datetime({:?}) returned None, return None", dt_naive);

                None
            }
        }
    }
}

/// [`datetime_parse_from_str`] for a `pattern` with a timezone offset.
///
/// [`datetime_parse_from_str`]: datetime_parse_from_str
pub fn datetime_parse_from_str_w_tz(
    data: &str,
    pattern: &DateTimePattern_str,
) -> DateTimeLOpt {
    datetime_parse_from_str(data, pattern, true, &*FIXEDOFFSET0)
}

/// The local system timezone offset right now.
pub fn local_now_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// The year right now in the local system timezone.
pub fn local_now_year() -> Year {
    Local::now().year()
}

/// Now as a [`DateTimeL`] in the passed timezone offset.
pub fn now_fixedoffset(tz_offset: &FixedOffset) -> DateTimeL {
    Utc::now().with_timezone(tz_offset)
}

lazy_static! {
    /// UTC as a `FixedOffset`.
    pub static ref FIXEDOFFSET0: FixedOffset = FixedOffset::east_opt(0).unwrap();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Go reference layouts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Go reference layout tokens and the equivalent chrono strftime specifier.
///
/// Ordered so that longer tokens are tried before their prefixes,
/// e.g. `"January"` before `"Jan"`, `"2006"` before `"06"`.
///
/// Fractional seconds of any width map to `%.f`, which accepts one to nine
/// digits when parsing.
const GO_LAYOUT_TOKENS: [(&str, &str); 26] = [
    ("January", "%B"),
    ("Monday", "%A"),
    (".000000000", "%.f"),
    (".999999999", "%.f"),
    (".000000", "%.f"),
    (".999999", "%.f"),
    (".000", "%.f"),
    (".999", "%.f"),
    ("Z07:00", "%:z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("2006", "%Y"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("15", "%H"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("-07", "%#z"),
];

/// Is this `layout` a Go reference layout? Any layout without a `%` is
/// treated as one.
pub fn layout_is_go(layout: &str) -> bool {
    !layout.contains('%')
}

/// Translate a Go reference layout, e.g. `"2006-01-02T15:04:05"`, to a chrono
/// strftime pattern, e.g. `"%Y-%m-%dT%H:%M:%S"`.
///
/// Characters that are not a Go layout token are copied as literals.
pub fn layout_go_to_strftime(layout: &str) -> String {
    dpfn!("({:?})", layout);
    let mut out: String = String::with_capacity(layout.len() * 2);
    let mut rest: &str = layout;
    'outer: while !rest.is_empty() {
        for (token, spec) in GO_LAYOUT_TOKENS.iter() {
            if rest.starts_with(token) {
                out.push_str(spec);
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    dpfx!("return {:?}", out);

    out
}

/// Return a strftime pattern for `layout`; Go reference layouts are
/// translated, strftime patterns are returned as-is.
pub fn layout_to_strftime(layout: &str) -> String {
    match layout_is_go(layout) {
        true => layout_go_to_strftime(layout),
        false => String::from(layout),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// named timezones
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Commonly seen timezone abbreviations and their `%:z` offset.
///
/// Ambiguous abbreviations (`IST`, `CST`, `BST`, ...) are listed more than
/// once and become empty entries in [`MAP_TZZ_TO_TZz`].
///
/// - Applicable tz abbreviations <https://en.wikipedia.org/wiki/List_of_time_zone_abbreviations>
const TZZ_ALL: [(&str, &str); 46] = [
    ("ACDT", "+10:30"),
    ("ACST", "+09:30"),
    ("AEDT", "+11:00"),
    ("AEST", "+10:00"),
    ("AKDT", "-08:00"),
    ("AKST", "-09:00"),
    ("AST", "-04:00"),
    ("AWST", "+08:00"),
    ("BST", "+01:00"),
    ("BST", "+06:00"),
    ("CAT", "+02:00"),
    ("CDT", "-05:00"),
    ("CEST", "+02:00"),
    ("CET", "+01:00"),
    ("CST", "-06:00"),
    ("CST", "+08:00"),
    ("EAT", "+03:00"),
    ("EDT", "-04:00"),
    ("EEST", "+03:00"),
    ("EET", "+02:00"),
    ("EST", "-05:00"),
    ("GMT", "+00:00"),
    ("HKT", "+08:00"),
    ("HST", "-10:00"),
    ("IDLW", "-12:00"),
    ("IST", "+05:30"),
    ("IST", "+01:00"),
    ("IST", "+02:00"),
    ("JST", "+09:00"),
    ("KST", "+09:00"),
    ("MDT", "-06:00"),
    ("MSK", "+03:00"),
    ("MST", "-07:00"),
    ("NZDT", "+13:00"),
    ("NZST", "+12:00"),
    ("PDT", "-07:00"),
    ("PKT", "+05:00"),
    ("PST", "-08:00"),
    ("SAST", "+02:00"),
    ("SGT", "+08:00"),
    ("UTC", "+00:00"),
    ("VLAT", "+10:00"),
    ("WAT", "+01:00"),
    ("WEST", "+01:00"),
    ("WET", "+00:00"),
    ("Z", "+00:00"),
];

type Map_TZZ_to_TZz<'a> = BTreeMap<String, &'a str>;

lazy_static! {
    /// Map of `%Z` values, e.g. `"PST"` or `"pst"`, to the `%:z` value,
    /// e.g. `"-08:00"`.
    /// A key with an `is_empty()` value signifies an ambiguous timezone.
    pub static ref MAP_TZZ_TO_TZz: Map_TZZ_to_TZz<'static> = {
        let mut map = Map_TZZ_to_TZz::new();
        #[allow(non_snake_case)]
        for (tzZ, tzz) in TZZ_ALL.iter() {
            for key in [tzZ.to_string(), tzZ.to_lowercase()] {
                match map.get(&key) {
                    // same abbreviation, different offsets
                    Some(prev) if *prev != *tzz => {
                        map.insert(key, "");
                    }
                    Some(_) => {}
                    None => {
                        map.insert(key, *tzz);
                    }
                }
            }
        }

        map
    };
}

/// Transform a user-passed timezone, e.g. `"-0800"`, `"+02:00"`, `"+03"`,
/// `"UTC"`, to a `FixedOffset`.
///
/// An ambiguous named timezone, e.g. `"IST"`, is an error.
pub fn tz_offset_from_str(tzo: &str) -> std::result::Result<FixedOffset, String> {
    dpfn!("({:?})", tzo);
    let tzo_: &str = match MAP_TZZ_TO_TZz.get(tzo) {
        Some(tz_offset) => {
            match tz_offset.is_empty() {
                true => {
                    dpfx!("ambiguous {:?}", tzo);
                    return Err(format!(
                        "ambiguous timezone {:?}; the abbreviation names more than one offset",
                        tzo
                    ));
                }
                false => *tz_offset,
            }
        }
        // numeric, e.g. `+01:00`
        None => tzo,
    };
    // let chrono parse the offset after an arbitrary datetime
    let mut data: String = String::from("2000-01-02 03:04:05 ");
    data.push_str(tzo_);
    for pattern in [
        "%Y-%m-%d %H:%M:%S %:z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S %#z",
    ] {
        if let Some(dt) = datetime_parse_from_str_w_tz(data.as_str(), pattern) {
            dpfx!("return {:?}", dt.offset());
            return Ok(*dt.offset());
        }
    }
    dpfx!("unable to parse {:?}", tzo);

    Err(format!("Unable to parse a timezone offset {:?}", tzo))
}
