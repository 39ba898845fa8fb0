// src/bin/ttail.rs

//! Driver program _ttail_ drives the [_ttaillib_].
//!
//! Parses the command-line arguments.
//! Then checks each path passed; paths that do not exist or are directories
//! are reported and skipped.
//!
//! For each file, a file processing thread is created. Each thread opens a
//! [`FileSession`] and runs [`find_position`], then sends the session to the
//! main thread. The main thread copies the bytes from the found offset of
//! each file to stdout, in the order the paths were passed.
//!
//! If passed CLI option `--summary`, the main thread prints a
//! [`SummarySearch`] about each file processed.
//!
//! `ttail.rs` should be the main thread and the only thread that prints to
//! STDOUT.
//!
//! [_ttaillib_]: ttaillib
//! [`FileSession`]: ttaillib::readers::filesession::FileSession
//! [`find_position`]: ttaillib::readers::filesession::FileSession::find_position
//! [`SummarySearch`]: ttaillib::readers::summary::SummarySearch

#![allow(non_camel_case_types)]

// first setup the custom global allocator
use ::ttaillib::common::AllocatorChosen;

cfg_if::cfg_if! {
    if #[cfg(feature = "jemalloc")] {
        use ::tikv_jemallocator::Jemalloc;
        #[global_allocator]
        static GLOBAL: Jemalloc = Jemalloc;
        const ALLOCATOR_CHOSEN: AllocatorChosen = AllocatorChosen::Jemalloc;
        const CLI_HELP_AFTER_ALLOCATOR: &str = "jemalloc";
    }
    else if #[cfg(feature = "mimalloc")] {
        use ::mimalloc::MiMalloc;
        #[global_allocator]
        static GLOBAL: MiMalloc = MiMalloc;
        const ALLOCATOR_CHOSEN: AllocatorChosen = AllocatorChosen::Mimalloc;
        const CLI_HELP_AFTER_ALLOCATOR: &str = "mimalloc";
    }
    else {
        const ALLOCATOR_CHOSEN: AllocatorChosen = AllocatorChosen::System;
        const CLI_HELP_AFTER_ALLOCATOR: &str = "system";
    }
}

use std::collections::BTreeMap;
use std::io::{BufWriter, ErrorKind, Read, StdoutLock, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use ::anyhow::Context;
use ::clap::Parser;
use ::const_format::concatcp;
use ::lazy_static::lazy_static;
use ::regex::Regex;
use ::si_trace_print::stack::stack_offset_set;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};
use ::ttaillib::common::{File, FPath, FileOffset, NLu8};
use ::ttaillib::config::formats::{FormatRegistry, DEFAULT_CONFIG_PATH, FORMAT_DEFAULT};
use ::ttaillib::config::searchconfig::{
    ReferenceTime,
    SearchConfig,
    SearchConfigBuilder,
    STEPS_LIMIT_DEF,
};
use ::ttaillib::data::datetime::{
    local_now_offset,
    local_now_year,
    tz_offset_from_str,
    Duration,
    FixedOffset,
};
use ::ttaillib::data::timestamp::TSKV_PATTERN;
use ::ttaillib::e_err;
use ::ttaillib::e_wrn;
use ::ttaillib::readers::filesession::FileSession;
use ::ttaillib::readers::windowreader::{WindowSz, WINDOWSZ_DEF, WINDOWSZ_MAX, WINDOWSZ_MIN};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// command-line parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `--type` value that samples each file for a known log format.
const LOG_TYPE_AUTO: &str = "auto";

const CGN_DUR_SECONDS: &str = "seconds";
const CGN_DUR_MINUTES: &str = "minutes";
const CGN_DUR_HOURS: &str = "hours";
const CGN_DUR_DAYS: &str = "days";
const CGN_DUR_WEEKS: &str = "weeks";

const CGP_DUR_SECONDS: &str = concatcp!("(?P<", CGN_DUR_SECONDS, r">[\d]+s)");
const CGP_DUR_MINUTES: &str = concatcp!("(?P<", CGN_DUR_MINUTES, r">[\d]+m)");
const CGP_DUR_HOURS: &str = concatcp!("(?P<", CGN_DUR_HOURS, r">[\d]+h)");
const CGP_DUR_DAYS: &str = concatcp!("(?P<", CGN_DUR_DAYS, r">[\d]+d)");
const CGP_DUR_WEEKS: &str = concatcp!("(?P<", CGN_DUR_WEEKS, r">[\d]+w)");

lazy_static! {
    /// user-passed strings of a duration, e.g. `"1h30m"`.
    static ref REGEX_DURATION: Regex = {
        defñ!("lazy_static! REGEX_DURATION::new()");

        Regex::new(
            concatcp!(
                "^(",
                CGP_DUR_SECONDS, "|",
                CGP_DUR_MINUTES, "|",
                CGP_DUR_HOURS, "|",
                CGP_DUR_DAYS, "|",
                CGP_DUR_WEEKS,
                ")+$"
            )
        ).unwrap()
    };
}

#[cfg(debug_assertions)]
const CLI_HELP_AFTER_NOTE_DEBUG: &str = "\nDEBUG BUILD";
#[cfg(not(debug_assertions))]
const CLI_HELP_AFTER_NOTE_DEBUG: &str = "";

/// `--help` _afterword_ message.
const CLI_HELP_AFTER: &str = concatcp!(
    "\
DURATION is one or more of a count followed by a unit,
\"s\" seconds, \"m\" minutes, \"h\" hours, \"d\" days, \"w\" weeks.
For example, \"90s\", \"5m\", \"1h30m\", \"2d\".

Lines are kept if their timestamp is at or after the reference time minus
DURATION. The reference time is now, or with --last-line the timestamp of the
last line of the file.
Lines without a timestamp are kept if they follow a kept line.
A file without any timestamp is printed entirely.

LOG TYPEs are read from the format file CONFIG, merged over the built-in log
types. A format file has one table per log type, e.g.

    [myapp]
    bufSize = 32768
    stepsLimit = 64
    timeReStr = '^\\[(\\d{4}-\\d{2}-\\d{2} \\d{2}:\\d{2}:\\d{2})\\]'
    timeLayout = \"2006-01-02 15:04:05\"

timeLayout may be a Go reference layout or a strftime pattern.

The default log type is \"",
    FORMAT_DEFAULT,
    "\", pattern:
    ",
    TSKV_PATTERN,
    "
",
    CLI_HELP_AFTER_NOTE_DEBUG,
);

// `clap` derive, see
// * <https://docs.rs/clap/4.2.1/clap/_derive/index.html>
//
// Note:
// * the `about` is taken from `Cargo.toml:[package]:description`.
#[derive(Parser, Debug)]
#[clap(
    about = env!("CARGO_PKG_DESCRIPTION"),
    name = "ttail",
    // write expanded information for the `--version` output
    version = concatcp!(
        "\n",
        "Version: ",
        env!("CARGO_PKG_VERSION_MAJOR"), ".",
        env!("CARGO_PKG_VERSION_MINOR"), ".",
        env!("CARGO_PKG_VERSION_PATCH"), "\n",
        "MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "\n",
        "Allocator: ", CLI_HELP_AFTER_ALLOCATOR, "\n",
        "License: ", env!("CARGO_PKG_LICENSE"), "\n",
    ),
    after_help = CLI_HELP_AFTER,
    verbatim_doc_comment,
)]
struct CLI_Args {
    /// Path(s) of log files.
    #[clap(required = true, verbatim_doc_comment)]
    paths: Vec<String>,

    /// Print log lines within this DURATION before the reference time.
    /// For example, "10s", "5m", "1h30m".
    #[clap(
        short = 'n',
        long,
        verbatim_doc_comment,
        value_parser = cli_process_duration,
        default_value = "10s",
    )]
    duration: Duration,

    /// The reference time is the timestamp of the last line of the file
    /// that has a timestamp, instead of now.
    #[clap(short = 'l', long, verbatim_doc_comment)]
    last_line: bool,

    /// Log type, a name from the format file or a built-in log type.
    /// "auto" samples the start of each file for a built-in log type.
    #[clap(
        short = 't',
        long = "type",
        verbatim_doc_comment,
        default_value = FORMAT_DEFAULT,
    )]
    log_type: String,

    /// Format file of log types.
    #[clap(
        short = 'c',
        long,
        verbatim_doc_comment,
        default_value = DEFAULT_CONFIG_PATH,
    )]
    config: String,

    /// Default timezone offset for timestamps without a timezone.
    /// Example values, "+12", "-0800", "+02:00", or "EDT".
    /// To pass a value with leading "-" use "=" notation, e.g. "-z=-0800".
    /// If not passed then the local system timezone offset is used.
    #[clap(
        short = 'z',
        long,
        verbatim_doc_comment,
        value_parser = cli_process_tz_offset,
    )]
    tz_offset: Option<FixedOffset>,

    /// Regular expression of the timestamp. The first capture group is the
    /// timestamp. Overrides the log type.
    #[clap(long, verbatim_doc_comment)]
    pattern: Option<String>,

    /// Layout of the timestamp, a strftime pattern or a Go reference layout.
    /// Overrides the log type.
    #[clap(long, verbatim_doc_comment)]
    layout: Option<String>,

    /// Read windows of this size in bytes.
    /// May be decimal, hexadecimal "0x", octal "0o", or binary "0b".
    /// Overrides the log type.
    #[clap(
        long,
        verbatim_doc_comment,
        value_parser = cli_parse_windowsz,
    )]
    windowsz: Option<String>,

    /// Count of windows to read back from the end of the file when looking
    /// for the last timestamp. Overrides the log type.
    #[clap(long, verbatim_doc_comment)]
    steps_limit: Option<usize>,

    /// Print a summary of each search to stderr.
    #[clap(short = 's', long, verbatim_doc_comment)]
    summary: bool,
}

/// `clap` argument processor for `--windowsz`.
/// Accepts decimal and the prefixed radixes `0x`, `0o`, `0b`,
/// e.g. `"16384"` or `"0x4000"`.
fn cli_process_windowsz(windowszs: &String) -> std::result::Result<WindowSz, String> {
    let errs = format!("Unable to parse a number for --windowsz {:?}", windowszs);

    let (digits, radix): (&str, u32) = if let Some(digits) = windowszs.strip_prefix("0x") {
        (digits, 16)
    } else if let Some(digits) = windowszs.strip_prefix("0o") {
        (digits, 8)
    } else if let Some(digits) = windowszs.strip_prefix("0b") {
        (digits, 2)
    } else {
        (windowszs.as_str(), 10)
    };
    let windowsz: WindowSz = match WindowSz::from_str_radix(digits, radix) {
        Ok(val) => val,
        Err(err) => return Err(format!("{} {}", errs, err)),
    };

    if !(WINDOWSZ_MIN <= windowsz && windowsz <= WINDOWSZ_MAX) {
        return Err(format!(
            "--windowsz must be {} ≤ WINDOWSZ ≤ {}, it was {:?}",
            WINDOWSZ_MIN, WINDOWSZ_MAX, windowszs
        ));
    }

    Ok(windowsz)
}

/// `clap` argument parser for `--windowsz`.
fn cli_parse_windowsz(windowszs: &str) -> std::result::Result<String, String> {
    match cli_process_windowsz(&String::from(windowszs)) {
        Ok(val) => Ok(val.to_string()),
        Err(err) => Err(err),
    }
}

/// `clap` argument processor for `--tz-offset`.
fn cli_process_tz_offset(tzo: &str) -> std::result::Result<FixedOffset, String> {
    match tz_offset_from_str(tzo) {
        Ok(val) => Ok(val),
        Err(err) => Err(format!("{} for --tz-offset", err)),
    }
}

/// `clap` argument processor for `--duration`.
fn cli_process_duration(val: &str) -> std::result::Result<Duration, String> {
    match string_wdhms_to_duration(val) {
        Some(duration) => Ok(duration),
        None => Err(format!("Unable to parse a duration for --duration {:?}", val)),
    }
}

/// Transform a user-passed duration string like `"1h30m"` to a `Duration`.
fn string_wdhms_to_duration(val: &str) -> Option<Duration> {
    defn!("({:?})", val);

    if val.is_empty() {
        // take the early exit to avoid building regex `REGEX_DURATION` (expensive operation)
        defx!("is_empty; return None");
        return None;
    }

    let captures: regex::Captures = match REGEX_DURATION.captures(val) {
        Some(caps) => caps,
        None => {
            defx!("REGEX_DURATION.captures(…) None");
            return None;
        }
    };

    let mut duration = Duration::zero();
    let units: [(&str, char, fn(i64) -> Option<Duration>); 5] = [
        (CGN_DUR_SECONDS, 's', Duration::try_seconds),
        (CGN_DUR_MINUTES, 'm', Duration::try_minutes),
        (CGN_DUR_HOURS, 'h', Duration::try_hours),
        (CGN_DUR_DAYS, 'd', Duration::try_days),
        (CGN_DUR_WEEKS, 'w', Duration::try_weeks),
    ];
    for (cgn, unit, to_duration) in units.iter() {
        let match_ = match captures.name(cgn) {
            Some(match_) => match_,
            None => continue,
        };
        defo!("matched named group {:?}, match {:?}", cgn, match_.as_str());
        let count: i64 = match match_
            .as_str()
            .trim_end_matches(*unit)
            .parse::<i64>()
        {
            Ok(val) => val,
            Err(_err) => {
                defx!("Unable to parse {:?} {}", match_.as_str(), _err);
                return None;
            }
        };
        duration = match to_duration(count).and_then(|d| duration.checked_add(&d)) {
            Some(val) => val,
            None => {
                defx!("overflow at {:?}", match_.as_str());
                return None;
            }
        };
    }
    defx!("return {:?}", duration);

    Some(duration)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// per-file search configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bytes read from the start of a file for `--type=auto`.
const DETECT_SAMPLE_SZ: usize = 1 << 16;

/// Lines of the sample for `--type=auto`.
const DETECT_SAMPLE_LINES: usize = 32;

/// Name of the built-in log type of the lines at the start of the file at
/// `path`.
fn detect_log_type(
    path: &FPath,
    tz_offset: FixedOffset,
) -> anyhow::Result<Option<&'static str>> {
    defn!("({:?})", path);
    let file = File::open(path).with_context(|| format!("open {:?}", path))?;
    let mut sample: Vec<u8> = Vec::with_capacity(DETECT_SAMPLE_SZ);
    file.take(DETECT_SAMPLE_SZ as u64)
        .read_to_end(&mut sample)
        .with_context(|| format!("read {:?}", path))?;
    let lines: Vec<&[u8]> = sample
        .split(|b| *b == NLu8)
        .filter(|line| !line.is_empty())
        .take(DETECT_SAMPLE_LINES)
        .collect();
    let name = FormatRegistry::detect(&lines, tz_offset, local_now_year());
    defx!("return {:?}", name);

    Ok(name)
}

/// Settings shared by all files.
struct CliSearchOpts {
    reference: ReferenceTime,
    duration: Duration,
    tz_offset: FixedOffset,
    pattern: Option<String>,
    layout: Option<String>,
    windowsz: Option<WindowSz>,
    steps_limit: Option<usize>,
}

/// Build the `SearchConfig` of log type `log_type` with the CLI overrides.
fn search_config(
    registry: &FormatRegistry,
    log_type: &str,
    opts: &CliSearchOpts,
) -> anyhow::Result<SearchConfig> {
    let format = registry.get(log_type)?;
    let mut builder = SearchConfigBuilder::new()
        .format(format)
        .reference(opts.reference)
        .duration(opts.duration)
        .tz_offset(opts.tz_offset);
    if let Some(pattern) = opts.pattern.as_ref() {
        builder = builder.pattern(pattern);
    }
    if let Some(layout) = opts.layout.as_ref() {
        builder = builder.layout(layout);
    }
    if let Some(windowsz) = opts.windowsz {
        builder = builder.windowsz(windowsz);
    }
    if let Some(steps_limit) = opts.steps_limit {
        builder = builder.steps_limit(steps_limit);
    }
    let config = builder
        .build()
        .with_context(|| format!("log type {:?}", log_type))?;

    Ok(config)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// file processing threads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Index of a path among the passed paths; the order of printing.
type PathId = usize;

/// The path, its print order, and the `SearchConfig` given to one file
/// processing thread.
type ThreadInitData = (FPath, PathId, Arc<SearchConfig>);

/// Data sent from a file processing thread to the main printing thread;
/// the searched `FileSession` or the error.
type ChanDatum = (PathId, anyhow::Result<FileSession<File>>);

/// One per file processing thread.
type ChanSendDatum = ::crossbeam_channel::Sender<ChanDatum>;

/// Drained by the main thread, which prints in `PathId` order.
type ChanRecvDatum = ::crossbeam_channel::Receiver<ChanDatum>;

/// Open and search one file.
fn exec_filesession(
    path: &FPath,
    config: Arc<SearchConfig>,
) -> anyhow::Result<FileSession<File>> {
    defn!("({:?})", path);
    let mut session = FileSession::open(path, config)?;
    let _offset: FileOffset = session
        .find_position()
        .with_context(|| format!("search {:?}", path))?;
    defx!("offset {}", _offset);

    Ok(session)
}

/// A file processing thread.
fn exec_fileprocessor_thread(
    chan_send_dt: ChanSendDatum,
    thread_init_data: ThreadInitData,
) {
    if cfg!(debug_assertions) {
        stack_offset_set(Some(2));
    }
    let (path, pathid, config) = thread_init_data;
    defn!("({:?}, {})", path, pathid);

    let result = exec_filesession(&path, config);
    if let Err(_err) = chan_send_dt.send((pathid, result)) {
        // the main thread has exited early
        defo!("chan_send_dt.send failed {}", _err);
    }
    defx!();
}

/// Finished sessions waiting to be printed.
const CHANNEL_CAPACITY: usize = 5;

/// Copy the found bytes of a searched `session` to `stdout`, print its
/// summary if `summary`.
///
/// Returns `false` if the copy failed.
fn print_session<W: Write>(
    path: &FPath,
    session: &mut FileSession<File>,
    stdout: &mut W,
    summary: bool,
) -> bool {
    let ok: bool = match session.copy_to(stdout) {
        Ok(_copied) => {
            defo!("copied {} bytes of {:?}", _copied, path);
            true
        }
        Err(err) if err.kind() == ErrorKind::BrokenPipe => {
            defo!("broken pipe {:?}", path);
            false
        }
        Err(err) => {
            e_err!("{} for file {:?}", err, path);
            false
        }
    };
    if summary {
        if let Err(err) = stdout.flush() {
            defo!("flush failed {}", err);
        }
        eprintln!("File: {}\n{}", path, session.summary());
    }

    ok
}

/// Remove the results that may be printed now, in `PathId` order.
///
/// Results are printed in order so a result waits for every result before
/// it. When all threads are `finished` nothing more arrives; all remaining
/// results are taken and the missing `PathId`s are passed over.
fn take_ready<T>(
    received: &mut BTreeMap<PathId, T>,
    pathid_next: &mut PathId,
    finished: bool,
) -> Vec<(PathId, T)> {
    let mut ready: Vec<(PathId, T)> = Vec::new();
    while let Some(result) = received.remove(pathid_next) {
        ready.push((*pathid_next, result));
        *pathid_next += 1;
    }
    if finished {
        while let Some((pathid, result)) = received.pop_first() {
            defo!("PathId {} never arrived", *pathid_next);
            *pathid_next = pathid + 1;
            ready.push((pathid, result));
        }
    }

    ready
}

/// The main processing and printing loop.
///
/// 1. creates a thread to search each file
///
/// 2. receives each searched `FileSession` and prints them in `PathId`
///    order
///
/// Returns `false` if any file failed.
fn processing_loop(
    paths: Vec<(FPath, Arc<SearchConfig>)>,
    summary: bool,
) -> bool {
    defn!("({} paths)", paths.len());
    let mut ret: bool = true;
    let paths_names: Vec<FPath> = paths
        .iter()
        .map(|(path, _)| path.clone())
        .collect();

    let (chan_send_dt, chan_recv_dt): (ChanSendDatum, ChanRecvDatum) =
        ::crossbeam_channel::bounded(CHANNEL_CAPACITY);
    let mut handles: Vec<thread::JoinHandle<()>> = Vec::with_capacity(paths.len());
    for (pathid, (path, config)) in paths.into_iter().enumerate() {
        let thread_name: String = format!("{}_{}", env!("CARGO_PKG_NAME"), pathid);
        let chan_send_dt_ = chan_send_dt.clone();
        let thread_init_data: ThreadInitData = (path, pathid, config);
        match thread::Builder::new()
            .name(thread_name)
            .spawn(move || exec_fileprocessor_thread(chan_send_dt_, thread_init_data))
        {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                e_err!("thread spawn failed {}", err);
                return false;
            }
        }
    }
    // only the threads hold senders; the receive loop ends when all are done
    drop(chan_send_dt);

    let stdout = std::io::stdout();
    let mut stdout = BufWriter::new(stdout.lock());
    let mut received: BTreeMap<PathId, anyhow::Result<FileSession<File>>> = BTreeMap::new();
    let mut pathid_next: PathId = 0;
    let mut broken: bool = false;
    let mut print_ready = |ready: Vec<(PathId, anyhow::Result<FileSession<File>>)>,
                           stdout: &mut BufWriter<StdoutLock<'static>>|
     -> bool {
        let mut ok: bool = true;
        for (pathid, result) in ready.into_iter() {
            if broken {
                continue;
            }
            let path: &FPath = &paths_names[pathid];
            match result {
                Ok(mut session) => {
                    if !print_session(path, &mut session, stdout, summary) {
                        ok = false;
                        broken = true;
                    }
                }
                Err(err) => {
                    e_err!("{:#}", err);
                    ok = false;
                }
            }
        }
        ok
    };
    for (pathid, result) in chan_recv_dt.iter() {
        defo!("received PathId {}", pathid);
        received.insert(pathid, result);
        let ready = take_ready(&mut received, &mut pathid_next, false);
        if !print_ready(ready, &mut stdout) {
            ret = false;
        }
    }
    // a thread that panicked sent nothing; the files after it still print
    let ready = take_ready(&mut received, &mut pathid_next, true);
    if !print_ready(ready, &mut stdout) {
        ret = false;
    }
    if let Err(err) = stdout.flush() {
        if err.kind() != ErrorKind::BrokenPipe {
            e_err!("{}", err);
        }
        ret = false;
    }

    for handle in handles.into_iter() {
        if handle.join().is_err() {
            e_err!("a file processing thread panicked");
            ret = false;
        }
    }
    defx!("return {}", ret);

    ret
}

pub fn main() -> ExitCode {
    if cfg!(debug_assertions) {
        stack_offset_set(Some(0));
    }
    defn!();
    defo!("allocator {}", ALLOCATOR_CHOSEN);

    let args = CLI_Args::parse();
    defo!("{:?}", args);

    let windowsz: Option<WindowSz> = match args.windowsz.as_ref() {
        Some(windowszs) => match cli_process_windowsz(windowszs) {
            Ok(val) => Some(val),
            Err(err) => {
                e_err!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };
    defo!("windowsz {:?} (default {}, steps limit default {})", windowsz, WINDOWSZ_DEF, STEPS_LIMIT_DEF);

    let registry: FormatRegistry = match FormatRegistry::load(&args.config) {
        Ok(val) => val,
        Err(err) => {
            e_err!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let opts = CliSearchOpts {
        reference: match args.last_line {
            true => ReferenceTime::LastLine,
            false => ReferenceTime::Now,
        },
        duration: args.duration,
        tz_offset: args.tz_offset.unwrap_or_else(local_now_offset),
        pattern: args.pattern,
        layout: args.layout,
        windowsz,
        steps_limit: args.steps_limit,
    };

    let mut ret: bool = true;
    let mut configs: BTreeMap<String, Arc<SearchConfig>> = BTreeMap::new();
    let mut paths: Vec<(FPath, Arc<SearchConfig>)> = Vec::with_capacity(args.paths.len());
    for path in args.paths.into_iter() {
        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_dir() => {
                e_err!("Path is a directory {:?}", path);
                ret = false;
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                e_err!("{} for path {:?}", err, path);
                ret = false;
                continue;
            }
        }
        let log_type: String = match args.log_type.as_str() {
            LOG_TYPE_AUTO => match detect_log_type(&path, opts.tz_offset) {
                Ok(Some(name)) => String::from(name),
                Ok(None) => {
                    e_wrn!("no known log type for {:?}, using {:?}", path, FORMAT_DEFAULT);
                    String::from(FORMAT_DEFAULT)
                }
                Err(err) => {
                    e_err!("{:#}", err);
                    ret = false;
                    continue;
                }
            },
            name => String::from(name),
        };
        defo!("path {:?} log type {:?}", path, log_type);
        // a configuration error is fatal, before any search
        let config: Arc<SearchConfig> = match configs.get(&log_type) {
            Some(config) => config.clone(),
            None => match search_config(&registry, &log_type, &opts) {
                Ok(config) => {
                    let config = Arc::new(config);
                    configs.insert(log_type, config.clone());
                    config
                }
                Err(err) => {
                    e_err!("{:#}", err);
                    return ExitCode::FAILURE;
                }
            },
        };
        paths.push((path, config));
    }

    if !processing_loop(paths, args.summary) {
        ret = false;
    }

    let exitcode = if ret { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    defx!("exitcode {:?}", exitcode);

    exitcode
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    use ::tempfile::NamedTempFile;
    use ::test_case::test_case;

    fn create_temp_file(data: &str) -> NamedTempFile {
        let mut ntf = ::tempfile::Builder::new()
            .prefix("tmp-ttail-bin-test-")
            .tempfile()
            .unwrap();
        ntf.write_all(data.as_bytes()).unwrap();
        ntf.flush().unwrap();

        ntf
    }

    fn ntf_fpath(ntf: &NamedTempFile) -> FPath {
        FPath::from(ntf.path().to_str().unwrap())
    }

    const FIXEDOFFSET0: FixedOffset = match FixedOffset::east_opt(0) {
        Some(fo) => fo,
        None => panic!("bad offset"),
    };

    #[test_case("500", true)]
    #[test_case("0x20", true)]
    #[test_case("0x4000", true)]
    #[test_case("0x2", false; "0x2 too small")]
    #[test_case("0xFFFFFFFF", false; "0xFFFFFFFF too large")]
    #[test_case("BAD_WINDOWSZ_VALUE", false)]
    #[test_case("", false)]
    fn test_cli_parse_windowsz(
        windowsz_str: &str,
        is_ok: bool,
    ) {
        match is_ok {
            true => assert!(cli_parse_windowsz(windowsz_str).is_ok()),
            false => assert!(cli_parse_windowsz(windowsz_str).is_err()),
        }
    }

    #[test_case("0b10101010101", Some(0b10101010101))]
    #[test_case("0o44", Some(0o44))]
    #[test_case("00500", Some(500))]
    #[test_case("500", Some(500))]
    #[test_case("0x40", Some(0x40))]
    #[test_case("0xFFFFFF", Some(0xFFFFFF))]
    #[test_case("0x", None)]
    #[test_case("BAD_WINDOWSZ_VALUE", None)]
    #[test_case("", None)]
    fn test_cli_process_windowsz(
        windowsz_str: &str,
        expect_: Option<WindowSz>,
    ) {
        let ret = cli_process_windowsz(&String::from(windowsz_str));
        match expect_ {
            Some(val_exp) => {
                assert_eq!(ret.unwrap(), val_exp);
            }
            None => {
                assert!(
                    ret.is_err(),
                    "Expected an Error for cli_process_windowsz({:?}), instead got {:?}",
                    windowsz_str,
                    ret
                );
            }
        }
    }

    #[test_case("+00", FIXEDOFFSET0; "+00 east(0)")]
    #[test_case("+0000", FIXEDOFFSET0; "+0000 east(0)")]
    #[test_case("+00:00", FIXEDOFFSET0; "+00:00 east(0)")]
    #[test_case("+01:00", FixedOffset::east_opt(3600).unwrap(); "+01:00 east(3600)")]
    #[test_case("-01:00", FixedOffset::east_opt(-3600).unwrap(); "-01:00 east(-3600)")]
    #[test_case("+02:30", FixedOffset::east_opt(9000).unwrap(); "+02:30 east(9000)")]
    #[test_case("-0800", FixedOffset::east_opt(-28800).unwrap(); "-0800 east(-28800)")]
    #[test_case("gmt", FIXEDOFFSET0; "gmt (0)")]
    #[test_case("UTC", FIXEDOFFSET0; "UTC east(0)")]
    #[test_case("Z", FIXEDOFFSET0; "Z (0)")]
    #[test_case("vlat", FixedOffset::east_opt(36000).unwrap(); "vlat east(36000)")]
    #[test_case("IDLW", FixedOffset::east_opt(-43200).unwrap(); "IDLW east(-43200)")]
    fn test_cli_process_tz_offset(
        in_: &str,
        out_fo: FixedOffset,
    ) {
        match cli_process_tz_offset(in_) {
            Ok(fo) => {
                assert_eq!(out_fo, fo, "cli_process_tz_offset returned FixedOffset {:?}, expected {:?}", fo, out_fo);
            }
            Err(err) => {
                panic!("Error {}", err);
            }
        }
    }

    #[test_case("IST"; "ambiguous IST")]
    #[test_case("+99:99"; "out of range")]
    #[test_case("NOPE"; "unknown name")]
    fn test_cli_process_tz_offset_err(in_: &str) {
        assert!(cli_process_tz_offset(in_).is_err());
    }

    #[test_case("10s", Some(Duration::seconds(10)))]
    #[test_case("5m", Some(Duration::minutes(5)))]
    #[test_case("1h30m", Some(Duration::minutes(90)))]
    #[test_case("1h30m15s", Some(Duration::seconds(5415)))]
    #[test_case("2d", Some(Duration::days(2)))]
    #[test_case("1w", Some(Duration::weeks(1)))]
    #[test_case("0s", Some(Duration::zero()))]
    #[test_case("", None; "empty")]
    #[test_case("10", None; "no unit")]
    #[test_case("-5m", None; "negative")]
    #[test_case("5x", None; "bad unit")]
    #[test_case("5m ", None; "trailing space")]
    fn test_string_wdhms_to_duration(
        input: &str,
        expect: Option<Duration>,
    ) {
        assert_eq!(string_wdhms_to_duration(input), expect);
    }

    #[test]
    fn test_cli_process_duration_err() {
        let err = cli_process_duration("soon").unwrap_err();
        assert!(err.contains("soon"), "{}", err);
    }

    fn cli_search_opts() -> CliSearchOpts {
        CliSearchOpts {
            reference: ReferenceTime::Now,
            duration: Duration::minutes(5),
            tz_offset: FIXEDOFFSET0,
            pattern: None,
            layout: None,
            windowsz: None,
            steps_limit: None,
        }
    }

    #[test]
    fn test_search_config_default() {
        let registry = FormatRegistry::builtin();
        let config = search_config(&registry, FORMAT_DEFAULT, &cli_search_opts()).unwrap();
        assert_eq!(config.pattern.as_str(), TSKV_PATTERN);
        assert_eq!(config.windowsz, WINDOWSZ_DEF);
        assert_eq!(config.steps_limit, STEPS_LIMIT_DEF);
        assert_eq!(config.duration, Duration::minutes(5));
        assert_eq!(config.tz_offset, FIXEDOFFSET0);
    }

    #[test]
    fn test_search_config_overrides() {
        let registry = FormatRegistry::builtin();
        let mut opts = cli_search_opts();
        opts.layout = Some(String::from("%Y/%m/%d %H:%M:%S"));
        opts.windowsz = Some(0x100);
        opts.steps_limit = Some(3);
        let config = search_config(&registry, "go", &opts).unwrap();
        assert_eq!(config.layout, "%Y/%m/%d %H:%M:%S");
        assert_eq!(config.windowsz, 0x100);
        assert_eq!(config.steps_limit, 3);
    }

    #[test]
    fn test_search_config_unknown_type() {
        let registry = FormatRegistry::builtin();
        let err = search_config(&registry, "no_such_type", &cli_search_opts()).unwrap_err();
        assert!(format!("{}", err).contains("no_such_type"), "{}", err);
    }

    #[test]
    fn test_search_config_bad_pattern() {
        let registry = FormatRegistry::builtin();
        let mut opts = cli_search_opts();
        opts.pattern = Some(String::from("(unclosed"));
        assert!(search_config(&registry, FORMAT_DEFAULT, &opts).is_err());
    }

    #[test]
    fn test_detect_log_type_apache() {
        let ntf = create_temp_file(
            "127.0.0.1 - - [25/Dec/2023:10:00:00 +0000] \"GET / HTTP/1.1\" 200 2\n\
             127.0.0.1 - - [25/Dec/2023:10:00:01 +0000] \"GET / HTTP/1.1\" 200 2\n",
        );
        let path = ntf_fpath(&ntf);
        assert_eq!(detect_log_type(&path, FIXEDOFFSET0).unwrap(), Some("apache"));
    }

    #[test]
    fn test_detect_log_type_none() {
        let ntf = create_temp_file("hello\nworld\n");
        let path = ntf_fpath(&ntf);
        assert_eq!(detect_log_type(&path, FIXEDOFFSET0).unwrap(), None);
    }

    #[test]
    fn test_exec_filesession() {
        let ntf = create_temp_file(
            "\ttimestamp=2023-12-25T10:00:00\ta\n\
             \ttimestamp=2023-12-25T10:00:05\tb\n",
        );
        let path = ntf_fpath(&ntf);
        let config = SearchConfigBuilder::new()
            .reference(ReferenceTime::LastLine)
            .duration(Duration::seconds(2))
            .tz_offset(FIXEDOFFSET0)
            .build()
            .unwrap();
        let mut session = exec_filesession(&path, Arc::new(config)).unwrap();
        assert_eq!(session.offset(), 33);
        let mut out: Vec<u8> = Vec::new();
        session.copy_to(&mut out).unwrap();
        assert_eq!(out, b"\ttimestamp=2023-12-25T10:00:05\tb\n");
    }

    #[test]
    fn test_exec_filesession_not_found() {
        let config = SearchConfigBuilder::new().build().unwrap();
        let path: FPath = FPath::from("/this/path/does/not/exist/ttail.log");
        assert!(exec_filesession(&path, Arc::new(config)).is_err());
    }

    #[test]
    fn test_take_ready_waits_for_earlier() {
        let mut received: BTreeMap<PathId, char> = BTreeMap::new();
        let mut pathid_next: PathId = 0;
        received.insert(1, 'b');
        received.insert(2, 'c');
        assert!(take_ready(&mut received, &mut pathid_next, false).is_empty());
        assert_eq!(pathid_next, 0);
        received.insert(0, 'a');
        let ready = take_ready(&mut received, &mut pathid_next, false);
        assert_eq!(ready, vec![(0, 'a'), (1, 'b'), (2, 'c')]);
        assert_eq!(pathid_next, 3);
        assert!(received.is_empty());
    }

    /// A thread that panicked never sends its result. The results after it
    /// are taken once all threads are finished.
    #[test_case(&[1, 2], vec![(1, 'b'), (2, 'c')], 3; "first missing")]
    #[test_case(&[0, 2, 4], vec![(0, 'a'), (2, 'c'), (4, 'e')], 5; "gaps")]
    #[test_case(&[], vec![], 0; "none")]
    fn test_take_ready_finished_skips_missing(
        pathids: &[PathId],
        expect: Vec<(PathId, char)>,
        expect_next: PathId,
    ) {
        stack_offset_set(Some(2));
        let mut received: BTreeMap<PathId, char> = BTreeMap::new();
        let mut pathid_next: PathId = 0;
        for pathid in pathids.iter() {
            received.insert(*pathid, (b'a' + *pathid as u8) as char);
        }
        let mut ready = take_ready(&mut received, &mut pathid_next, false);
        ready.extend(take_ready(&mut received, &mut pathid_next, true));
        assert_eq!(ready, expect);
        assert_eq!(pathid_next, expect_next);
        assert!(received.is_empty());
    }

    #[test]
    fn test_processing_loop_file_not_found() {
        let data = "\ttimestamp=2023-12-25T10:00:00\ta\n";
        let ntf = create_temp_file(data);
        let path = ntf_fpath(&ntf);
        let config = Arc::new(SearchConfigBuilder::new().build().unwrap());
        let paths: Vec<(FPath, Arc<SearchConfig>)> = vec![
            (FPath::from("/this/path/does/not/exist/ttail.log"), config.clone()),
            (path, config),
        ];
        assert!(!processing_loop(paths, false));
    }
}
