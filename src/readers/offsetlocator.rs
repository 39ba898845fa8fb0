// src/readers/offsetlocator.rs

//! Implements an [`OffsetLocator`], the binary search for the byte offset
//! where the trailing time span of a file begins.
//!
//! [`OffsetLocator`]: crate::readers::offsetlocator::OffsetLocator

use crate::common::{FileOffset, FileSz, ResultS3};
use crate::config::searchconfig::{ReferenceTime, SearchConfig};
use crate::data::datetime::{now_fixedoffset, DateTimeL, DateTimeLOpt};
use crate::data::timestamp::TimestampExtractor;
use crate::readers::bytesource::ByteSource;
use crate::readers::summary::SummarySearch;
use crate::readers::windowreader::{ResultS3ReadLine, WindowReader};

use std::io::{Error, Result};
use std::sync::Arc;

#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Forget the line of a `ResultS3ReadLine`, releasing the borrow of the
/// `WindowReader`.
fn drop_line(result: ResultS3ReadLine<'_>) -> ResultS3<(), Error> {
    match result {
        ResultS3::Found(_) => ResultS3::Found(()),
        ResultS3::Done => ResultS3::Done,
        ResultS3::Err(err) => ResultS3::Err(err),
    }
}

/// An `OffsetLocator` finds the offset of the first line of a file whose
/// timestamp is at or after the reference time minus the duration of the
/// [`SearchConfig`].
///
/// The search:
///
/// 1. an empty file is offset 0.
/// 2. resolve the reference time; for [`ReferenceTime::LastLine`] the windows
///    at the end of the file are searched backward for the last line with a
///    timestamp. No such line within `steps_limit` windows is offset 0.
/// 3. binary search, the _coarse phase_. A probe at offset `mid` scans the
///    lines that begin in the window at `mid` for the first line with a
///    timestamp. A timestamp older than the threshold raises the low bound
///    to `mid`, otherwise, or when no timestamp is found, the high bound
///    drops to `mid`. Stops when the bounds are within one window.
/// 4. linear scan forward from the low bound, the _refinement phase_, stops
///    at the first line with a timestamp at or after the threshold. A line
///    longer than the growth limit plus one window ends the scan at the
///    start of that line.
///
/// Each probe reads at most one window and its growth, so a file without
/// newlines is never read through.
///
/// Lines without a timestamp never decide anything, they are skipped.
/// A line exactly `duration` old is kept.
///
/// Timestamps are assumed to be sorted. For unsorted timestamps the search
/// still ends with some offset within the file.
///
/// [`SearchConfig`]: crate::config::searchconfig::SearchConfig
pub struct OffsetLocator {
    config: Arc<SearchConfig>,
    reader: WindowReader,
    extractor: TimestampExtractor,
    summary: SummarySearch,
}

impl std::fmt::Debug for OffsetLocator {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        f.debug_struct("OffsetLocator")
            .field("config", &self.config)
            .field("reader", &self.reader)
            .field("extractor", &self.extractor)
            .finish()
    }
}

impl OffsetLocator {
    pub fn new(config: Arc<SearchConfig>) -> OffsetLocator {
        let reader = WindowReader::new(config.windowsz);
        let extractor = config.new_extractor();
        let summary = SummarySearch {
            reference: config.reference,
            tskv_fast: extractor.is_tskv_fast(),
            ..Default::default()
        };

        OffsetLocator {
            config,
            reader,
            extractor,
            summary,
        }
    }

    /// Find the offset of the first line within the trailing duration.
    ///
    /// The size of `source` is read once at the start.
    /// Only I/O errors are returned; a file without timestamps is offset 0.
    pub fn find_position<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<FileOffset> {
        defn!();
        let filesz: FileSz = source.size()?;
        self.summary.filesz = filesz;
        let offset = self.find_position_(source, filesz);
        self.summary.windowreader = self.reader.summary();
        self.summary.extracts = self.extractor.extract_count;
        self.summary.extracts_found = self.extractor.extract_found;
        if let Ok(offset_) = offset {
            debug_assert_le!(offset_, filesz, "offset {} beyond file size {}", offset_, filesz);
            self.summary.offset = offset_;
        }
        defx!("return {:?}", offset);

        offset
    }

    fn find_position_<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        filesz: FileSz,
    ) -> Result<FileOffset> {
        if filesz == 0 {
            defo!("empty file");
            return Ok(0);
        }
        let reference: DateTimeL = match self.config.reference {
            ReferenceTime::Now => now_fixedoffset(&self.config.tz_offset),
            ReferenceTime::Fixed(dt) => dt,
            ReferenceTime::LastLine => match self.find_last_line_datetime(source, filesz)? {
                Some(dt) => dt,
                None => {
                    defo!("no timestamp at the end of the file");
                    return Ok(0);
                }
            },
        };
        self.summary.reference_dt = Some(reference);
        let threshold: DateTimeL = match reference.checked_sub_signed(self.config.duration) {
            Some(dt) => dt,
            None => {
                defo!("reference {:?} minus duration {:?} overflows", reference, self.config.duration);
                return Ok(0);
            }
        };
        self.summary.threshold_dt = Some(threshold);
        defo!("reference {:?}, threshold {:?}", reference, threshold);

        let windowsz = self.config.windowsz as FileOffset;
        let mut low: FileOffset = 0;
        let mut high: FileOffset = filesz;
        while high - low > windowsz {
            let mid: FileOffset = low + (high - low) / 2;
            match self.probe(source, mid, high) {
                ResultS3::Found(dt) => {
                    if dt < threshold {
                        defo!("probe {} found {:?} too old; low = {}", mid, dt, mid);
                        low = mid;
                    } else {
                        defo!("probe {} found {:?}; high = {}", mid, dt, mid);
                        high = mid;
                    }
                }
                ResultS3::Done => {
                    defo!("probe {} found nothing; high = {}", mid, mid);
                    high = mid;
                }
                ResultS3::Err(err) => return Err(err),
            }
            debug_assert_le!(low, high);
        }

        self.refine(source, low, &threshold)
    }

    /// Search backward from the end of the file for the last line with a
    /// timestamp. At most `steps_limit` windows are read.
    ///
    /// Every complete line of a window is checked, last line first.
    /// Consecutive windows overlap so a line that crosses the start of one
    /// window is complete in the next.
    pub fn find_last_line_datetime<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        filesz: FileSz,
    ) -> Result<DateTimeLOpt> {
        defn!("(filesz {})", filesz);
        let windowsz = self.config.windowsz as FileOffset;
        let mut end: FileOffset = filesz;
        let mut steps: usize = self.config.steps_limit;
        while steps > 0 && end > 0 {
            steps -= 1;
            self.summary.steps += 1;
            let offset: FileOffset = end.saturating_sub(windowsz);
            defo!("step {}, window [{}, {})", self.summary.steps, offset, end);
            let mut walk: bool = false;
            match self.reader.find_last_line_at(source, offset) {
                ResultS3::Found(line) => {
                    if let Some(dt) = self.extractor.extract(line) {
                        defx!("found {:?}", dt);
                        return Ok(Some(dt));
                    }
                    walk = true;
                }
                ResultS3::Done => {}
                ResultS3::Err(err) => {
                    defx!("error {}", err);
                    return Err(err);
                }
            }
            if walk {
                while let Some(line) = self.reader.prev_line() {
                    if let Some(dt) = self.extractor.extract(line) {
                        defx!("found {:?}", dt);
                        return Ok(Some(dt));
                    }
                }
            }
            if offset == 0 {
                break;
            }
            end = match self.reader.first_newline_fileoffset() {
                Some(nl) if nl + 1 < end => nl + 1,
                _ => offset,
            };
        }
        defx!("return None");

        Ok(None)
    }

    /// Scan the lines that begin in the window at `mid` for the first line
    /// with a timestamp.
    ///
    /// `Done` if there is no such line. Lines that begin after `high` are not
    /// scanned; the first timestamp after `high` was already decided by an
    /// earlier probe.
    fn probe<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        mid: FileOffset,
        high: FileOffset,
    ) -> ResultS3<DateTimeL, Error> {
        defn!("({}, high {})", mid, high);
        self.summary.probes += 1;
        let limit: FileOffset = high.min(mid + self.config.windowsz as FileOffset);
        match drop_line(self.reader.read_line_at(source, mid)) {
            ResultS3::Found(()) => {}
            ResultS3::Done => {
                defx!("no line begins in the window");
                return ResultS3::Done;
            }
            ResultS3::Err(err) => return ResultS3::Err(err),
        }
        loop {
            if self.reader.line_fileoffset() > limit {
                defx!("passed limit {}", limit);
                return ResultS3::Done;
            }
            if let Some(dt) = self.extractor.extract(self.reader.line()) {
                defx!("line @{} {:?}", self.reader.line_fileoffset(), dt);
                return ResultS3::Found(dt);
            }
            match drop_line(self.reader.read_next_line(source)) {
                ResultS3::Found(()) => {}
                ResultS3::Done => {
                    defx!("end of lines");
                    return ResultS3::Done;
                }
                ResultS3::Err(err) => return ResultS3::Err(err),
            }
        }
    }

    /// Scan forward line by line from `low` for the first line with a
    /// timestamp at or after `threshold`.
    ///
    /// If every timestamp is older then the offset is past the last line
    /// scanned, or the start of that line if it was cut at the growth limit.
    /// If no line has a timestamp then the offset is the first line scanned.
    fn refine<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        low: FileOffset,
        threshold: &DateTimeL,
    ) -> Result<FileOffset> {
        defn!("({}, {:?})", low, threshold);
        self.reader.reset();
        match drop_line(self.reader.read_line_at(source, low)) {
            ResultS3::Found(()) => {}
            ResultS3::Done => {
                defx!("no line, return {}", low);
                return Ok(low);
            }
            ResultS3::Err(err) => return Err(err),
        }
        let first_line: FileOffset = self.reader.line_fileoffset();
        let mut past_last: FileOffset = first_line;
        let mut seen: bool = false;
        loop {
            let line_at: FileOffset = self.reader.line_fileoffset();
            if let Some(dt) = self.extractor.extract(self.reader.line()) {
                seen = true;
                if dt >= *threshold {
                    defx!("line @{} {:?}, return {}", line_at, dt, line_at);
                    return Ok(line_at);
                }
            }
            past_last = match self.reader.is_terminated() || self.reader.is_eof() {
                true => self.reader.line_end_fileoffset(),
                false => line_at,
            };
            match drop_line(self.reader.read_next_line(source)) {
                ResultS3::Found(()) => {}
                ResultS3::Done => break,
                ResultS3::Err(err) => return Err(err),
            }
        }
        let offset = match seen {
            true => past_last,
            false => first_line,
        };
        defx!("end of data, seen {}, return {}", seen, offset);

        Ok(offset)
    }

    pub fn summary(&self) -> SummarySearch {
        self.summary.clone()
    }
}
