// src/readers/windowreader.rs

//! Implements a [`WindowReader`], the line-at-a-time access to a window of
//! bytes read from a [`ByteSource`].
//!
//! [`WindowReader`]: crate::readers::windowreader::WindowReader
//! [`ByteSource`]: crate::readers::bytesource::ByteSource

use crate::common::{Bytes, Count, FileOffset, NLu8, ResultS3};
#[cfg(any(debug_assertions, test))]
use crate::debug::printers::buffer_to_String_noraw;
use crate::readers::bytesource::{read_full_at, ByteSource};

use std::fmt;
use std::io::Error;

use ::memchr::{memchr, memrchr};
#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Window Size in bytes.
pub type WindowSz = usize;

/// Minimum window size in bytes.
pub const WINDOWSZ_MIN: WindowSz = 16;

/// Default window size in bytes, 16 KiB.
pub const WINDOWSZ_DEF: WindowSz = 1 << 14;

/// Maximum window size in bytes.
pub const WINDOWSZ_MAX: WindowSz = 1 << 26;

/// A line is searched for in at most this many windows of bytes. A longer
/// line is returned unterminated.
pub const WINDOW_GROWTH_LIMIT: usize = 4;

/// A typed [`ResultS3`] for `WindowReader` functions that return a line.
/// The line does not include the terminating newline.
///
/// [`ResultS3`]: crate::common::ResultS3
pub type ResultS3ReadLine<'a> = ResultS3<&'a [u8], Error>;

/// Statistics about a [`WindowReader`].
///
/// [`WindowReader`]: self::WindowReader
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SummaryWindowReader {
    pub windowreader_windowsz: WindowSz,
    /// count of reads from the `ByteSource`
    pub windowreader_reads: Count,
    /// count of bytes read from the `ByteSource`
    pub windowreader_bytes: Count,
    /// count of times a window was grown to find the end of a line
    pub windowreader_grows: Count,
    /// count of lines isolated
    pub windowreader_lines: Count,
}

/// A `WindowReader` loads a window of bytes at some file offset and isolates
/// lines within it.
///
/// Lines are not aligned to windows. A window loaded at an offset other than
/// `0` begins with a partial line which is skipped. A window may end with a
/// partial line, it is never mistaken for a complete line.
///
/// The current line is the bytes `buffer[line_start..line_end]`; when the
/// line is terminated then `buffer[line_end]` is the newline.
///
/// One `WindowReader` per search, it is mutated by every call.
///
/// _This is not a rust "Reader"; it does not implement the trait [`Read`]._
///
/// [`Read`]: std::io::Read
pub struct WindowReader {
    /// loaded bytes
    buffer: Bytes,
    /// bytes per read
    windowsz: WindowSz,
    /// file offset of `buffer[0]`
    fileoffset: FileOffset,
    /// index of the first byte of the current line, `None` if no line is
    /// isolated
    line_start: Option<usize>,
    /// index one past the last byte of the current line
    line_end: usize,
    /// the current line ends with a newline
    terminated: bool,
    /// `buffer` has no valid line data
    discard: bool,
    /// `buffer` reaches the end of data
    eof: bool,
    pub(crate) count_reads: Count,
    pub(crate) count_bytes: Count,
    pub(crate) count_grows: Count,
    pub(crate) count_lines: Count,
}

impl fmt::Debug for WindowReader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("WindowReader")
            .field("windowsz", &self.windowsz)
            .field("fileoffset", &self.fileoffset)
            .field("buffer.len()", &self.buffer.len())
            .field("line_start", &self.line_start)
            .field("line_end", &self.line_end)
            .field("terminated", &self.terminated)
            .field("discard", &self.discard)
            .field("eof", &self.eof)
            .finish()
    }
}

impl WindowReader {
    /// Create a new `WindowReader` that reads `windowsz` bytes at a time.
    pub fn new(windowsz: WindowSz) -> WindowReader {
        debug_assert_ge!(windowsz, 1, "windowsz must be at least 1");
        WindowReader {
            buffer: Bytes::with_capacity(windowsz),
            windowsz,
            fileoffset: 0,
            line_start: None,
            line_end: 0,
            terminated: false,
            discard: true,
            eof: false,
            count_reads: 0,
            count_bytes: 0,
            count_grows: 0,
            count_lines: 0,
        }
    }

    pub const fn windowsz(&self) -> WindowSz {
        self.windowsz
    }

    /// The loaded bytes reach the end of data.
    pub const fn is_eof(&self) -> bool {
        self.eof
    }

    /// The current line ends with a newline. An unterminated line is the
    /// last line of the data or was cut at the growth limit.
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// There is no current line.
    pub const fn is_discarded(&self) -> bool {
        self.discard
    }

    /// Clear the cursors. The buffer holds no valid line data until the next
    /// read.
    pub fn reset(&mut self) {
        self.line_start = None;
        self.line_end = 0;
        self.terminated = false;
        self.discard = true;
        self.eof = false;
    }

    /// The current line, without the terminating newline. Empty if there is
    /// no current line.
    pub fn line(&self) -> &[u8] {
        match (self.discard, self.line_start) {
            (false, Some(start)) => &self.buffer[start..self.line_end],
            _ => &[],
        }
    }

    /// File offset of the first byte of the current line.
    pub fn line_fileoffset(&self) -> FileOffset {
        self.fileoffset + self.line_start.unwrap_or(0) as FileOffset
    }

    /// File offset one past the current line, including the terminating
    /// newline.
    pub fn line_end_fileoffset(&self) -> FileOffset {
        let end = match self.terminated {
            true => self.line_end + 1,
            false => self.line_end,
        };

        self.fileoffset + end as FileOffset
    }

    /// File offset of the first newline in the loaded bytes.
    pub fn first_newline_fileoffset(&self) -> Option<FileOffset> {
        memchr(NLu8, &self.buffer).map(|at| self.fileoffset + at as FileOffset)
    }

    /// Replace the buffer with `windowsz` bytes read at `offset`.
    fn load<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        offset: FileOffset,
    ) -> Result<usize, Error> {
        self.buffer.clear();
        self.buffer.resize(self.windowsz, 0);
        self.fileoffset = offset;
        let len = match read_full_at(source, &mut self.buffer, offset) {
            Ok(len) => len,
            Err(err) => {
                self.buffer.clear();
                self.reset();
                return Err(err);
            }
        };
        self.buffer.truncate(len);
        self.eof = len < self.windowsz;
        self.count_reads += 1;
        self.count_bytes += len as Count;
        defñ!("offset {}, read {} bytes, eof {}", offset, len, self.eof);

        Ok(len)
    }

    /// Append another `windowsz` bytes to the buffer.
    fn grow<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<usize, Error> {
        let at = self.buffer.len();
        self.buffer.resize(at + self.windowsz, 0);
        let offset = self.fileoffset + at as FileOffset;
        let len = match read_full_at(source, &mut self.buffer[at..], offset) {
            Ok(len) => len,
            Err(err) => {
                self.buffer.truncate(at);
                self.reset();
                return Err(err);
            }
        };
        self.buffer.truncate(at + len);
        self.eof = len < self.windowsz;
        self.count_reads += 1;
        self.count_grows += 1;
        self.count_bytes += len as Count;
        defñ!("offset {}, read {} bytes, eof {}, buffer.len() {}", offset, len, self.eof, self.buffer.len());

        Ok(len)
    }

    /// Isolate the line beginning at `buffer[start]`, growing the buffer to
    /// find the terminating newline.
    fn isolate<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        start: usize,
    ) -> ResultS3<(), Error> {
        let mut from: usize = start;
        loop {
            if let Some(at) = memchr(NLu8, &self.buffer[from..]) {
                self.set_line(start, from + at, true);
                return ResultS3::Found(());
            }
            from = self.buffer.len();
            if self.eof || self.buffer.len() >= self.windowsz * WINDOW_GROWTH_LIMIT {
                break;
            }
            if let Err(err) = self.grow(source) {
                return ResultS3::Err(err);
            }
        }
        if start >= self.buffer.len() {
            self.discard = true;
            return ResultS3::Done;
        }
        // end of data or growth limit; best-effort unterminated line
        let end = self.buffer.len();
        self.set_line(start, end, false);

        ResultS3::Found(())
    }

    fn set_line(
        &mut self,
        start: usize,
        end: usize,
        terminated: bool,
    ) {
        debug_assert_le!(start, end, "line start {} after end {}", start, end);
        debug_assert_le!(end, self.buffer.len(), "line end {} after buffer end", end);
        self.line_start = Some(start);
        self.line_end = end;
        self.terminated = terminated;
        self.discard = false;
        self.count_lines += 1;
    }

    /// Load a window at `offset` and isolate the first line that begins
    /// in it. `at_line_start` means `offset` is known to be the beginning of
    /// a line.
    fn anchor<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        offset: FileOffset,
        at_line_start: bool,
    ) -> ResultS3<(), Error> {
        self.reset();
        match self.load(source, offset) {
            Ok(0) => return ResultS3::Done,
            Ok(_) => {}
            Err(err) => return ResultS3::Err(err),
        }
        let start: usize = match at_line_start {
            true => 0,
            // skip the partial line
            false => match memchr(NLu8, &self.buffer) {
                Some(at) => at + 1,
                None => return ResultS3::Done,
            },
        };

        self.isolate(source, start)
    }

    fn found_line(
        &self,
        result: ResultS3<(), Error>,
    ) -> ResultS3ReadLine<'_> {
        match result {
            ResultS3::Found(()) => {
                defñ!("line @{} {:?}", self.line_fileoffset(), buffer_to_String_noraw(self.line()));
                ResultS3::Found(self.line())
            }
            ResultS3::Done => ResultS3::Done,
            ResultS3::Err(err) => ResultS3::Err(err),
        }
    }

    /// Load a window at `offset` and return the first line that begins in it.
    ///
    /// At `offset` 0 the first byte begins a line. Otherwise the bytes up to
    /// the first newline are a partial line and skipped; if the window has
    /// no newline then return `Done`.
    ///
    /// A line that does not end within the window is searched for in
    /// up to [`WINDOW_GROWTH_LIMIT`] windows. A line longer than that, or a
    /// line at the end of data without a newline, is returned unterminated.
    pub fn read_line_at<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        offset: FileOffset,
    ) -> ResultS3ReadLine<'_> {
        defn!("({})", offset);
        let result = self.anchor(source, offset, offset == 0);
        defx!("{}", result);

        self.found_line(result)
    }

    /// Advance to the next line within the loaded bytes. No reads.
    ///
    /// Returns `None` if there is no current line or no further newline in
    /// the loaded bytes; the caller must then [`refill`] or re-anchor.
    ///
    /// [`refill`]: WindowReader::refill
    pub fn next_line(&mut self) -> Option<&[u8]> {
        if self.discard || !self.terminated {
            return None;
        }
        self.line_start?;
        let start = self.line_end + 1;
        if start >= self.buffer.len() {
            return None;
        }
        let at = memchr(NLu8, &self.buffer[start..])?;
        self.set_line(start, start + at, true);

        Some(self.line())
    }

    /// Load the window that follows the current line and return the line
    /// after the current line.
    ///
    /// Returns `Done` when the current line is the last line or there is no
    /// current line. A current line cut at the growth limit has the rest of
    /// it skipped if it ends within the next window, otherwise `Done`.
    pub fn refill<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> ResultS3ReadLine<'_> {
        defn!();
        if self.discard || self.line_start.is_none() {
            defx!("no current line");
            return ResultS3::Done;
        }
        if self.terminated {
            let offset = self.line_end_fileoffset();
            defo!("next line at {}", offset);
            let result = self.anchor(source, offset, true);
            defx!("{}", result);
            return self.found_line(result);
        }
        if self.eof {
            defx!("current line is the last line");
            return ResultS3::Done;
        }
        // one more window; a line longer than that is not followed
        let offset = self.fileoffset + self.buffer.len() as FileOffset;
        defo!("skip rest of long line from {}", offset);
        let result = self.anchor(source, offset, false);
        defx!("{}", result);

        self.found_line(result)
    }

    /// Return the next line, reading more windows if needed.
    pub fn read_next_line<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> ResultS3ReadLine<'_> {
        if self.next_line().is_some() {
            return ResultS3::Found(self.line());
        }

        self.refill(source)
    }

    /// Load a window at `offset` and return the last complete line in it,
    /// the bytes between the second-to-last and the last newline.
    ///
    /// Returns `Done` if the window has fewer than two newlines. At `offset`
    /// 0 the first byte begins a line so one newline is enough.
    pub fn find_last_line_at<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        offset: FileOffset,
    ) -> ResultS3ReadLine<'_> {
        defn!("({})", offset);
        self.reset();
        match self.load(source, offset) {
            Ok(0) => {
                defx!("no data");
                return ResultS3::Done;
            }
            Ok(_) => {}
            Err(err) => {
                defx!("error {}", err);
                return ResultS3::Err(err);
            }
        }
        let end: usize = match memrchr(NLu8, &self.buffer) {
            Some(at) => at,
            None => {
                defx!("no newline");
                return ResultS3::Done;
            }
        };
        let start: usize = match memrchr(NLu8, &self.buffer[..end]) {
            Some(at) => at + 1,
            None if offset == 0 => 0,
            None => {
                defx!("one newline");
                return ResultS3::Done;
            }
        };
        self.set_line(start, end, true);
        defx!("line @{}", self.line_fileoffset());

        self.found_line(ResultS3::Found(()))
    }

    /// Step back to the complete line before the current line within the
    /// loaded bytes. No reads.
    pub fn prev_line(&mut self) -> Option<&[u8]> {
        if self.discard {
            return None;
        }
        let start: usize = self.line_start?;
        if start == 0 {
            return None;
        }
        // `buffer[start - 1]` is the newline ending the previous line
        let end: usize = start - 1;
        let prev_start: usize = match memrchr(NLu8, &self.buffer[..end]) {
            Some(at) => at + 1,
            None if self.fileoffset == 0 => 0,
            None => return None,
        };
        self.set_line(prev_start, end, true);

        Some(self.line())
    }

    pub fn summary(&self) -> SummaryWindowReader {
        SummaryWindowReader {
            windowreader_windowsz: self.windowsz,
            windowreader_reads: self.count_reads,
            windowreader_bytes: self.count_bytes,
            windowreader_grows: self.count_grows,
            windowreader_lines: self.count_lines,
        }
    }
}
