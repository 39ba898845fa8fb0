// src/readers/summary.rs

//! Implements `SummarySearch` statistics tracking struct.

use crate::common::{Count, FileOffset, FileSz};
use crate::config::searchconfig::ReferenceTime;
use crate::data::datetime::DateTimeLOpt;
use crate::readers::windowreader::SummaryWindowReader;

use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Summary
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Accumulated statistics about one search of one file by an
/// [`OffsetLocator`] and it's underlying [`WindowReader`].
///
/// For CLI option `--summary`.
///
/// [`OffsetLocator`]: crate::readers::offsetlocator::OffsetLocator
/// [`WindowReader`]: crate::readers::windowreader::WindowReader
#[derive(Clone, Debug, Default)]
pub struct SummarySearch {
    /// size of the file when the search began
    pub filesz: FileSz,
    /// source of the reference time
    pub reference: ReferenceTime,
    /// the resolved reference time
    pub reference_dt: DateTimeLOpt,
    /// reference time minus the duration; lines at or after it are kept
    pub threshold_dt: DateTimeLOpt,
    /// count of window hops back from the end of the file to find the last
    /// line timestamp
    pub steps: Count,
    /// count of binary search probes
    pub probes: Count,
    /// count of lines passed to the timestamp extractor
    pub extracts: Count,
    /// count of lines that had a timestamp
    pub extracts_found: Count,
    /// the TSKV literal scan was used instead of the regular expression
    pub tskv_fast: bool,
    /// the found offset
    pub offset: FileOffset,
    /// bytes copied from the found offset
    pub bytes_copied: Count,
    pub windowreader: SummaryWindowReader,
}

fn dt_or_none(dt: &DateTimeLOpt) -> String {
    match dt {
        Some(dt) => dt.to_rfc3339(),
        None => String::from("None"),
    }
}

impl fmt::Display for SummarySearch {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        writeln!(f, "  file size      : {} (0x{:X})", self.filesz, self.filesz)?;
        writeln!(f, "  window size    : {} (0x{:X})", self.windowreader.windowreader_windowsz, self.windowreader.windowreader_windowsz)?;
        writeln!(f, "  reference      : {}", self.reference)?;
        writeln!(f, "  reference time : {}", dt_or_none(&self.reference_dt))?;
        writeln!(f, "  threshold time : {}", dt_or_none(&self.threshold_dt))?;
        writeln!(f, "  backward steps : {}", self.steps)?;
        writeln!(f, "  probes         : {}", self.probes)?;
        writeln!(f, "  lines          : {} (with timestamp {}, TSKV fast path {})", self.extracts, self.extracts_found, self.tskv_fast)?;
        writeln!(f, "  reads          : {} (bytes {}, window growths {})", self.windowreader.windowreader_reads, self.windowreader.windowreader_bytes, self.windowreader.windowreader_grows)?;
        writeln!(f, "  offset         : {} (0x{:X})", self.offset, self.offset)?;
        write!(f, "  bytes copied   : {}", self.bytes_copied)
    }
}
