// src/readers/filesession.rs

//! Implements a [`FileSession`], the search and copy-out of one byte
//! source.
//!
//! [`FileSession`]: crate::readers::filesession::FileSession

use crate::common::{File, FileOffset, FileOpenOptions, FPath};
use crate::config::searchconfig::SearchConfig;
use crate::readers::bytesource::ByteSource;
use crate::readers::offsetlocator::OffsetLocator;
use crate::readers::summary::SummarySearch;

use std::io::{Error, Result, SeekFrom, Write};
use std::sync::Arc;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// A `FileSession` owns one [`ByteSource`] and the [`SearchConfig`] to
/// search it with.
///
/// [`find_position`] stores the offset of the trailing duration,
/// [`copy_to`] and [`reader_at_offset`] read from it.
///
/// Sessions are independent; one session is driven by one thread.
///
/// [`ByteSource`]: crate::readers::bytesource::ByteSource
/// [`SearchConfig`]: crate::config::searchconfig::SearchConfig
/// [`find_position`]: FileSession::find_position
/// [`copy_to`]: FileSession::copy_to
/// [`reader_at_offset`]: FileSession::reader_at_offset
pub struct FileSession<S: ByteSource> {
    source: S,
    config: Arc<SearchConfig>,
    /// the found offset, 0 before any search
    offset: FileOffset,
    summary: SummarySearch,
}

impl<S: ByteSource + std::fmt::Debug> std::fmt::Debug for FileSession<S> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        f.debug_struct("FileSession")
            .field("source", &self.source)
            .field("offset", &self.offset)
            .finish()
    }
}

impl FileSession<File> {
    /// Open the file at `path` read-only.
    pub fn open(
        path: &FPath,
        config: Arc<SearchConfig>,
    ) -> Result<FileSession<File>> {
        defn!("({:?})", path);
        let mut open_options = FileOpenOptions::new();
        let file: File = match open_options.read(true).open(path) {
            Ok(val) => val,
            Err(err) => {
                defx!("error {}", err);
                return Err(Error::new(err.kind(), format!("{} for file {:?}", err, path)));
            }
        };
        defx!();

        Ok(FileSession::new(file, config))
    }
}

impl<S: ByteSource> FileSession<S> {
    pub fn new(
        source: S,
        config: Arc<SearchConfig>,
    ) -> FileSession<S> {
        FileSession {
            source,
            config,
            offset: 0,
            summary: SummarySearch::default(),
        }
    }

    /// Search for the offset of the trailing duration and store it.
    ///
    /// Every call searches from scratch with the current size of the
    /// source.
    pub fn find_position(&mut self) -> Result<FileOffset> {
        defn!();
        let mut locator = OffsetLocator::new(self.config.clone());
        let offset = locator.find_position(&self.source);
        self.summary = locator.summary();
        let offset = offset?;
        self.offset = offset;
        defx!("return {}", offset);

        Ok(offset)
    }

    /// The stored offset; 0 before any search.
    pub const fn offset(&self) -> FileOffset {
        self.offset
    }

    /// Seek the source to the stored offset and return it for reading.
    pub fn reader_at_offset(&mut self) -> Result<&mut S> {
        defñ!("offset {}", self.offset);
        self.source.seek(SeekFrom::Start(self.offset))?;

        Ok(&mut self.source)
    }

    /// Copy all bytes from the stored offset to the end of the source
    /// into `sink`. Returns the count of bytes copied.
    pub fn copy_to<W: Write + ?Sized>(
        &mut self,
        sink: &mut W,
    ) -> Result<u64> {
        defn!("offset {}", self.offset);
        self.source.seek(SeekFrom::Start(self.offset))?;
        let copied: u64 = std::io::copy(&mut self.source, sink)?;
        self.summary.bytes_copied += copied;
        defx!("return {}", copied);

        Ok(copied)
    }

    /// Statistics of the last search.
    pub fn summary(&self) -> SummarySearch {
        self.summary.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}
