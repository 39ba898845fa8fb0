// src/readers/bytesource.rs

//! Implements the [`ByteSource`] trait, random-access reads of an
//! append-only sequence of bytes.
//!
//! [`ByteSource`]: crate::readers::bytesource::ByteSource

use crate::common::{File, FileOffset, FileSz};

use std::io::{Cursor, ErrorKind, Read, Result, Seek};

use ::cfg_if::cfg_if;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// A seekable, randomly-readable, append-only sequence of bytes.
///
/// `read_at` reads at an absolute offset without using the sequential cursor
/// of [`Read`] + [`Seek`]. The sequential cursor is used to stream the bytes
/// after a found offset.
///
/// The size may grow between calls; a search snapshots it once.
pub trait ByteSource: Read + Seek {
    /// Read up to `buf.len()` bytes at `offset`. Returns the count of bytes
    /// read, `0` at or beyond the end of data.
    fn read_at(
        &self,
        buf: &mut [u8],
        offset: FileOffset,
    ) -> Result<usize>;

    /// Current size in bytes.
    fn size(&self) -> Result<FileSz>;
}

impl ByteSource for File {
    fn read_at(
        &self,
        buf: &mut [u8],
        offset: FileOffset,
    ) -> Result<usize> {
        cfg_if! {
            if #[cfg(unix)] {
                std::os::unix::fs::FileExt::read_at(self, buf, offset)
            } else if #[cfg(windows)] {
                // XXX: `seek_read` also moves the file cursor, callers seek
                //      before streaming
                std::os::windows::fs::FileExt::seek_read(self, buf, offset)
            } else {
                let _ = (buf, offset);
                Err(std::io::Error::new(
                    ErrorKind::Unsupported,
                    "positional file reads are not supported on this platform",
                ))
            }
        }
    }

    fn size(&self) -> Result<FileSz> {
        Ok(self.metadata()?.len())
    }
}

/// In-memory byte source.
impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
    fn read_at(
        &self,
        buf: &mut [u8],
        offset: FileOffset,
    ) -> Result<usize> {
        let data: &[u8] = self.get_ref().as_ref();
        if offset >= data.len() as FileOffset {
            return Ok(0);
        }
        let at = offset as usize;
        let len = std::cmp::min(buf.len(), data.len() - at);
        buf[..len].copy_from_slice(&data[at..at + len]);

        Ok(len)
    }

    fn size(&self) -> Result<FileSz> {
        Ok(self.get_ref().as_ref().len() as FileSz)
    }
}

/// Read at `offset` until `buf` is full or the end of data.
/// Returns the count of bytes read.
///
/// Retries reads that were interrupted.
pub fn read_full_at<S: ByteSource + ?Sized>(
    source: &S,
    buf: &mut [u8],
    offset: FileOffset,
) -> Result<usize> {
    defn!("(buf.len() {}, offset {})", buf.len(), offset);
    let mut at: usize = 0;
    while at < buf.len() {
        match source.read_at(&mut buf[at..], offset + at as FileOffset) {
            Ok(0) => break,
            Ok(n) => at += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {
                defo!("interrupted, retry");
                continue;
            }
            Err(err) => {
                defx!("error {}", err);
                return Err(err);
            }
        }
    }
    defx!("return {}", at);

    Ok(at)
}
