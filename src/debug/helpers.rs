// src/debug/helpers.rs

//! Temporary file helpers for tests.

use crate::common::FPath;

use std::io::Write;

extern crate tempfile;

#[doc(hidden)]
pub use tempfile::NamedTempFile;

/// File name prefix of every test file, so leftovers of an aborted test run
/// are easy to find and remove.
pub const STR_TEMPFILE_PREFIX: &str = "tmp-ttail-test-";

/// Path of `ntf` as a `FPath`.
pub fn ntf_fpath(ntf: &NamedTempFile) -> FPath {
    FPath::from(ntf.path().to_string_lossy())
}

/// Write `data` to a new temporary file. Panics on failure.
///
/// BUG: a `NamedTempFile` held in a `lazy_static` is never removed
///      <https://github.com/Stebalien/tempfile/issues/183>.
pub fn create_temp_file_bytes(data: &[u8]) -> NamedTempFile {
    let mut ntf = match tempfile::Builder::new()
        .prefix(STR_TEMPFILE_PREFIX)
        .tempfile()
    {
        Ok(val) => val,
        Err(err) => panic!("tempfile::Builder::tempfile() error {}", err),
    };
    if let Err(err) = ntf.write_all(data).and_then(|_| ntf.flush()) {
        panic!("NamedTempFile::write_all({} bytes) error {}", data.len(), err);
    }

    ntf
}

/// Write `data` to a new temporary file. Panics on failure.
pub fn create_temp_file(data: &str) -> NamedTempFile {
    create_temp_file_bytes(data.as_bytes())
}
