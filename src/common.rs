// src/common.rs
//
// type aliases and small shared types of the library and the binary

//! Common type aliases and shared enums for _ttaillib_.

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// files and offsets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[doc(hidden)]
pub use std::fs::File;

/// A file path as given by the user. Kept as a `String` so it can be
/// printed as-is in messages.
pub type FPath = String;
pub type FileOpenOptions = std::fs::OpenOptions;

/// Absolute byte offset into a file.
pub type FileOffset = u64;

/// Size of a file in bytes, as read at the start of a search.
pub type FileSz = u64;

/// Counter used by the `Summary*` statistics.
pub type Count = u64;

/// Owned bytes.
pub type Bytes = Vec<u8>;

/// Newline byte. Only `'\n'` ends a line; a preceding `'\r'` stays part of
/// the line.
#[allow(non_upper_case_globals)]
pub const NLu8: u8 = b'\n';

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// three-state result of line reading
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of the line reading functions of a [`WindowReader`].
///
/// `Done` means there is no line where one was asked for: the window is
/// past the end of the data or holds no complete line. A line that has no
/// timestamp is still `Found`.
///
/// [`WindowReader`]: crate::readers::windowreader::WindowReader
#[derive(Debug, PartialEq)]
pub enum ResultS3<T, E> {
    /// A line (or other value) was found.
    Found(T),
    /// Nothing to return, not an error.
    Done,
    /// I/O failed.
    Err(E),
}

impl<T, E> ResultS3<T, E> {
    /// `Found` or `Done`.
    #[inline(always)]
    pub const fn is_ok(&self) -> bool {
        !self.is_err()
    }

    #[inline(always)]
    pub const fn is_found(&self) -> bool {
        matches!(self, ResultS3::Found(_))
    }

    #[inline(always)]
    pub const fn is_done(&self) -> bool {
        matches!(self, ResultS3::Done)
    }

    #[inline(always)]
    pub const fn is_err(&self) -> bool {
        matches!(self, ResultS3::Err(_))
    }

    /// The `Found` value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            ResultS3::Found(val) => Some(val),
            ResultS3::Done | ResultS3::Err(_) => None,
        }
    }

    /// The `Err` value, if any.
    pub fn err(self) -> Option<E> {
        match self {
            ResultS3::Err(err) => Some(err),
            ResultS3::Found(_) | ResultS3::Done => None,
        }
    }
}

impl<T, E> std::fmt::Display for ResultS3<T, E>
where
    E: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultS3::Found(_) => write!(f, "ResultS3::Found"),
            ResultS3::Done => write!(f, "ResultS3::Done"),
            ResultS3::Err(err) => write!(f, "ResultS3::Err({})", err),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// global allocator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The global allocator chosen at build time with `--features`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AllocatorChosen {
    System,
    Jemalloc,
    Mimalloc,
}

impl std::fmt::Display for AllocatorChosen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AllocatorChosen::System => "system",
            AllocatorChosen::Jemalloc => "jemalloc",
            AllocatorChosen::Mimalloc => "mimalloc",
        };
        write!(f, "{}", name)
    }
}
