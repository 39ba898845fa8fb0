// src/readers/mod.rs

//! "Readers" find the trailing time span of a byte source.
//!
//! ## Overview of readers
//!
//! * A [`ByteSource`] reads bytes at an absolute offset.
//! * A [`WindowReader`] reads fixed-size windows from a `ByteSource` and
//!   finds the complete lines within.
//! * An [`OffsetLocator`] binary searches the lines of a `WindowReader` for
//!   the first line within the trailing duration.
//! * A [`FileSession`] runs an `OffsetLocator` over one `ByteSource` and
//!   copies out the bytes from the found offset.
//!
//! [`ByteSource`]: crate::readers::bytesource::ByteSource
//! [`WindowReader`]: crate::readers::windowreader::WindowReader
//! [`OffsetLocator`]: crate::readers::offsetlocator::OffsetLocator
//! [`FileSession`]: crate::readers::filesession::FileSession

pub mod bytesource;
pub mod filesession;
pub mod offsetlocator;
pub mod summary;
pub mod windowreader;
