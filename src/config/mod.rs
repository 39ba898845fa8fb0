// src/config/mod.rs

//! Settings of a search.
//!
//! A [`SearchConfig`] is built from defaults, a named [`LogFormat`] of the
//! [`FormatRegistry`], and explicit overrides.
//!
//! [`SearchConfig`]: crate::config::searchconfig::SearchConfig
//! [`LogFormat`]: crate::config::formats::LogFormat
//! [`FormatRegistry`]: crate::config::formats::FormatRegistry

pub mod formats;
pub mod searchconfig;
