//! trackscan-core: shared media types, scan configuration, and errors.
//!
//! This crate is the foundational dependency for the other trackscan crates,
//! providing the file/track records that flow through the scan pipeline, the
//! TOML-backed [`ScanConfig`], and a unified error type.

pub mod config;
pub mod error;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use config::{
    ExtensionConfig, LanguagePolicy, MatchScope, MatchingConfig, ProbeConfig, ScanConfig,
};
pub use error::{Error, Result};
pub use media::*;
