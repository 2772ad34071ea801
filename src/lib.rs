//! Trackscan - media library track scanner
//!
//! This library crate exposes the scan pipeline for the CLI and for
//! integration testing.

pub mod config;
pub mod report;
pub mod scanner;
