//! Heirloom - Family photo archive
//!
//! This library crate exposes the archive workflow, configuration, and HTTP
//! server for the binary and for integration testing.

pub mod archive;
pub mod config;
pub mod server;
