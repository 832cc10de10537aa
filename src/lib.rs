//! Phaseforged - policy-driven phase execution for media files
//!
//! This library crate exposes the CLI's configuration and rendering for
//! integration testing. The engine itself lives in the `pf-*` crates.

pub mod config;
pub mod render;
