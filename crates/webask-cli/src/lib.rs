//! `webask` crate (library surface).
//!
//! The primary entrypoint for end users is the `webask` binary (one-shot `ask` and
//! the interactive `shell`). This module re-exports the core types so embedders can
//! drive a `Session` without depending on internal crate layout.

pub use webask_core as core;
pub use webask_local as local;
