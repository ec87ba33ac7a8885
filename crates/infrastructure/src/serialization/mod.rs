//! Deterministic JSON serialization for session records.
//!
//! Records are written with 2-space indentation and a trailing newline so a
//! session file is readable and diffable by hand.

mod json;

pub use json::*;
