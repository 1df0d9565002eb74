//! Deterministic JSON for resource files.
//!
//! Resource files are written with 2-space indentation and a trailing
//! newline so that re-saving an unchanged resource produces no diff.

mod json;

pub use json::{from_json_bytes, to_json_stable_bytes};
