//! varscope Application - Variable workflows and ports
//!
//! This crate contains the use cases that load, merge, resolve and edit
//! scoped variables, and the port traits (interfaces) those use cases
//! depend on. Adapters for the ports live in the infrastructure crate.

pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use error::{ApplicationError, ApplicationResult, ensure_ready};
