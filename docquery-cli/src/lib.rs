//! Library half of the `docquery` command.
//!
//! Configuration loading and the provision/query sequence live here so they
//! can be tested against [`docquery::mock::MockProvider`]; `main.rs` only
//! parses arguments and wires up logging and signals.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use error::{CliError, CliResult};
