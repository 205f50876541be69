//! Command Line Interface (CLI) layer for wxramp.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`). It wires user-provided options to
//! the library's `BatchRunner`.
//!
//! If you are embedding wxramp into another application, prefer the
//! high-level `wxramp::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
