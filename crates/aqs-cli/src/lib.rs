//! Air-quality sampling CLI: argument parsing, run driver and console output

pub mod args;
pub mod driver;
pub mod report;

pub use args::Cli;
pub use driver::{execute, Completed, Execution};
