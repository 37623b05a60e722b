//! Command-line interface module.

mod args;
pub mod augment;

pub use args::Cli;
