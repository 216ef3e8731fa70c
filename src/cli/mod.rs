//! Command-line interface for tedquire.

mod commands;
pub mod icons;

pub use commands::{is_verbose, run};
