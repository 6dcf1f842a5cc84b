//! CLI command implementations

pub mod completions;
pub mod memory;
pub mod run;
pub mod sigma;
pub mod weeks;
