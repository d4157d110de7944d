//! Command implementations.

pub mod completions;
pub mod paths;
pub mod resources;
pub mod run;
