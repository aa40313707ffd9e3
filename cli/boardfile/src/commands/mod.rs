//! CLI command implementations.

pub mod constraints;
pub mod describe;
pub mod list;
pub mod program;
pub mod template;
pub mod validate;
