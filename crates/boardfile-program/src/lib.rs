//! Loading bitstreams onto boards described by `boardfile-platform`.
//!
//! ## Modules
//!
//! - [`template`]: Descriptor templates with a known placeholder set
//! - [`xcf`]: The Lattice ispXCF chain descriptor
//! - [`programmer`]: The [`Programmer`] trait and its template-driven adapter
//! - [`invoke`]: Running the external tool with a timeout

pub mod error;
pub mod invoke;
pub mod programmer;
pub mod template;
pub mod xcf;

// Re-export key types for convenience
pub use error::{ProgramError, Result, TemplateError};
pub use invoke::{run_tool, ToolOutcome};
pub use programmer::{adapter_for, programmer_for, Descriptor, Programmer, TemplateProgrammer};
pub use template::{Escape, Template};
