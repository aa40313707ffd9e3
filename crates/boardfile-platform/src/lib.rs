//! FPGA board descriptions for the boardfile toolchain.
//!
//! A board is described once as an immutable [`PlatformDescriptor`]: the
//! logical signals wired to FPGA package pins, the expansion connectors, the
//! default clock and the programmer the board is flashed with. Backends read
//! the descriptor to emit toolchain constraint files.
//!
//! ## Modules
//!
//! - [`signal`]: Signals, subsignal groups and pin bindings
//! - [`connector`]: Expansion connector position tables
//! - [`platform`]: The descriptor, its builder and constraint enumeration
//! - [`programmer`]: Programmer configuration carried by a platform
//! - [`claim`]: Handing out signals to a design at most once
//! - [`lpf`]: Lattice preference file emitter
//! - [`parse`]: `.platform.toml` definition files and validation
//! - [`boards`]: Built-in board definitions

pub mod boards;
pub mod claim;
pub mod connector;
pub mod error;
pub mod lpf;
pub mod parse;
pub mod platform;
pub mod programmer;
pub mod signal;

// Re-export key types for convenience
pub use claim::ResourcePool;
pub use connector::{ConnectorSlot, ConnectorTable};
pub use error::{ErrorClass, PlatformError, Result};
pub use lpf::emit_lpf;
pub use platform::{ClockCheck, Constraint, DefaultClock, PlatformBuilder, PlatformDescriptor};
pub use programmer::{CustomProgrammer, IdCode, ProgrammerConfig, ToolCommand, XcfIdentity};
pub use signal::{Binding, IoStandard, PinBinding, Signal, SignalName, Subsignal};
