//! Error types for platform description operations.

use std::path::PathBuf;

/// Broad class of a [`PlatformError`].
///
/// Configuration errors are raised while a descriptor is being built and are
/// always fatal. Lookup errors point at a caller bug. Unpopulated errors are
/// recoverable: the caller may choose to skip the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Lookup,
    Unpopulated,
    Io,
}

/// Errors that can occur while building or querying a platform description.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The same (name, index) pair was declared more than once.
    #[error("signal {name}:{index} is declared more than once")]
    AmbiguousSignal { name: String, index: u32 },

    /// A signal declaration is structurally invalid.
    #[error("malformed signal {name}:{index}: {detail}")]
    MalformedSignal {
        name: String,
        index: u32,
        detail: String,
    },

    /// A connector table is structurally invalid.
    #[error("malformed connector '{connector}': {detail}")]
    MalformedConnector { connector: String, detail: String },

    /// A pin binding references a connector position that cannot be used.
    #[error("bad connector reference '{reference}' in {signal}: {detail}")]
    BadConnectorReference {
        signal: String,
        reference: String,
        detail: String,
    },

    /// The default clock does not name a declared single signal, or its
    /// period is not a positive number.
    #[error("invalid default clock: {detail}")]
    InvalidDefaultClock { detail: String },

    /// No signal with this name and index exists.
    #[error("unknown signal {name}:{index}")]
    UnknownSignal { name: String, index: u32 },

    /// The signal exists but has no such subsignal.
    #[error("signal {name}:{index} has no subsignal '{subsignal}'")]
    UnknownSubsignal {
        name: String,
        index: u32,
        subsignal: String,
    },

    /// A compound signal was resolved without naming one of its parts.
    #[error("signal {name}:{index} is a subsignal group; a subsignal name is required")]
    SubsignalRequired { name: String, index: u32 },

    /// No connector with this name exists.
    #[error("unknown connector '{name}'")]
    UnknownConnector { name: String },

    /// The connector position holds a ground, power or no-connect marker.
    #[error("connector {connector} position {position} is reserved ({slot})")]
    ReservedPosition {
        connector: String,
        position: usize,
        slot: String,
    },

    /// The connector position is outside `1..=N`.
    #[error("connector {connector} has no position {position} (valid: 1..={len})")]
    PositionOutOfRange {
        connector: String,
        position: usize,
        len: usize,
    },

    /// The platform declares no default clock.
    #[error("platform '{device}' has no default clock")]
    NoDefaultClock { device: String },

    /// The default clock period disagrees with the clock's documented frequency.
    #[error(
        "default clock {signal} period {period_ns} ns does not match its documented frequency of {frequency_hz} Hz (expected {expected_ns:.3} ns)"
    )]
    ClockPeriodMismatch {
        signal: String,
        period_ns: f64,
        frequency_hz: u64,
        expected_ns: f64,
    },

    /// The binding has no pins but a physical pin was required.
    #[error("signal {signal} is unpopulated on this board")]
    UnpopulatedSignal { signal: String },

    /// The resource has already been handed out by a [`ResourcePool`](crate::claim::ResourcePool).
    #[error("signal {name}:{index} has already been claimed")]
    AlreadyClaimed { name: String, index: u32 },

    /// Every index of this signal name has already been claimed.
    #[error("no unclaimed {name} signal left")]
    NoFreeResource { name: String },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing definition files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Definition file not found.
    #[error("platform file not found: {}", path.display())]
    NotFound { path: PathBuf },
}

impl PlatformError {
    /// Classify the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            PlatformError::AmbiguousSignal { .. }
            | PlatformError::MalformedSignal { .. }
            | PlatformError::MalformedConnector { .. }
            | PlatformError::BadConnectorReference { .. }
            | PlatformError::InvalidDefaultClock { .. }
            | PlatformError::ClockPeriodMismatch { .. }
            | PlatformError::Toml(_)
            | PlatformError::TomlSer(_) => ErrorClass::Configuration,
            PlatformError::UnknownSignal { .. }
            | PlatformError::UnknownSubsignal { .. }
            | PlatformError::SubsignalRequired { .. }
            | PlatformError::UnknownConnector { .. }
            | PlatformError::ReservedPosition { .. }
            | PlatformError::PositionOutOfRange { .. }
            | PlatformError::NoDefaultClock { .. }
            | PlatformError::AlreadyClaimed { .. }
            | PlatformError::NoFreeResource { .. } => ErrorClass::Lookup,
            PlatformError::UnpopulatedSignal { .. } => ErrorClass::Unpopulated,
            PlatformError::Io(_) | PlatformError::NotFound { .. } => ErrorClass::Io,
        }
    }
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
