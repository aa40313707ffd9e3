//! Programmer configuration carried by a platform.
//!
//! The platform only describes which programmer kind it uses and with what
//! device identity. Rendering and running it is done by `boardfile-program`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Token in [`ToolCommand::args`] replaced by the descriptor file path.
pub const DESCRIPTOR_TOKEN: &str = "{descriptor}";

/// Default time allowed for one programming run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// JTAG IDCODE of a device, written as hex (`0x81112043`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdCode(pub u32);

impl TryFrom<String> for IdCode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| format!("IDCode '{s}' must start with 0x"))?;
        u32::from_str_radix(digits, 16)
            .map(IdCode)
            .map_err(|e| format!("IDCode '{s}': {e}"))
    }
}

impl From<IdCode> for String {
    fn from(id: IdCode) -> Self {
        id.to_string()
    }
}

impl fmt::Display for IdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// External program used to flash the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    /// Arguments; [`DESCRIPTOR_TOKEN`] is replaced by the descriptor path.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Lattice Diamond's command line programmer.
    pub fn pgrcmd() -> Self {
        Self {
            program: "pgrcmd".into(),
            args: vec!["-infile".into(), DESCRIPTOR_TOKEN.into()],
        }
    }
}

/// Device and cable identity written into a Lattice ispXCF chain file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct XcfIdentity {
    pub family: String,
    pub device: String,
    pub idcode: IdCode,
    #[serde(default = "default_cable")]
    pub cable: String,
    #[serde(default = "default_port")]
    pub port: String,
    pub usb_id: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "ToolCommand::pgrcmd")]
    pub tool: ToolCommand,
}

fn default_cable() -> String {
    "USB2".to_string()
}

fn default_port() -> String {
    "FTUSB-0".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// A programmer described entirely by the definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomProgrammer {
    /// Descriptor template with `{{name}}` placeholders.
    pub template: String,
    /// File extension of the rendered descriptor.
    pub extension: String,
    /// Escape substituted values for XML.
    #[serde(default)]
    pub xml: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Values for placeholders other than `bitstream_file`.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    pub tool: ToolCommand,
}

/// Programmer kind selected by a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProgrammerConfig {
    LatticeXcf(XcfIdentity),
    Custom(CustomProgrammer),
}

impl ProgrammerConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ProgrammerConfig::LatticeXcf(_) => "lattice-xcf",
            ProgrammerConfig::Custom(_) => "custom",
        }
    }

    pub fn tool(&self) -> &ToolCommand {
        match self {
            ProgrammerConfig::LatticeXcf(id) => &id.tool,
            ProgrammerConfig::Custom(c) => &c.tool,
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        match self {
            ProgrammerConfig::LatticeXcf(id) => id.timeout_secs,
            ProgrammerConfig::Custom(c) => c.timeout_secs,
        }
    }
}
