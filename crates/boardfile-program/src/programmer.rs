//! Programmer adapters.
//!
//! A [`Programmer`] turns a bitstream path into a tool-specific descriptor
//! document and runs the external utility that flashes the board with it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use boardfile_platform::{CustomProgrammer, PlatformDescriptor, ProgrammerConfig, ToolCommand, XcfIdentity};
use tracing::info;

use crate::error::{ProgramError, Result};
use crate::invoke::{run_tool, ToolOutcome};
use crate::template::{Escape, Template};
use crate::xcf::{identity_values, XCF_EXTENSION, XCF_TEMPLATE};

/// Placeholder that receives the bitstream path.
pub const BITSTREAM_PLACEHOLDER: &str = "bitstream_file";

/// A rendered descriptor and the path it is written to on invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub path: PathBuf,
    pub contents: String,
}

/// Loads bitstreams onto a board through an external tool.
pub trait Programmer {
    /// Short name of the adapter kind.
    fn kind(&self) -> &'static str;

    /// Render the descriptor for `bitstream`. Nothing is written to disk.
    fn render(&self, bitstream: &Path) -> Result<Descriptor>;

    /// Write `descriptor` and run the tool on it.
    ///
    /// Takes `&mut self` so one adapter, and therefore one cable, is never
    /// driven from two places at once.
    fn invoke(&mut self, descriptor: &Descriptor) -> Result<ToolOutcome>;

    /// Render and invoke in one step.
    fn load_bitstream(&mut self, bitstream: &Path) -> Result<ToolOutcome> {
        let descriptor = self.render(bitstream)?;
        self.invoke(&descriptor)
    }
}

/// An adapter driven by a descriptor template and a tool command.
#[derive(Debug, Clone)]
pub struct TemplateProgrammer {
    kind: &'static str,
    template: Template,
    values: BTreeMap<String, String>,
    extension: String,
    tool: ToolCommand,
    timeout: Duration,
}

impl TemplateProgrammer {
    /// Lattice ispXCF chain file run through `pgrcmd` (or the configured tool).
    pub fn lattice_xcf(identity: &XcfIdentity) -> Result<Self> {
        Ok(Self {
            kind: "lattice-xcf",
            template: Template::parse(XCF_TEMPLATE)?.with_escape(Escape::Xml),
            values: identity_values(identity),
            extension: XCF_EXTENSION.to_string(),
            tool: identity.tool.clone(),
            timeout: Duration::from_secs(identity.timeout_secs),
        })
    }

    /// A programmer whose template is given by the definition file.
    pub fn custom(custom: &CustomProgrammer) -> Result<Self> {
        let escape = if custom.xml { Escape::Xml } else { Escape::None };
        Ok(Self {
            kind: "custom",
            template: Template::parse(&custom.template)?.with_escape(escape),
            values: custom.values.clone(),
            extension: custom.extension.trim_start_matches('.').to_string(),
            tool: custom.tool.clone(),
            timeout: Duration::from_secs(custom.timeout_secs),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn tool(&self) -> &ToolCommand {
        &self.tool
    }

    /// Where the descriptor for `bitstream` is written: next to it, with the
    /// extension swapped.
    pub fn descriptor_path(&self, bitstream: &Path) -> Result<PathBuf> {
        let path = bitstream.with_extension(&self.extension);
        if path == bitstream {
            return Err(ProgramError::InvalidPath {
                path: bitstream.to_path_buf(),
                reason: "bitstream already has the descriptor extension",
            });
        }
        Ok(path)
    }
}

impl Programmer for TemplateProgrammer {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn render(&self, bitstream: &Path) -> Result<Descriptor> {
        let bitstream_text = check_bitstream(bitstream)?;
        let path = self.descriptor_path(bitstream)?;

        let mut values = self.values.clone();
        values.insert(BITSTREAM_PLACEHOLDER.to_string(), bitstream_text.to_string());
        let contents = self.template.render(&values)?;
        Ok(Descriptor { path, contents })
    }

    fn invoke(&mut self, descriptor: &Descriptor) -> Result<ToolOutcome> {
        std::fs::write(&descriptor.path, &descriptor.contents).map_err(|source| {
            ProgramError::WriteDescriptor {
                path: descriptor.path.clone(),
                source,
            }
        })?;
        info!(kind = self.kind, descriptor = %descriptor.path.display(), "wrote descriptor");
        run_tool(&self.tool, &descriptor.path, self.timeout)
    }
}

/// The bitstream path as text, if it names an existing file the descriptor
/// can spell exactly.
fn check_bitstream(bitstream: &Path) -> Result<&str> {
    let reason = if bitstream.as_os_str().is_empty() {
        "path is empty"
    } else if !bitstream.exists() {
        "file does not exist"
    } else if !bitstream.is_file() {
        "not a regular file"
    } else if let Some(text) = bitstream.to_str() {
        return Ok(text);
    } else {
        "path is not valid UTF-8"
    };
    Err(ProgramError::InvalidPath {
        path: bitstream.to_path_buf(),
        reason,
    })
}

/// Build the adapter a programmer configuration selects.
pub fn adapter_for(config: &ProgrammerConfig) -> Result<TemplateProgrammer> {
    match config {
        ProgrammerConfig::LatticeXcf(identity) => TemplateProgrammer::lattice_xcf(identity),
        ProgrammerConfig::Custom(custom) => TemplateProgrammer::custom(custom),
    }
}

/// The adapter of `platform`, boxed behind the [`Programmer`] trait.
pub fn programmer_for(platform: &PlatformDescriptor) -> Result<Box<dyn Programmer>> {
    let config = platform
        .programmer()
        .ok_or_else(|| ProgramError::NoProgrammer {
            platform: platform.name().to_string(),
        })?;
    Ok(Box::new(adapter_for(config)?))
}
