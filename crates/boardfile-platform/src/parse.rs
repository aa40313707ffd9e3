//! TOML parsing, serialization, validation, and discovery for platform definitions.
//!
//! Platform definitions are stored as `.platform.toml` files in the `platforms/`
//! directory of a project. This module provides functions to load, validate,
//! serialize, and discover these files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connector::{ConnectorSlot, ConnectorTable};
use crate::error::{PlatformError, Result};
use crate::platform::{ClockCheck, PlatformDescriptor};
use crate::programmer::ProgrammerConfig;
use crate::signal::{Binding, IoStandard, PinBinding, Signal, SignalBody, SignalName, Subsignal};

/// File suffix of platform definitions.
pub const PLATFORM_SUFFIX: &str = ".platform.toml";

/// On-disk form of a platform definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformDef {
    pub name: String,
    /// Device part number (e.g. "LFE5UM5G-85F-8BG381C").
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_clock: Option<DefaultClockDef>,
    #[serde(default)]
    pub signals: Vec<SignalDef>,
    #[serde(default)]
    pub connectors: Vec<ConnectorDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programmer: Option<ProgrammerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultClockDef {
    pub name: String,
    #[serde(default)]
    pub index: u32,
    pub period_ns: f64,
}

/// A signal entry. Either `pins` + `io-standard`, or `subsignals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignalDef {
    pub name: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pins: Option<PinBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_standard: Option<IoStandard>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub misc: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsignals: Vec<SubsignalDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubsignalDef {
    pub name: String,
    pub pins: PinBinding,
    pub io_standard: IoStandard,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub misc: Vec<String>,
}

/// A connector entry; `pins[0]` is the placeholder for the missing pin 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorDef {
    pub name: String,
    pub pins: Vec<ConnectorSlot>,
}

impl SignalDef {
    fn into_signal(self) -> Result<Signal> {
        let malformed = |detail: &str| PlatformError::MalformedSignal {
            name: self.name.clone(),
            index: self.index,
            detail: detail.to_string(),
        };

        let body = if self.subsignals.is_empty() {
            let pins = self
                .pins
                .clone()
                .ok_or_else(|| malformed("pins is required (use \"\" for an unpopulated signal)"))?;
            let io_standard = self
                .io_standard
                .clone()
                .ok_or_else(|| malformed("io-standard is required"))?;
            SignalBody::Single(Binding {
                pins,
                io_standard,
                misc: self.misc.clone(),
            })
        } else {
            if self.pins.is_some() || self.io_standard.is_some() || !self.misc.is_empty() {
                return Err(malformed(
                    "a subsignal group cannot also carry pins, io-standard or misc",
                ));
            }
            SignalBody::Group(
                self.subsignals
                    .iter()
                    .map(|s| Subsignal {
                        name: s.name.clone(),
                        binding: Binding {
                            pins: s.pins.clone(),
                            io_standard: s.io_standard.clone(),
                            misc: s.misc.clone(),
                        },
                    })
                    .collect(),
            )
        };

        Ok(Signal {
            name: SignalName::new(self.name.clone(), self.index),
            body,
            frequency_hz: self.frequency_hz,
        })
    }

    fn from_signal(signal: &Signal) -> Self {
        let mut def = SignalDef {
            name: signal.name.name.clone(),
            index: signal.name.index,
            pins: None,
            io_standard: None,
            misc: Vec::new(),
            frequency_hz: signal.frequency_hz,
            subsignals: Vec::new(),
        };
        match &signal.body {
            SignalBody::Single(b) => {
                def.pins = Some(b.pins.clone());
                def.io_standard = Some(b.io_standard.clone());
                def.misc = b.misc.clone();
            }
            SignalBody::Group(subs) => {
                def.subsignals = subs
                    .iter()
                    .map(|s| SubsignalDef {
                        name: s.name.clone(),
                        pins: s.binding.pins.clone(),
                        io_standard: s.binding.io_standard.clone(),
                        misc: s.binding.misc.clone(),
                    })
                    .collect();
            }
        }
        def
    }
}

impl PlatformDef {
    /// Build and check the descriptor this definition describes.
    pub fn into_descriptor(self) -> Result<PlatformDescriptor> {
        let mut builder = PlatformDescriptor::builder(self.name, self.device);
        for connector in self.connectors {
            builder = builder.connector(ConnectorTable::new(connector.name, connector.pins)?);
        }
        for signal in self.signals {
            builder = builder.signal(signal.into_signal()?);
        }
        if let Some(clock) = self.default_clock {
            builder = builder.default_clock(clock.name, clock.index, clock.period_ns);
        }
        if let Some(programmer) = self.programmer {
            builder = builder.programmer(programmer);
        }
        builder.build()
    }

    /// Definition of an existing descriptor. Connector references have
    /// already been resolved to package pins at this point.
    pub fn from_descriptor(platform: &PlatformDescriptor) -> Self {
        PlatformDef {
            name: platform.name().to_string(),
            device: platform.device_id().to_string(),
            default_clock: platform.default_clock().ok().map(|c| DefaultClockDef {
                name: c.signal.name.clone(),
                index: c.signal.index,
                period_ns: c.period_ns,
            }),
            signals: platform.signals().map(SignalDef::from_signal).collect(),
            connectors: platform
                .connectors()
                .map(|c| ConnectorDef {
                    name: c.name().to_string(),
                    pins: c.entries().to_vec(),
                })
                .collect(),
            programmer: platform.programmer().cloned(),
        }
    }
}

/// A validation issue found in a platform definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Load a platform from a `.platform.toml` file.
pub fn load_platform_toml(path: &Path) -> Result<PlatformDescriptor> {
    if !path.exists() {
        return Err(PlatformError::NotFound {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), "loading platform definition");
    let content = std::fs::read_to_string(path)?;
    parse_platform_toml(&content)
}

/// Parse a platform from a TOML string.
pub fn parse_platform_toml(toml_str: &str) -> Result<PlatformDescriptor> {
    let def: PlatformDef = toml::from_str(toml_str)?;
    def.into_descriptor()
}

/// Serialize a platform to pretty TOML.
pub fn platform_to_toml(platform: &PlatformDescriptor) -> Result<String> {
    let toml_str = toml::to_string_pretty(&PlatformDef::from_descriptor(platform))?;
    Ok(toml_str)
}

/// Check a platform for problems that construction does not reject.
///
/// Returns `Ok(())` if no issue was found, or `Err(issues)` with a list of
/// problems. Callers decide whether warnings alone are fatal.
pub fn validate_platform(platform: &PlatformDescriptor) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    // 1. Device part number is present
    if platform.device_id().trim().is_empty() {
        issues.push(ValidationIssue {
            severity: "error",
            message: "device part number is empty".into(),
        });
    }

    // 2. Default clock exists and agrees with its documented frequency
    match platform.check_clock_period() {
        Ok(ClockCheck::Consistent { .. }) => {}
        Ok(ClockCheck::Undocumented) => issues.push(ValidationIssue {
            severity: "warning",
            message: "default clock documents no frequency; period cannot be cross-checked".into(),
        }),
        Err(PlatformError::NoDefaultClock { .. }) => issues.push(ValidationIssue {
            severity: "warning",
            message: "no default clock; timing constraints will not be generated".into(),
        }),
        Err(e) => issues.push(ValidationIssue {
            severity: "error",
            message: e.to_string(),
        }),
    }

    // 3. Default clock is wired
    if let Ok(clock) = platform.default_clock() {
        if platform
            .require_pins(&clock.signal.name, clock.signal.index, None)
            .is_err()
        {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("default clock {} is unpopulated", clock.signal),
            });
        }
    }

    // 4. No package pin is used twice within one signal
    for signal in platform.signals() {
        let mut seen: HashMap<&str, Option<&str>> = HashMap::new();
        for (sub, binding) in signal.bindings() {
            for pin in binding.pins.iter() {
                if let Some(prev) = seen.insert(pin, sub) {
                    issues.push(ValidationIssue {
                        severity: "error",
                        message: format!(
                            "signal {} uses pin {} more than once ({} and {})",
                            signal.name,
                            pin,
                            prev.unwrap_or("<self>"),
                            sub.unwrap_or("<self>")
                        ),
                    });
                }
            }
        }
    }

    // 5. Standards the toolchain may not recognise
    for c in platform.constraints() {
        if let IoStandard::Other(tag) = c.io_standard() {
            issues.push(ValidationIssue {
                severity: "warning",
                message: format!("{} uses unrecognised IO standard '{}'", c.port_name(), tag),
            });
        }
    }

    // 6. Connector tables do not repeat a package pin
    for connector in platform.connectors() {
        let mut seen = HashMap::new();
        for (pos, pin) in connector.usable_pins() {
            if let Some(prev) = seen.insert(pin, pos) {
                issues.push(ValidationIssue {
                    severity: "error",
                    message: format!(
                        "connector {} lists pin {} at positions {} and {}",
                        connector.name(),
                        pin,
                        prev,
                        pos
                    ),
                });
            }
        }
    }

    // 7. The programmer can be handed a bitstream
    if let Some(ProgrammerConfig::Custom(custom)) = platform.programmer() {
        if !custom.template.contains("{{bitstream_file}}") {
            issues.push(ValidationIssue {
                severity: "error",
                message: "custom programmer template never references {{bitstream_file}}".into(),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Generate a template `.platform.toml` for a new board.
///
/// Seeds from the ECP5 evaluation board with the given custom name.
pub fn generate_template(name: &str) -> Result<String> {
    let mut def = PlatformDef::from_descriptor(&crate::boards::ecp5_evn()?);
    def.name = name.into();
    let toml_str = toml::to_string_pretty(&def)?;
    Ok(toml_str)
}

/// Discover all `.platform.toml` files in a project's `platforms/` directory.
///
/// Returns a list of (platform_name, file_path) pairs.
pub fn discover_platforms(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let platforms_dir = project_dir.join("platforms");
    if !platforms_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut platforms = Vec::new();
    let entries = std::fs::read_dir(&platforms_dir)?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if let Some(name) = file_name.strip_suffix(PLATFORM_SUFFIX) {
                platforms.push((name.to_string(), path.clone()));
            }
        }
    }
    platforms.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(platforms)
}
