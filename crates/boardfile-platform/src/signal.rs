//! Signal and subsignal model.
//!
//! A [`Signal`] is identified by a [`SignalName`] (name plus index) and is
//! either a single [`Binding`] or a group of named [`Subsignal`]s, each with a
//! binding of its own. A binding is an ordered [`PinBinding`] plus the
//! [`IoStandard`] the pins are driven with.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Name and index of a logical signal (e.g. `user_led:3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalName {
    pub name: String,
    pub index: u32,
}

impl SignalName {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    /// Toolchain port name for this signal, or for one of its subsignals.
    ///
    /// `user_led:3` becomes `user_led_3`, subsignal `cs_n` of `spiflash:0`
    /// becomes `spiflash_0_cs_n`.
    pub fn port_name(&self, subsignal: Option<&str>) -> String {
        match subsignal {
            Some(sub) => format!("{}_{}_{}", self.name, self.index, sub),
            None => format!("{}_{}", self.name, self.index),
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.index)
    }
}

/// Ordered list of package pins a signal is wired to.
///
/// The textual form is whitespace separated (`"W2 V2 Y2 W1"`). An empty
/// binding marks a signal that exists on the schematic but is not populated
/// on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PinBinding(Vec<String>);

impl PinBinding {
    pub fn new(pins: Vec<String>) -> Self {
        Self(pins)
    }

    /// Parse a whitespace separated pin list.
    pub fn parse(pins: &str) -> Self {
        Self(pins.split_whitespace().map(str::to_string).collect())
    }

    pub fn pins(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub(crate) fn pins_mut(&mut self) -> &mut [String] {
        &mut self.0
    }
}

impl From<&str> for PinBinding {
    fn from(pins: &str) -> Self {
        Self::parse(pins)
    }
}

impl From<String> for PinBinding {
    fn from(pins: String) -> Self {
        Self::parse(&pins)
    }
}

impl From<PinBinding> for String {
    fn from(binding: PinBinding) -> Self {
        binding.0.join(" ")
    }
}

impl fmt::Display for PinBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// Electrical standard of an I/O binding.
///
/// Tags the toolchain does not know about here are kept verbatim in
/// [`IoStandard::Other`] and passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IoStandard {
    Lvcmos33,
    Lvcmos25,
    Lvcmos18,
    Lvcmos15,
    Lvcmos12,
    Lvttl33,
    Lvds,
    SubLvds,
    Lvpecl33,
    Sstl135I,
    Sstl15I,
    Sstl18I,
    Hsul12,
    Other(String),
}

impl IoStandard {
    /// Toolchain tag, e.g. `LVCMOS33`.
    pub fn as_str(&self) -> &str {
        match self {
            IoStandard::Lvcmos33 => "LVCMOS33",
            IoStandard::Lvcmos25 => "LVCMOS25",
            IoStandard::Lvcmos18 => "LVCMOS18",
            IoStandard::Lvcmos15 => "LVCMOS15",
            IoStandard::Lvcmos12 => "LVCMOS12",
            IoStandard::Lvttl33 => "LVTTL33",
            IoStandard::Lvds => "LVDS",
            IoStandard::SubLvds => "SUBLVDS",
            IoStandard::Lvpecl33 => "LVPECL33",
            IoStandard::Sstl135I => "SSTL135_I",
            IoStandard::Sstl15I => "SSTL15_I",
            IoStandard::Sstl18I => "SSTL18_I",
            IoStandard::Hsul12 => "HSUL12",
            IoStandard::Other(tag) => tag,
        }
    }

    /// Bank supply voltage the standard requires, in millivolts.
    pub fn vccio_mv(&self) -> Option<u32> {
        match self {
            IoStandard::Lvcmos33 | IoStandard::Lvttl33 | IoStandard::Lvpecl33 => Some(3300),
            IoStandard::Lvcmos25 | IoStandard::Lvds | IoStandard::SubLvds => Some(2500),
            IoStandard::Lvcmos18 | IoStandard::Sstl18I => Some(1800),
            IoStandard::Lvcmos15 | IoStandard::Sstl15I => Some(1500),
            IoStandard::Sstl135I => Some(1350),
            IoStandard::Lvcmos12 | IoStandard::Hsul12 => Some(1200),
            IoStandard::Other(_) => None,
        }
    }

    /// Whether the standard drives a differential pair.
    pub fn is_differential(&self) -> bool {
        matches!(
            self,
            IoStandard::Lvds | IoStandard::SubLvds | IoStandard::Lvpecl33
        )
    }
}

impl FromStr for IoStandard {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "LVCMOS33" => IoStandard::Lvcmos33,
            "LVCMOS25" => IoStandard::Lvcmos25,
            "LVCMOS18" => IoStandard::Lvcmos18,
            "LVCMOS15" => IoStandard::Lvcmos15,
            "LVCMOS12" => IoStandard::Lvcmos12,
            "LVTTL33" => IoStandard::Lvttl33,
            "LVDS" => IoStandard::Lvds,
            "SUBLVDS" => IoStandard::SubLvds,
            "LVPECL33" => IoStandard::Lvpecl33,
            "SSTL135_I" => IoStandard::Sstl135I,
            "SSTL15_I" => IoStandard::Sstl15I,
            "SSTL18_I" => IoStandard::Sstl18I,
            "HSUL12" => IoStandard::Hsul12,
            other => IoStandard::Other(other.to_string()),
        })
    }
}

impl From<String> for IoStandard {
    fn from(tag: String) -> Self {
        match tag.parse() {
            Ok(standard) => standard,
            Err(never) => match never {},
        }
    }
}

impl From<IoStandard> for String {
    fn from(standard: IoStandard) -> Self {
        standard.as_str().to_string()
    }
}

impl fmt::Display for IoStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pins, electrical standard and extra toolchain attributes of one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub pins: PinBinding,
    pub io_standard: IoStandard,
    /// Free-form toolchain attributes such as `PULLMODE=UP`.
    pub misc: Vec<String>,
}

impl Binding {
    pub fn new(pins: impl Into<PinBinding>, io_standard: IoStandard) -> Self {
        Self {
            pins: pins.into(),
            io_standard,
            misc: Vec::new(),
        }
    }

    pub fn is_populated(&self) -> bool {
        !self.pins.is_empty()
    }
}

/// A named part of a compound signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsignal {
    pub name: String,
    pub binding: Binding,
}

impl Subsignal {
    pub fn new(name: impl Into<String>, pins: impl Into<PinBinding>, io_standard: IoStandard) -> Self {
        Self {
            name: name.into(),
            binding: Binding::new(pins, io_standard),
        }
    }

    pub fn with_misc(mut self, attr: impl Into<String>) -> Self {
        self.binding.misc.push(attr.into());
        self
    }
}

/// Either a single binding or a group of subsignals, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalBody {
    Single(Binding),
    Group(Vec<Subsignal>),
}

/// One logical signal of a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: SignalName,
    pub body: SignalBody,
    /// Documented frequency for clock inputs.
    pub frequency_hz: Option<u64>,
}

impl Signal {
    /// A signal with one binding.
    pub fn single(
        name: impl Into<String>,
        index: u32,
        pins: impl Into<PinBinding>,
        io_standard: IoStandard,
    ) -> Self {
        Self {
            name: SignalName::new(name, index),
            body: SignalBody::Single(Binding::new(pins, io_standard)),
            frequency_hz: None,
        }
    }

    /// A compound signal made of named subsignals.
    pub fn group(name: impl Into<String>, index: u32, subsignals: Vec<Subsignal>) -> Self {
        Self {
            name: SignalName::new(name, index),
            body: SignalBody::Group(subsignals),
            frequency_hz: None,
        }
    }

    pub fn with_frequency(mut self, frequency_hz: u64) -> Self {
        self.frequency_hz = Some(frequency_hz);
        self
    }

    /// Attach a toolchain attribute to the signal. On a group it applies to
    /// every subsignal; use [`Subsignal::with_misc`] for just one.
    pub fn with_misc(mut self, attr: impl Into<String>) -> Self {
        let attr = attr.into();
        match &mut self.body {
            SignalBody::Single(binding) => binding.misc.push(attr),
            SignalBody::Group(subs) => {
                for sub in subs {
                    sub.binding.misc.push(attr.clone());
                }
            }
        }
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.body, SignalBody::Group(_))
    }

    /// All bindings of the signal with their subsignal name, in declaration order.
    pub fn bindings(&self) -> Vec<(Option<&str>, &Binding)> {
        match &self.body {
            SignalBody::Single(binding) => vec![(None, binding)],
            SignalBody::Group(subs) => subs
                .iter()
                .map(|s| (Some(s.name.as_str()), &s.binding))
                .collect(),
        }
    }

    pub(crate) fn bindings_mut(&mut self) -> Vec<(Option<String>, &mut Binding)> {
        match &mut self.body {
            SignalBody::Single(binding) => vec![(None, binding)],
            SignalBody::Group(subs) => subs
                .iter_mut()
                .map(|s| (Some(s.name.clone()), &mut s.binding))
                .collect(),
        }
    }

    /// Resolve the binding for this signal or one of its subsignals.
    pub fn binding(&self, subsignal: Option<&str>) -> Result<&Binding> {
        match (&self.body, subsignal) {
            (SignalBody::Single(binding), None) => Ok(binding),
            (SignalBody::Single(_), Some(sub)) => Err(PlatformError::UnknownSubsignal {
                name: self.name.name.clone(),
                index: self.name.index,
                subsignal: sub.to_string(),
            }),
            (SignalBody::Group(_), None) => Err(PlatformError::SubsignalRequired {
                name: self.name.name.clone(),
                index: self.name.index,
            }),
            (SignalBody::Group(subs), Some(sub)) => subs
                .iter()
                .find(|s| s.name == sub)
                .map(|s| &s.binding)
                .ok_or_else(|| PlatformError::UnknownSubsignal {
                    name: self.name.name.clone(),
                    index: self.name.index,
                    subsignal: sub.to_string(),
                }),
        }
    }

    /// Structural checks that do not depend on the rest of the platform.
    pub(crate) fn check(&self) -> Result<()> {
        let malformed = |detail: String| PlatformError::MalformedSignal {
            name: self.name.name.clone(),
            index: self.name.index,
            detail,
        };

        if self.name.name.is_empty() {
            return Err(malformed("signal name is empty".into()));
        }
        if let SignalBody::Group(subs) = &self.body {
            if subs.is_empty() {
                return Err(malformed("subsignal group has no members".into()));
            }
            let mut seen = HashSet::new();
            for sub in subs {
                if sub.name.is_empty() {
                    return Err(malformed("subsignal name is empty".into()));
                }
                if !seen.insert(sub.name.as_str()) {
                    return Err(malformed(format!(
                        "subsignal '{}' is declared more than once",
                        sub.name
                    )));
                }
            }
            if self.frequency_hz.is_some() {
                return Err(malformed(
                    "a documented frequency only applies to single signals".into(),
                ));
            }
        }
        if self.frequency_hz == Some(0) {
            return Err(malformed("documented frequency is 0 Hz".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiflash() -> Signal {
        Signal::group(
            "spiflash",
            0,
            vec![
                Subsignal::new("cs_n", "R2", IoStandard::Lvcmos33),
                Subsignal::new("clk", "U3", IoStandard::Lvcmos33),
            ],
        )
    }

    #[test]
    fn pin_binding_parses_whitespace() {
        let b = PinBinding::parse("W2 V2  Y2\tW1");
        assert_eq!(b.len(), 4);
        assert_eq!(b.pins()[2], "Y2");
        assert_eq!(b.to_string(), "W2 V2 Y2 W1");
        assert!(PinBinding::parse("").is_empty());
    }

    #[test]
    fn io_standard_keeps_unknown_tags() {
        let s: IoStandard = "LVCMOS25".parse().unwrap();
        assert_eq!(s, IoStandard::Lvcmos25);
        assert_eq!(s.vccio_mv(), Some(2500));

        let odd = IoStandard::from("MIPI".to_string());
        assert_eq!(odd, IoStandard::Other("MIPI".into()));
        assert_eq!(odd.as_str(), "MIPI");
        assert!(odd.vccio_mv().is_none());
        assert!(IoStandard::Lvds.is_differential());
    }

    #[test]
    fn port_names() {
        let n = SignalName::new("user_led", 3);
        assert_eq!(n.port_name(None), "user_led_3");
        assert_eq!(SignalName::new("spiflash", 0).port_name(Some("cs_n")), "spiflash_0_cs_n");
        assert_eq!(n.to_string(), "user_led:3");
    }

    #[test]
    fn resolve_single_and_group() {
        let led = Signal::single("user_led", 0, "B17", IoStandard::Lvcmos25);
        assert_eq!(led.binding(None).unwrap().pins.pins(), ["B17"]);
        assert!(matches!(
            led.binding(Some("x")),
            Err(PlatformError::UnknownSubsignal { .. })
        ));

        let flash = spiflash();
        assert_eq!(flash.binding(Some("clk")).unwrap().pins.pins(), ["U3"]);
        assert!(matches!(
            flash.binding(None),
            Err(PlatformError::SubsignalRequired { .. })
        ));
        assert!(matches!(
            flash.binding(Some("miso")),
            Err(PlatformError::UnknownSubsignal { .. })
        ));
    }

    #[test]
    fn check_rejects_duplicate_subsignals() {
        let sig = Signal::group(
            "serial",
            0,
            vec![
                Subsignal::new("tx", "P3", IoStandard::Lvcmos33),
                Subsignal::new("tx", "P2", IoStandard::Lvcmos33),
            ],
        );
        let err = sig.check().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn check_rejects_empty_group() {
        let sig = Signal::group("empty", 0, vec![]);
        assert!(matches!(
            sig.check(),
            Err(PlatformError::MalformedSignal { .. })
        ));
    }

    #[test]
    fn misc_attaches_to_single_binding() {
        let btn = Signal::single("user_btn", 0, "P4", IoStandard::Lvcmos33).with_misc("PULLMODE=UP");
        assert_eq!(btn.binding(None).unwrap().misc, ["PULLMODE=UP"]);
        assert_eq!(btn.bindings().len(), 1);
        assert_eq!(spiflash().bindings().len(), 2);
    }

    #[test]
    fn misc_on_group_applies_to_every_subsignal() {
        let flash = spiflash().with_misc("SLEWRATE=FAST");
        for (_, binding) in flash.bindings() {
            assert_eq!(binding.misc, ["SLEWRATE=FAST"]);
        }
    }

    #[test]
    fn check_rejects_zero_frequency() {
        let clk = Signal::single("clk12", 0, "A10", IoStandard::Lvcmos33).with_frequency(0);
        let err = clk.check().unwrap_err();
        assert!(matches!(err, PlatformError::MalformedSignal { .. }));
        assert!(err.to_string().contains("0 Hz"));
    }
}
