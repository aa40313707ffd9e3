//! Platform descriptor.
//!
//! Aggregates the signals and connectors of one board into an immutable
//! [`PlatformDescriptor`]. All structural checks run in
//! [`PlatformBuilder::build`], so a descriptor that exists is consistent:
//! every (name, index) is unique, every connector reference is resolved, and
//! the default clock names a declared signal.

use indexmap::IndexMap;
use tracing::debug;

use crate::connector::{ConnectorRef, ConnectorTable};
use crate::error::{PlatformError, Result};
use crate::programmer::ProgrammerConfig;
use crate::signal::{Binding, IoStandard, PinBinding, Signal, SignalName};

/// Relative tolerance of the default clock cross-check.
pub const CLOCK_PERIOD_TOLERANCE: f64 = 1e-3;

/// The clock timing constraints are generated for by default.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultClock {
    pub signal: SignalName,
    /// Period in nanoseconds.
    pub period_ns: f64,
}

impl DefaultClock {
    pub fn frequency_mhz(&self) -> f64 {
        1000.0 / self.period_ns
    }
}

/// Outcome of [`PlatformDescriptor::check_clock_period`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockCheck {
    /// Period and documented frequency agree.
    Consistent { expected_ns: f64 },
    /// The clock signal documents no frequency; nothing to compare.
    Undocumented,
}

/// One populated binding, as handed to a constraint emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint<'a> {
    pub signal: &'a SignalName,
    pub subsignal: Option<&'a str>,
    pub binding: &'a Binding,
}

impl<'a> Constraint<'a> {
    pub fn port_name(&self) -> String {
        self.signal.port_name(self.subsignal)
    }

    pub fn pins(&self) -> &'a PinBinding {
        &self.binding.pins
    }

    pub fn io_standard(&self) -> &'a IoStandard {
        &self.binding.io_standard
    }

    pub fn misc(&self) -> &'a [String] {
        &self.binding.misc
    }
}

/// How many bindings [`PlatformDescriptor::constraints`] yields and skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintSummary {
    pub emitted: usize,
    pub skipped: usize,
}

/// Immutable description of one board.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformDescriptor {
    name: String,
    device: String,
    signals: IndexMap<SignalName, Signal>,
    connectors: IndexMap<String, ConnectorTable>,
    default_clock: Option<DefaultClock>,
    programmer: Option<ProgrammerConfig>,
}

impl PlatformDescriptor {
    pub fn builder(name: impl Into<String>, device: impl Into<String>) -> PlatformBuilder {
        PlatformBuilder::new(name, device)
    }

    /// Platform name (e.g. `ecp5-evn`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device part number, handed to the toolchain unmodified.
    pub fn device_id(&self) -> &str {
        &self.device
    }

    /// Signals in declaration order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    pub fn signal(&self, name: &str, index: u32) -> Result<&Signal> {
        self.signals
            .get(&SignalName::new(name, index))
            .ok_or_else(|| PlatformError::UnknownSignal {
                name: name.to_string(),
                index,
            })
    }

    /// Resolve the binding of a signal or of one of its subsignals.
    pub fn resolve(&self, name: &str, index: u32, subsignal: Option<&str>) -> Result<&Binding> {
        self.signal(name, index)?.binding(subsignal)
    }

    /// Like [`resolve`](Self::resolve), but fails for unpopulated bindings.
    pub fn require_pins(
        &self,
        name: &str,
        index: u32,
        subsignal: Option<&str>,
    ) -> Result<&PinBinding> {
        let binding = self.resolve(name, index, subsignal)?;
        if !binding.is_populated() {
            let signal = match subsignal {
                Some(sub) => format!("{name}:{index}/{sub}"),
                None => format!("{name}:{index}"),
            };
            return Err(PlatformError::UnpopulatedSignal { signal });
        }
        Ok(&binding.pins)
    }

    /// Indices declared for a signal name, in declaration order.
    pub fn indices<'a>(&'a self, name: &'a str) -> impl Iterator<Item = u32> + 'a {
        self.signals
            .keys()
            .filter(move |n| n.name == name)
            .map(|n| n.index)
    }

    fn all_bindings(&self) -> impl Iterator<Item = Constraint<'_>> {
        self.signals.values().flat_map(|s| {
            s.bindings()
                .into_iter()
                .map(move |(subsignal, binding)| Constraint {
                    signal: &s.name,
                    subsignal,
                    binding,
                })
        })
    }

    /// Populated bindings in declaration order.
    pub fn constraints(&self) -> impl Iterator<Item = Constraint<'_>> {
        self.all_bindings().filter(|c| c.binding.is_populated())
    }

    /// Bindings excluded from [`constraints`](Self::constraints) because they
    /// have no pins.
    pub fn unpopulated(&self) -> impl Iterator<Item = Constraint<'_>> {
        self.all_bindings().filter(|c| !c.binding.is_populated())
    }

    pub fn constraint_summary(&self) -> ConstraintSummary {
        let (emitted, skipped) = self
            .all_bindings()
            .fold((0, 0), |(e, s), c| {
                if c.binding.is_populated() {
                    (e + 1, s)
                } else {
                    (e, s + 1)
                }
            });
        ConstraintSummary { emitted, skipped }
    }

    pub fn connectors(&self) -> impl Iterator<Item = &ConnectorTable> {
        self.connectors.values()
    }

    pub fn connector(&self, name: &str) -> Result<&ConnectorTable> {
        self.connectors
            .get(name)
            .ok_or_else(|| PlatformError::UnknownConnector {
                name: name.to_string(),
            })
    }

    /// Package pin at a connector position.
    pub fn connector_pin(&self, connector: &str, position: usize) -> Result<&str> {
        self.connector(connector)?.pin_at(position)
    }

    pub fn default_clock(&self) -> Result<&DefaultClock> {
        self.default_clock
            .as_ref()
            .ok_or_else(|| PlatformError::NoDefaultClock {
                device: self.device.clone(),
            })
    }

    /// Compare the default clock period with the clock's documented frequency.
    pub fn check_clock_period(&self) -> Result<ClockCheck> {
        let clock = self.default_clock()?;
        let signal = &self.signals[&clock.signal];
        let Some(frequency_hz) = signal.frequency_hz else {
            return Ok(ClockCheck::Undocumented);
        };
        let expected_ns = 1e9 / frequency_hz as f64;
        if ((clock.period_ns - expected_ns) / expected_ns).abs() > CLOCK_PERIOD_TOLERANCE {
            return Err(PlatformError::ClockPeriodMismatch {
                signal: clock.signal.to_string(),
                period_ns: clock.period_ns,
                frequency_hz,
                expected_ns,
            });
        }
        Ok(ClockCheck::Consistent { expected_ns })
    }

    pub fn programmer(&self) -> Option<&ProgrammerConfig> {
        self.programmer.as_ref()
    }

    /// A new descriptor with extra signals appended, e.g. a peripheral that
    /// needs jumpers fitted. The same checks as at construction apply.
    pub fn extend(&self, signals: impl IntoIterator<Item = Signal>) -> Result<Self> {
        let mut builder = self.to_builder();
        for signal in signals {
            builder = builder.signal(signal);
        }
        builder.build()
    }

    /// A builder pre-filled with this descriptor's contents.
    pub fn to_builder(&self) -> PlatformBuilder {
        PlatformBuilder {
            name: self.name.clone(),
            device: self.device.clone(),
            signals: self.signals.values().cloned().collect(),
            connectors: self.connectors.values().cloned().collect(),
            default_clock: self
                .default_clock
                .as_ref()
                .map(|c| (c.signal.clone(), c.period_ns)),
            programmer: self.programmer.clone(),
        }
    }
}

/// Collects platform data and validates it in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct PlatformBuilder {
    name: String,
    device: String,
    signals: Vec<Signal>,
    connectors: Vec<ConnectorTable>,
    default_clock: Option<(SignalName, f64)>,
    programmer: Option<ProgrammerConfig>,
}

impl PlatformBuilder {
    pub fn new(name: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
            signals: Vec::new(),
            connectors: Vec::new(),
            default_clock: None,
            programmer: None,
        }
    }

    pub fn signal(mut self, signal: Signal) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals.extend(signals);
        self
    }

    pub fn connector(mut self, connector: ConnectorTable) -> Self {
        self.connectors.push(connector);
        self
    }

    pub fn default_clock(mut self, name: impl Into<String>, index: u32, period_ns: f64) -> Self {
        self.default_clock = Some((SignalName::new(name, index), period_ns));
        self
    }

    pub fn programmer(mut self, programmer: ProgrammerConfig) -> Self {
        self.programmer = Some(programmer);
        self
    }

    pub fn build(self) -> Result<PlatformDescriptor> {
        let mut connectors = IndexMap::with_capacity(self.connectors.len());
        for connector in self.connectors {
            let name = connector.name().to_string();
            if connectors.contains_key(&name) {
                return Err(PlatformError::MalformedConnector {
                    connector: name,
                    detail: "connector is declared more than once".into(),
                });
            }
            connectors.insert(name, connector);
        }

        let mut signals = IndexMap::with_capacity(self.signals.len());
        for mut signal in self.signals {
            signal.check()?;
            resolve_connector_refs(&mut signal, &connectors)?;
            if signals.contains_key(&signal.name) {
                return Err(PlatformError::AmbiguousSignal {
                    name: signal.name.name,
                    index: signal.name.index,
                });
            }
            signals.insert(signal.name.clone(), signal);
        }

        let default_clock = match self.default_clock {
            None => None,
            Some((signal, period_ns)) => {
                let Some(clock) = signals.get(&signal) else {
                    return Err(PlatformError::InvalidDefaultClock {
                        detail: format!("signal {signal} is not declared"),
                    });
                };
                if clock.is_group() {
                    return Err(PlatformError::InvalidDefaultClock {
                        detail: format!("signal {signal} is a subsignal group"),
                    });
                }
                if !(period_ns.is_finite() && period_ns > 0.0) {
                    return Err(PlatformError::InvalidDefaultClock {
                        detail: format!("period {period_ns} ns is not a positive number"),
                    });
                }
                Some(DefaultClock { signal, period_ns })
            }
        };

        let descriptor = PlatformDescriptor {
            name: self.name,
            device: self.device,
            signals,
            connectors,
            default_clock,
            programmer: self.programmer,
        };
        debug!(
            platform = %descriptor.name,
            device = %descriptor.device,
            signals = descriptor.signals.len(),
            connectors = descriptor.connectors.len(),
            "built platform descriptor"
        );
        Ok(descriptor)
    }
}

/// Replace `<connector>:<position>` pins with the connector's package pin.
fn resolve_connector_refs(
    signal: &mut Signal,
    connectors: &IndexMap<String, ConnectorTable>,
) -> Result<()> {
    let signal_name = signal.name.clone();
    for (subsignal, binding) in signal.bindings_mut() {
        for pin in binding.pins.pins_mut() {
            let Some(parsed) = ConnectorRef::parse(pin) else {
                continue;
            };
            let bad_ref = |detail: String| PlatformError::BadConnectorReference {
                signal: match &subsignal {
                    Some(sub) => format!("{signal_name}/{sub}"),
                    None => signal_name.to_string(),
                },
                reference: pin.clone(),
                detail,
            };
            let r = parsed.map_err(&bad_ref)?;
            let resolved = connectors
                .get(r.connector)
                .ok_or_else(|| PlatformError::UnknownConnector {
                    name: r.connector.to_string(),
                })
                .and_then(|c| c.pin_at(r.position))
                .map(str::to_string)
                .map_err(|e| bad_ref(e.to_string()))?;
            *pin = resolved;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::signal::Subsignal;

    fn small() -> PlatformBuilder {
        PlatformDescriptor::builder("test-board", "LFE5U-25F-6BG256C")
            .signal(Signal::single("clk12", 0, "A10", IoStandard::Lvcmos33).with_frequency(12_000_000))
            .signal(Signal::single("clk50", 0, "", IoStandard::Lvcmos33))
            .signal(Signal::single("user_led", 0, "B17", IoStandard::Lvcmos25))
            .signal(Signal::single("user_led", 1, "A17", IoStandard::Lvcmos25))
            .signal(Signal::group(
                "spiflash4x",
                0,
                vec![
                    Subsignal::new("cs_n", "R2", IoStandard::Lvcmos33),
                    Subsignal::new("dq", "W2 V2 Y2 W1", IoStandard::Lvcmos33),
                ],
            ))
            .connector(ConnectorTable::parse("J1", &["NC", "GND", "D15", "+3V3", "B15"]).unwrap())
            .default_clock("clk12", 0, 83.333)
    }

    #[test]
    fn constraints_skip_unpopulated() {
        let p = small().build().unwrap();
        let ports: Vec<_> = p.constraints().map(|c| c.port_name()).collect();
        assert_eq!(
            ports,
            ["clk12_0", "user_led_0", "user_led_1", "spiflash4x_0_cs_n", "spiflash4x_0_dq"]
        );
        assert!(p.constraints().all(|c| !c.pins().is_empty()));
        let skipped: Vec<_> = p.unpopulated().map(|c| c.signal.to_string()).collect();
        assert_eq!(skipped, ["clk50:0"]);
        assert_eq!(
            p.constraint_summary(),
            ConstraintSummary {
                emitted: 5,
                skipped: 1
            }
        );
    }

    #[test]
    fn every_constraint_resolves() {
        let p = small().build().unwrap();
        for c in p.constraints() {
            let b = p.resolve(&c.signal.name, c.signal.index, c.subsignal).unwrap();
            assert_eq!(b, c.binding);
        }
    }

    #[test]
    fn duplicate_signal_rejected() {
        let err = small()
            .signal(Signal::single("user_led", 1, "C17", IoStandard::Lvcmos25))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            PlatformError::AmbiguousSignal { ref name, index: 1 } if name == "user_led"
        ));
        assert_eq!(err.class(), ErrorClass::Configuration);
    }

    #[test]
    fn duplicate_connector_rejected() {
        let err = small()
            .connector(ConnectorTable::parse("J1", &["NC", "A1"]).unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, PlatformError::MalformedConnector { .. }));
    }

    #[test]
    fn lookup_errors() {
        let p = small().build().unwrap();
        let err = p.resolve("user_led", 7, None).unwrap_err();
        assert!(matches!(err, PlatformError::UnknownSignal { index: 7, .. }));
        assert_eq!(err.class(), ErrorClass::Lookup);
        assert!(matches!(
            p.resolve("spiflash4x", 0, Some("miso")),
            Err(PlatformError::UnknownSubsignal { .. })
        ));
        assert_eq!(
            p.resolve("spiflash4x", 0, Some("dq")).unwrap().pins.len(),
            4
        );
    }

    #[test]
    fn unpopulated_signal_rejected_by_require_pins() {
        let p = small().build().unwrap();
        let err = p.require_pins("clk50", 0, None).unwrap_err();
        assert!(matches!(err, PlatformError::UnpopulatedSignal { .. }));
        assert_eq!(err.class(), ErrorClass::Unpopulated);
        assert_eq!(p.require_pins("clk12", 0, None).unwrap().pins(), ["A10"]);
    }

    #[test]
    fn connector_refs_are_resolved() {
        let p = small()
            .signal(Signal::single("ext", 0, "J1:2 J1:4", IoStandard::Lvcmos33))
            .build()
            .unwrap();
        assert_eq!(p.resolve("ext", 0, None).unwrap().pins.pins(), ["D15", "B15"]);
    }

    #[test]
    fn connector_ref_to_reserved_position_rejected() {
        let err = small()
            .signal(Signal::single("ext", 0, "J1:1", IoStandard::Lvcmos33))
            .build()
            .unwrap_err();
        assert!(matches!(err, PlatformError::BadConnectorReference { .. }));
        assert!(err.to_string().contains("reserved"));

        let err = small()
            .signal(Signal::single("ext", 0, "J9:1", IoStandard::Lvcmos33))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown connector"));
    }

    #[test]
    fn default_clock() {
        let p = small().build().unwrap();
        let clk = p.default_clock().unwrap();
        assert_eq!(clk.signal, SignalName::new("clk12", 0));
        assert!((clk.frequency_mhz() - 12.0).abs() < 0.001);
        assert!(matches!(
            p.check_clock_period().unwrap(),
            ClockCheck::Consistent { .. }
        ));
    }

    #[test]
    fn no_default_clock() {
        let p = PlatformDescriptor::builder("bare", "X").build().unwrap();
        assert!(matches!(
            p.default_clock(),
            Err(PlatformError::NoDefaultClock { .. })
        ));
    }

    #[test]
    fn default_clock_must_exist_and_be_positive() {
        let err = small().default_clock("clk99", 0, 10.0).build().unwrap_err();
        assert!(matches!(err, PlatformError::InvalidDefaultClock { .. }));
        let err = small().default_clock("clk12", 0, 0.0).build().unwrap_err();
        assert!(matches!(err, PlatformError::InvalidDefaultClock { .. }));
        let err = small().default_clock("spiflash4x", 0, 10.0).build().unwrap_err();
        assert!(matches!(err, PlatformError::InvalidDefaultClock { .. }));
    }

    #[test]
    fn clock_period_mismatch_detected() {
        let p = small().default_clock("clk12", 0, 20.0).build().unwrap();
        let err = p.check_clock_period().unwrap_err();
        assert!(matches!(err, PlatformError::ClockPeriodMismatch { .. }));
    }

    #[test]
    fn extend_appends_and_keeps_original() {
        let p = small().build().unwrap();
        let serial = Signal::group(
            "serial",
            0,
            vec![
                Subsignal::new("tx", "P3", IoStandard::Lvcmos33),
                Subsignal::new("rx", "P2", IoStandard::Lvcmos33),
            ],
        );
        let extended = p.extend([serial]).unwrap();
        assert!(extended.resolve("serial", 0, Some("tx")).is_ok());
        assert!(p.resolve("serial", 0, Some("tx")).is_err());
        assert_eq!(extended.signals().last().unwrap().name.name, "serial");

        let dup = Signal::single("user_led", 0, "C17", IoStandard::Lvcmos25);
        assert!(matches!(
            p.extend([dup]),
            Err(PlatformError::AmbiguousSignal { .. })
        ));
    }

    #[test]
    fn indices_in_order() {
        let p = small().build().unwrap();
        assert_eq!(p.indices("user_led").collect::<Vec<_>>(), [0, 1]);
        assert_eq!(p.indices("nothing").count(), 0);
    }
}
