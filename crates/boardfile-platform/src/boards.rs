//! Built-in board definitions.

use crate::connector::ConnectorTable;
use crate::error::Result;
use crate::platform::PlatformDescriptor;
use crate::programmer::{IdCode, ProgrammerConfig, ToolCommand, XcfIdentity, DEFAULT_TIMEOUT_SECS};
use crate::signal::IoStandard::{Lvcmos25, Lvcmos33, Lvds};
use crate::signal::{Signal, Subsignal};

/// List all built-in platform names with a short description.
pub fn builtin_platforms() -> Vec<(&'static str, &'static str)> {
    vec![(
        "ecp5-evn",
        "Lattice ECP5-5G evaluation board (LFE5UM5G-85F, 12 MHz)",
    )]
}

/// Resolve a built-in platform name.
pub fn resolve_builtin(name: &str) -> Result<Option<PlatformDescriptor>> {
    match name {
        "ecp5-evn" => ecp5_evn().map(Some),
        _ => Ok(None),
    }
}

/// Lattice ECP5-5G Versa/evaluation board, LFE5UM5G-85F in the caBGA381 package.
pub fn ecp5_evn() -> Result<PlatformDescriptor> {
    let mut signals = vec![
        Signal::single("clk12", 0, "A10", Lvcmos33).with_frequency(12_000_000),
        Signal::single("clk200", 0, "Y19", Lvds).with_frequency(200_000_000),
        // 50 MHz oscillator is optional and must be soldered
        Signal::single("clk50", 0, "", Lvcmos33).with_frequency(50_000_000),
        Signal::single("clk50en", 0, "", Lvcmos33),
    ];

    let leds = ["B17", "A17", "C17", "B18", "A18", "B19", "A12", "A13"];
    for (i, pin) in (0..).zip(leds) {
        signals.push(Signal::single("user_led", i, pin, Lvcmos25));
    }

    let dips = [
        ("J1", Lvcmos33),
        ("H1", Lvcmos33),
        ("K1", Lvcmos33),
        ("E15", Lvcmos25),
        ("D16", Lvcmos25),
        ("B16", Lvcmos25),
        ("C16", Lvcmos25),
        ("A16", Lvcmos25),
    ];
    for (i, (pin, standard)) in (0..).zip(dips) {
        signals.push(Signal::single("user_dip_btn", i, pin, standard));
    }

    signals.push(Signal::single("user_btn", 0, "P4", Lvcmos33));

    signals.push(Signal::group(
        "spiflash",
        0,
        vec![
            Subsignal::new("cs_n", "R2", Lvcmos33),
            Subsignal::new("clk", "U3", Lvcmos33),
            Subsignal::new("mosi", "W2", Lvcmos33),
            Subsignal::new("miso", "V2", Lvcmos33),
        ],
    ));
    signals.push(Signal::group(
        "spiflash4x",
        0,
        vec![
            Subsignal::new("cs_n", "R2", Lvcmos33),
            Subsignal::new("clk", "U3", Lvcmos33),
            Subsignal::new("dq", "W2 V2 Y2 W1", Lvcmos33),
        ],
    ));

    PlatformDescriptor::builder("ecp5-evn", "LFE5UM5G-85F-8BG381C")
        .signals(signals)
        .connector(j39()?)
        .connector(j40()?)
        .default_clock("clk12", 0, 83.333)
        .programmer(ProgrammerConfig::LatticeXcf(XcfIdentity {
            family: "ECP5UM5G".into(),
            device: "LFE5UM5G-85F".into(),
            idcode: IdCode(0x8111_2043),
            cable: "USB2".into(),
            port: "FTUSB-0".into(),
            usb_id: "Lattice ECP5 Evaluation Board".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            tool: ToolCommand::pgrcmd(),
        }))
        .build()
}

/// FTDI serial port of the ECP5 evaluation board.
///
/// Only routed once R34, R35 and R21 are fitted, so it is not part of
/// [`ecp5_evn`]; add it with [`PlatformDescriptor::extend`].
pub fn ecp5_evn_serial() -> Vec<Signal> {
    vec![Signal::group(
        "serial",
        0,
        vec![
            Subsignal::new("tx", "P3", Lvcmos33),
            Subsignal::new("rx", "P2", Lvcmos33),
        ],
    )]
}

fn j39() -> Result<ConnectorTable> {
    ConnectorTable::parse(
        "J39",
        &[
            "NC",   // no pin 0
            "GND",  // 1
            "NC",   // 2
            "+2V5", // 3
            "D15", "B15", "C15", "B13", "B20", "D11", "E11", "B12", // 4-11
            "C12", "D12", "E12", "C13", "D13", "E13", "A14", "A9", // 12-19
            "B10",  // 20
            "+5V0", // 21, 5V in
            "GND", "+2V5", "GND", "+3V3", "GND", "+3V3", "GND", // 22-28
            "E7",   // 29
            "GND",  // 30
            "A11",  // 31
            "GND",  // 32
            "A19",  // 33
            "GND", "+3V3", "GND", "+3V3", "GND", "+3V3", "GND", // 34-40
        ],
    )
}

fn j40() -> Result<ConnectorTable> {
    ConnectorTable::parse(
        "J40",
        &[
            "NC",  // no pin 0
            "K2",  // 1
            "GND", // 2
            "A15", "F1", "H2", "G1", "J4", "J5", "J3", "K3", // 3-10
            "L4", "L5", "M4", "N5", "N4", "P5", "N3", "M3", // 11-18
            "GND", "+3V3", // 19-20
            "K5", "GND", "M5", "GND", "L3", "GND", // 21-26
            "N2", "M1", "L2", "GND", "L1", "N1", "C14", "GND", // 27-34
            "P1", "E14", "D14", // 35-37
            "NC",  // 38, CARDSEL#
            "K4",  // 39
            "GND", // 40
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::platform::ClockCheck;

    #[test]
    fn ecp5_evn_shape() {
        let p = ecp5_evn().unwrap();
        assert_eq!(p.device_id(), "LFE5UM5G-85F-8BG381C");
        assert_eq!(p.indices("user_led").count(), 8);
        assert_eq!(p.indices("user_dip_btn").count(), 8);
        assert_eq!(p.connector("J39").unwrap().len(), 40);
        assert_eq!(p.connector("J40").unwrap().len(), 40);
        assert_eq!(p.programmer().unwrap().kind(), "lattice-xcf");
    }

    #[test]
    fn clk12_constrained_clk50_skipped() {
        let p = ecp5_evn().unwrap();
        let names: Vec<_> = p.constraints().map(|c| c.signal.name.clone()).collect();
        assert!(names.iter().any(|n| n == "clk12"));
        assert!(!names.iter().any(|n| n == "clk50" || n == "clk50en"));
        let clk12 = p.constraints().find(|c| c.signal.name == "clk12").unwrap();
        assert_eq!(clk12.pins().pins(), ["A10"]);
        assert_eq!(p.constraint_summary().skipped, 2);
    }

    #[test]
    fn connector_positions() {
        let p = ecp5_evn().unwrap();
        assert_eq!(p.connector_pin("J39", 4).unwrap(), "D15");
        assert_eq!(p.connector_pin("J39", 33).unwrap(), "A19");
        assert_eq!(p.connector_pin("J40", 39).unwrap(), "K4");
        assert!(matches!(
            p.connector_pin("J39", 0),
            Err(PlatformError::PositionOutOfRange { .. })
        ));
        assert!(matches!(
            p.connector_pin("J39", 2),
            Err(PlatformError::ReservedPosition { .. })
        ));
        assert!(matches!(
            p.connector_pin("J40", 38),
            Err(PlatformError::ReservedPosition { .. })
        ));
        assert!(matches!(
            p.connector_pin("J41", 1),
            Err(PlatformError::UnknownConnector { .. })
        ));
    }

    #[test]
    fn default_clock_matches_12mhz() {
        let p = ecp5_evn().unwrap();
        assert!(matches!(
            p.check_clock_period().unwrap(),
            ClockCheck::Consistent { .. }
        ));
    }

    #[test]
    fn serial_extension() {
        let p = ecp5_evn().unwrap().extend(ecp5_evn_serial()).unwrap();
        assert_eq!(p.resolve("serial", 0, Some("rx")).unwrap().pins.pins(), ["P2"]);
    }

    #[test]
    fn resolve_builtins() {
        assert!(resolve_builtin("ecp5-evn").unwrap().is_some());
        assert!(resolve_builtin("nonexistent").unwrap().is_none());
        assert!(builtin_platforms().iter().any(|(n, _)| *n == "ecp5-evn"));
    }
}
