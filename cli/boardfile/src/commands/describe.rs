//! `boardfile describe`: human-readable or TOML dump of a platform.

use anyhow::{bail, Result};
use boardfile_platform::parse::platform_to_toml;
use boardfile_platform::{ClockCheck, ConnectorSlot, PlatformDescriptor, ProgrammerConfig};

/// Print `platform` in the requested format.
pub fn run(platform: &PlatformDescriptor, format: &str) -> Result<()> {
    match format {
        "text" => print!("{}", render_text(platform)),
        "toml" => print!("{}", platform_to_toml(platform)?),
        other => bail!("unknown format '{other}' (expected text or toml)"),
    }
    Ok(())
}

fn render_text(platform: &PlatformDescriptor) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Platform: {} ===\n", platform.name()));
    out.push_str(&format!("Device: {}\n", platform.device_id()));
    out.push('\n');

    out.push_str("--- Signals ---\n");
    for signal in platform.signals() {
        let freq = signal
            .frequency_hz
            .map(|hz| format!(" @ {:.3} MHz", hz as f64 / 1e6))
            .unwrap_or_default();
        for (sub, binding) in signal.bindings() {
            let label = match sub {
                Some(sub) => format!("{}/{}", signal.name, sub),
                None => signal.name.to_string(),
            };
            let pins = if binding.is_populated() {
                binding.pins.to_string()
            } else {
                "(unpopulated)".to_string()
            };
            out.push_str(&format!(
                "  {label:<24} {pins:<16} {}{freq}\n",
                binding.io_standard
            ));
        }
    }
    out.push('\n');

    if platform.connectors().next().is_some() {
        out.push_str("--- Connectors ---\n");
        for connector in platform.connectors() {
            let usable = connector.usable_pins().count();
            out.push_str(&format!(
                "  {}: {} positions, {} usable\n",
                connector.name(),
                connector.len(),
                usable
            ));
            for (pos, slot) in connector.entries().iter().enumerate().skip(1) {
                if let ConnectorSlot::Pin(pin) = slot {
                    out.push_str(&format!("    {pos:>3}  {pin}\n"));
                }
            }
        }
        out.push('\n');
    }

    out.push_str("--- Default clock ---\n");
    match platform.default_clock() {
        Ok(clock) => {
            out.push_str(&format!(
                "  {} period {} ns ({:.3} MHz)",
                clock.signal,
                clock.period_ns,
                clock.frequency_mhz()
            ));
            match platform.check_clock_period() {
                Ok(ClockCheck::Consistent { .. }) => out.push_str(", matches documented frequency\n"),
                Ok(ClockCheck::Undocumented) => out.push_str(", frequency undocumented\n"),
                Err(e) => out.push_str(&format!(", {e}\n")),
            }
        }
        Err(_) => out.push_str("  (none)\n"),
    }
    out.push('\n');

    out.push_str("--- Programmer ---\n");
    match platform.programmer() {
        Some(ProgrammerConfig::LatticeXcf(id)) => {
            out.push_str(&format!("  Kind:    lattice-xcf ({} {}, IDCode {})\n", id.family, id.device, id.idcode));
            out.push_str(&format!("  Cable:   {} {} \"{}\"\n", id.cable, id.port, id.usb_id));
        }
        Some(ProgrammerConfig::Custom(custom)) => {
            out.push_str(&format!("  Kind:    custom (.{} descriptor)\n", custom.extension.trim_start_matches('.')));
        }
        None => out.push_str("  (none)\n"),
    }
    if let Some(config) = platform.programmer() {
        let tool = config.tool();
        out.push_str(&format!("  Tool:    {} {}\n", tool.program, tool.args.join(" ")));
        out.push_str(&format!("  Timeout: {} s\n", config.timeout_secs()));
    }
    out
}
