//! `boardfile constraints`: pin and clock constraints in LPF, text or JSON.

use std::path::Path;

use anyhow::{bail, Context, Result};
use boardfile_platform::{emit_lpf, PlatformDescriptor};
use serde::Serialize;

#[derive(Serialize)]
struct ConstraintsReport<'a> {
    platform: &'a str,
    device: &'a str,
    constraints: Vec<ConstraintEntry<'a>>,
    unpopulated: Vec<String>,
    default_clock: Option<ClockEntry>,
}

#[derive(Serialize)]
struct ConstraintEntry<'a> {
    port: String,
    signal: &'a str,
    index: u32,
    subsignal: Option<&'a str>,
    pins: &'a [String],
    io_standard: &'a str,
    misc: &'a [String],
}

#[derive(Serialize)]
struct ClockEntry {
    port: String,
    period_ns: f64,
    frequency_mhz: f64,
}

/// Emit the constraints of `platform` to `output` or stdout.
pub fn run(platform: &PlatformDescriptor, format: &str, output: Option<&Path>) -> Result<()> {
    let rendered = render(platform, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            let summary = platform.constraint_summary();
            println!(
                "Wrote {} ({} bindings, {} unpopulated skipped)",
                path.display(),
                summary.emitted,
                summary.skipped
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn render(platform: &PlatformDescriptor, format: &str) -> Result<String> {
    match format {
        "lpf" => Ok(emit_lpf(platform)),
        "text" => Ok(render_text(platform)),
        "json" => {
            let mut json = serde_json::to_string_pretty(&report(platform))?;
            json.push('\n');
            Ok(json)
        }
        other => bail!("unknown format '{other}' (expected lpf, text or json)"),
    }
}

fn report(platform: &PlatformDescriptor) -> ConstraintsReport<'_> {
    ConstraintsReport {
        platform: platform.name(),
        device: platform.device_id(),
        constraints: platform
            .constraints()
            .map(|c| ConstraintEntry {
                port: c.port_name(),
                signal: &c.signal.name,
                index: c.signal.index,
                subsignal: c.subsignal,
                pins: c.pins().pins(),
                io_standard: c.io_standard().as_str(),
                misc: c.misc(),
            })
            .collect(),
        unpopulated: platform.unpopulated().map(|c| c.port_name()).collect(),
        default_clock: platform.default_clock().ok().map(|clock| ClockEntry {
            port: clock.signal.port_name(None),
            period_ns: clock.period_ns,
            frequency_mhz: clock.frequency_mhz(),
        }),
    }
}

fn render_text(platform: &PlatformDescriptor) -> String {
    let mut out = String::new();
    for c in platform.constraints() {
        out.push_str(&format!(
            "{:<24} {:<16} {}",
            c.port_name(),
            c.pins().to_string(),
            c.io_standard()
        ));
        for attr in c.misc() {
            out.push(' ');
            out.push_str(attr);
        }
        out.push('\n');
    }
    for c in platform.unpopulated() {
        out.push_str(&format!("{:<24} (unpopulated)\n", c.port_name()));
    }
    out
}
