//! Lattice Preference File (LPF) emitter.
//!
//! Consumes [`PlatformDescriptor::constraints`] and the default clock. Bus
//! bindings are split into one `port[i]` entry per pin.

use std::fmt::Write;

use tracing::{debug, warn};

use crate::platform::{Constraint, PlatformDescriptor};

/// Render the pin and clock constraints of `platform` as LPF.
pub fn emit_lpf(platform: &PlatformDescriptor) -> String {
    let mut out = String::new();
    out.push_str("BLOCK RESETPATHS;\n");
    out.push_str("BLOCK ASYNCPATHS;\n");

    for constraint in platform.constraints() {
        let port = constraint.port_name();
        let pins = constraint.pins();
        if pins.len() > 1 {
            for (i, pin) in pins.iter().enumerate() {
                push_pin(&mut out, &format!("{port}[{i}]"), pin, &constraint);
            }
        } else {
            for pin in pins.iter() {
                push_pin(&mut out, &port, pin, &constraint);
            }
        }
    }

    for skipped in platform.unpopulated() {
        debug!(port = %skipped.port_name(), "unpopulated, no LPF entry");
    }

    if let Ok(clock) = platform.default_clock() {
        let populated = platform
            .constraints()
            .any(|c| c.signal == &clock.signal && c.subsignal.is_none());
        if populated {
            let port = clock.signal.port_name(None);
            let _ = writeln!(
                out,
                "FREQUENCY PORT \"{port}\" {:.3} MHz;",
                clock.frequency_mhz()
            );
        } else {
            warn!(clock = %clock.signal, "default clock is unpopulated, no FREQUENCY constraint");
        }
    }

    out
}

fn push_pin(out: &mut String, port: &str, pin: &str, constraint: &Constraint<'_>) {
    let _ = writeln!(out, "LOCATE COMP \"{port}\" SITE \"{pin}\";");
    let _ = write!(
        out,
        "IOBUF PORT \"{port}\" IO_TYPE={}",
        constraint.io_standard()
    );
    for attr in constraint.misc() {
        out.push(' ');
        out.push_str(attr);
    }
    out.push_str(";\n");
}
