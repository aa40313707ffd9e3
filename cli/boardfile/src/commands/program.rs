//! `boardfile program`: render the programmer descriptor and run the tool.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use boardfile_platform::PlatformDescriptor;
use boardfile_program::{adapter_for, ProgramError, Programmer};

/// Program `bitstream` onto `platform`'s board.
///
/// `timeout_secs` overrides the timeout of the platform's programmer.
pub fn run(
    platform: &PlatformDescriptor,
    bitstream: &Path,
    dry_run: bool,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let Some(config) = platform.programmer() else {
        return Err(ProgramError::NoProgrammer {
            platform: platform.name().to_string(),
        }
        .into());
    };
    let mut adapter = adapter_for(config)?;
    if let Some(secs) = timeout_secs {
        adapter = adapter.with_timeout(Duration::from_secs(secs));
    }

    let descriptor = adapter
        .render(bitstream)
        .with_context(|| format!("preparing {} for {}", bitstream.display(), platform.name()))?;

    if dry_run {
        println!("# {} (not written)", descriptor.path.display());
        print!("{}", descriptor.contents);
        let tool = adapter.tool();
        println!(
            "# would run: {} {}",
            tool.program,
            boardfile_program::invoke::tool_args(tool, &descriptor.path).join(" ")
        );
        return Ok(());
    }

    let outcome = match adapter.invoke(&descriptor) {
        Ok(outcome) => outcome,
        Err(ProgramError::Timeout {
            program,
            after,
            stdout,
            stderr,
        }) => {
            print!("{stdout}");
            eprint!("{stderr}");
            bail!(
                "{program} did not finish within {}s and was killed; the device state is unknown",
                after.as_secs()
            );
        }
        Err(e) => return Err(e).context("running programmer"),
    };

    print!("{}", outcome.stdout);
    eprint!("{}", outcome.stderr);
    if !outcome.success() {
        bail!("{} exited with {}", adapter.tool().program, outcome.status);
    }
    println!("Programmed {} with {}", platform.name(), bitstream.display());
    Ok(())
}
