//! `boardfile validate`: report definition problems.

use anyhow::{bail, Result};
use boardfile_platform::parse::{validate_platform, ValidationIssue};
use boardfile_platform::PlatformDescriptor;

/// Validate `platform`. Fails only if an issue has `error` severity.
pub fn run(platform: &PlatformDescriptor) -> Result<()> {
    let issues = match validate_platform(platform) {
        Ok(()) => {
            let summary = platform.constraint_summary();
            println!(
                "Platform '{}' is valid ({} constrained bindings, {} unpopulated).",
                platform.name(),
                summary.emitted,
                summary.skipped
            );
            return Ok(());
        }
        Err(issues) => issues,
    };

    for issue in &issues {
        println!("  {}: {}", issue.severity, issue.message);
    }
    let errors = count_errors(&issues);
    if errors > 0 {
        bail!("platform '{}' has {errors} error(s)", platform.name());
    }
    println!(
        "Platform '{}' is valid with {} warning(s).",
        platform.name(),
        issues.len()
    );
    Ok(())
}

fn count_errors(issues: &[ValidationIssue]) -> usize {
    issues.iter().filter(|i| i.severity == "error").count()
}
