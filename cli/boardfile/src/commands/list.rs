//! `boardfile list`: built-in and project platforms.

use std::path::Path;

use anyhow::Result;
use boardfile_platform::boards::builtin_platforms;
use boardfile_platform::parse::discover_platforms;

/// List built-in platforms and the definitions under `platforms/`.
pub fn run(project_dir: &Path) -> Result<()> {
    println!("Built-in platforms:");
    println!();
    for (name, description) in builtin_platforms() {
        println!("  {name:<25} {description}");
    }

    let project = discover_platforms(project_dir)?;
    if !project.is_empty() {
        println!();
        println!("Project platforms:");
        println!();
        for (name, path) in &project {
            println!("  {name:<25} {}", path.display());
        }
    }
    println!();
    println!("Use 'boardfile -p <name> describe' for details.");
    Ok(())
}
