//! `boardfile template`: starter `.platform.toml`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use boardfile_platform::parse::generate_template;

/// Print or write a starter definition named `name`.
pub fn run(name: &str, output: Option<&Path>) -> Result<()> {
    let toml_str = generate_template(name)?;
    match output {
        Some(path) => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            std::fs::write(path, toml_str).with_context(|| format!("writing {}", path.display()))?;
            println!("Created {}", path.display());
        }
        None => print!("{toml_str}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardfile_platform::parse::load_platform_toml;

    #[test]
    fn writes_loadable_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-board.platform.toml");
        run("my-board", Some(&path)).unwrap();
        assert_eq!(load_platform_toml(&path).unwrap().name(), "my-board");
        // Refuses to overwrite
        assert!(run("my-board", Some(&path)).is_err());
    }
}
