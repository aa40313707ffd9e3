//! `boardfile.toml` project configuration and platform resolution.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use boardfile_platform::parse::{discover_platforms, load_platform_toml, PLATFORM_SUFFIX};
use boardfile_platform::{boards, PlatformDescriptor};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name searched for from the working directory upward.
pub const MANIFEST_FILE: &str = "boardfile.toml";

/// Project configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardfileManifest {
    /// Platform used when `--platform` is not given.
    #[serde(default)]
    pub default_platform: Option<String>,
    #[serde(default)]
    pub program: ProgramSettings,
}

/// `[program]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProgramSettings {
    /// Overrides the timeout of the platform's programmer.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl BoardfileManifest {
    /// Search upward from `start_dir` for a `boardfile.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: BoardfileManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                debug!(path = %candidate.display(), "loaded manifest");
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }
}

/// Resolve a platform argument: a `.platform.toml` path, a definition under
/// the project's `platforms/` directory, or a built-in board.
pub fn resolve_platform(spec: &str, project_dir: &Path) -> Result<PlatformDescriptor> {
    let as_path = Path::new(spec);
    if spec.ends_with(PLATFORM_SUFFIX) || as_path.components().count() > 1 {
        return load_platform_toml(as_path).with_context(|| format!("loading {spec}"));
    }

    for (name, path) in discover_platforms(project_dir)? {
        if name == spec {
            return load_platform_toml(&path)
                .with_context(|| format!("loading {}", path.display()));
        }
    }

    match boards::resolve_builtin(spec)? {
        Some(platform) => Ok(platform),
        None => bail!("unknown platform: '{spec}'. Use 'boardfile list' to see available platforms."),
    }
}

/// The platform named on the command line, or the manifest's default.
pub fn select_platform(
    arg: Option<&str>,
    manifest: Option<&BoardfileManifest>,
    project_dir: &Path,
) -> Result<PlatformDescriptor> {
    let spec = match (arg, manifest.and_then(|m| m.default_platform.as_deref())) {
        (Some(spec), _) | (None, Some(spec)) => spec,
        (None, None) => bail!(
            "no platform given; pass --platform or set default-platform in {MANIFEST_FILE}"
        ),
    };
    resolve_platform(spec, project_dir)
}
