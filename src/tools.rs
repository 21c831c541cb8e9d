//! Lookup and invocation of the external optimizer/encoder binaries.

use crate::error::{CompressionError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Where external tools are looked up. `None` means the process `PATH`.
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    search_path: Option<OsString>,
}

impl Toolbox {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Restricts lookup to `search_path` (a `PATH`-style list).
    pub fn with_search_path<S: Into<OsString>>(search_path: S) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Returns the first of `names` that resolves to an executable, along
    /// with the name it was found under.
    pub fn locate<'a>(&self, names: &[&'a str]) -> Option<(&'a str, PathBuf)> {
        for &name in names {
            let found = match &self.search_path {
                Some(paths) => which::which_in(name, Some(paths), Path::new(".")),
                None => which::which(name),
            };
            match found {
                Ok(path) => {
                    debug!("Resolved {} to {:?}", name, path);
                    return Some((name, path));
                }
                Err(e) => debug!("{} not found: {}", name, e),
            }
        }
        None
    }
}

/// Runs `program` to completion and maps any failure onto `ToolFailed`.
pub fn run_tool<I, S>(tool: &str, program: &Path, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    debug!("Running {:?}", command);

    let output = command
        .output()
        .map_err(|e| CompressionError::tool_failed(tool, format!("failed to start: {}", e)))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let reason = match stderr.trim() {
        "" => output.status.to_string(),
        msg => format!("{}: {}", output.status, msg),
    };
    Err(CompressionError::tool_failed(tool, reason))
}

/// optipng level for a quality setting.
pub fn optipng_level(quality: u8) -> u8 {
    use crate::constants::{
        OPTIPNG_DEFAULT_LEVEL, OPTIPNG_HIGH_LEVEL, OPTIPNG_MAX_LEVEL, OPTIPNG_MEDIUM_LEVEL,
    };
    match quality {
        90.. => OPTIPNG_MAX_LEVEL,
        70..=89 => OPTIPNG_HIGH_LEVEL,
        50..=69 => OPTIPNG_MEDIUM_LEVEL,
        _ => OPTIPNG_DEFAULT_LEVEL,
    }
}
