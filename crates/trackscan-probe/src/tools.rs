//! External tool detection.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use trackscan_core::{Error, Result};

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use trackscan_probe::check_tool;
///
/// let info = check_tool("mkvmerge", None);
/// if info.available {
///     println!("mkvmerge version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, config_path: Option<&Path>) -> ToolInfo {
    let Ok(path) = get_tool_path(name, config_path) else {
        return ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        };
    };

    match Command::new(&path).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.trim().to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: Some(path),
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: Some(path),
        },
    }
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
///
/// # Errors
///
/// Returns [`Error::Config`] if a configured path does not exist or the
/// tool is not on `PATH`.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::config(format!(
            "probe.tool_path does not exist: {}",
            path.display()
        )));
    }

    which::which(name)
        .map_err(|_| Error::config(format!("probe tool '{}' not found on PATH", name)))
}
