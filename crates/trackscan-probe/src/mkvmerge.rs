//! mkvmerge-based [`Prober`] implementation.
//!
//! Shells out to `mkvmerge -J <file>` and maps the JSON identification
//! output into [`TrackInfo`] entries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::runtime::RuntimeFlavor;
use trackscan_core::{Error, ProbeConfig, TrackInfo, TrackType};

use crate::command::{CommandError, ToolCommand};
use crate::prober::Prober;
use crate::tools::get_tool_path;

/// Longest stderr excerpt kept as a failure reason.
const MAX_REASON_CHARS: usize = 300;

/// A prober backed by the `mkvmerge` CLI.
#[derive(Debug, Clone)]
pub struct MkvmergeProber {
    /// Path to the mkvmerge binary.
    tool_path: PathBuf,
    timeout: Duration,
}

impl MkvmergeProber {
    /// Create a new prober using the given mkvmerge path.
    pub fn new(tool_path: PathBuf, timeout: Duration) -> Self {
        Self { tool_path, timeout }
    }

    /// Create a prober from the `[probe]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the tool cannot be located.
    pub fn from_config(config: &ProbeConfig) -> trackscan_core::Result<Self> {
        let path = get_tool_path(&config.tool, config.tool_path.as_deref())?;
        Ok(Self::new(path, config.timeout()))
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    fn tool_name(&self) -> String {
        self.tool_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "mkvmerge".to_string())
    }

    async fn probe_async(&self, path: &Path) -> trackscan_core::Result<Vec<TrackInfo>> {
        let tool = self.tool_name();
        let mut cmd = ToolCommand::new(self.tool_path.clone());
        cmd.arg("-J")
            .arg(path.to_string_lossy().as_ref())
            .timeout(self.timeout);

        let output = match cmd.execute().await {
            Ok(output) => output,
            Err(err) => return Err(Error::tool(&tool, command_failure_reason(&tool, err))),
        };

        if output.stdout.trim().is_empty() {
            return Err(Error::tool(&tool, format!("{} returned no output", tool)));
        }

        parse_identification(&output.stdout)
    }

    fn probe_on_own_runtime(&self, path: &Path) -> trackscan_core::Result<Vec<TrackInfo>> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::tool("mkvmerge", format!("failed to create tokio runtime: {e}")))?;
        rt.block_on(self.probe_async(path))
    }
}

impl Prober for MkvmergeProber {
    fn name(&self) -> &'static str {
        "mkvmerge"
    }

    fn probe(&self, path: &Path) -> trackscan_core::Result<Vec<TrackInfo>> {
        // The Prober trait is sync, but ToolCommand is async.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.probe_async(path)))
            }
            // block_in_place panics on a current-thread runtime.
            Ok(_) => std::thread::scope(|s| {
                s.spawn(|| self.probe_on_own_runtime(path))
                    .join()
                    .unwrap_or_else(|_| Err(Error::Internal("probe thread panicked".into())))
            }),
            Err(_) => self.probe_on_own_runtime(path),
        }
    }

    fn supports(&self, path: &Path) -> bool {
        path.extension().is_some()
    }
}

/// Map a failed invocation to a short reason string.
fn command_failure_reason(tool: &str, err: CommandError) -> String {
    match err {
        CommandError::Timeout(_) => "timeout".to_string(),
        CommandError::Failed {
            status,
            stdout,
            stderr,
        } => {
            // mkvmerge -J reports identification errors in its JSON output.
            let from_json = serde_json::from_str::<MkvIdentification>(&stdout)
                .ok()
                .map(|id| id.errors.join("; "))
                .filter(|s| !s.trim().is_empty());
            from_json
                .or_else(|| stderr_tail(&stderr))
                .unwrap_or_else(|| format!("{} exited with status {}", tool, status))
        }
        other => other.to_string(),
    }
}

/// Last non-empty stderr lines, joined and capped at 300 characters.
///
/// # Examples
///
/// ```
/// use trackscan_probe::mkvmerge::stderr_tail;
///
/// assert_eq!(stderr_tail("\nWarning\nError: bad file\n").as_deref(), Some("Warning | Error: bad file"));
/// assert_eq!(stderr_tail("  \n"), None);
/// ```
pub fn stderr_tail(stderr: &str) -> Option<String> {
    let joined = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    if joined.is_empty() {
        return None;
    }
    let count = joined.chars().count();
    if count <= MAX_REASON_CHARS {
        Some(joined)
    } else {
        Some(joined.chars().skip(count - MAX_REASON_CHARS).collect())
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MkvIdentification {
    #[serde(default)]
    container: Option<MkvContainer>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    tracks: Vec<MkvTrack>,
}

#[derive(Debug, Deserialize)]
struct MkvContainer {
    #[serde(default = "default_recognized")]
    recognized: bool,
}

fn default_recognized() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct MkvTrack {
    id: Option<u32>,
    #[serde(rename = "type")]
    track_type: Option<String>,
    codec: Option<String>,
    #[serde(default)]
    properties: MkvTrackProperties,
}

#[derive(Debug, Default, Deserialize)]
struct MkvTrackProperties {
    codec_id: Option<String>,
    language: Option<String>,
    language_ietf: Option<String>,
    #[serde(default)]
    default_track: bool,
    #[serde(default)]
    forced_track: bool,
    track_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse `mkvmerge -J` output into tracks, in container order.
///
/// Unknown track types are ignored. A non-empty `errors` array or an
/// unrecognized container is a failure.
pub fn parse_identification(json: &str) -> trackscan_core::Result<Vec<TrackInfo>> {
    let id: MkvIdentification =
        serde_json::from_str(json).map_err(|e| Error::probe(format!("parse error: {e}")))?;

    if !id.errors.is_empty() {
        return Err(Error::probe(id.errors.join("; ")));
    }
    if matches!(id.container, Some(MkvContainer { recognized: false })) {
        return Err(Error::probe("container not recognized"));
    }

    let tracks = id
        .tracks
        .into_iter()
        .filter_map(|t| {
            let track_type = TrackType::from_label(t.track_type.as_deref()?)?;
            let props = t.properties;
            let codec = t
                .codec
                .filter(|c| !c.trim().is_empty())
                .or(props.codec_id)
                .unwrap_or_default();
            let language = props
                .language
                .filter(|l| !l.trim().is_empty() && l != "und")
                .or(props.language_ietf)
                .unwrap_or_default();
            let mut track = TrackInfo::new(track_type, codec)
                .with_language(language)
                .with_default(props.default_track)
                .with_forced(props.forced_track);
            track.id = t.id;
            track.name = props.track_name;
            Some(track)
        })
        .collect();

    Ok(tracks)
}
