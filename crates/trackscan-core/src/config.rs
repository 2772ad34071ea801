//! Scan configuration types.
//!
//! Every component receives its settings from a [`ScanConfig`] at
//! construction; there are no module-level defaults beyond the
//! `default_*` functions below.

use crate::error::{Error, Result};
use crate::media::{FileCategory, TrackType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Directories to scan recursively.
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Compute everything but write no artifacts.
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum rows per artifact (0 = single artifact per group).
    #[serde(default)]
    pub batch_size: usize,

    /// Write the tabular CSV reports.
    #[serde(default = "default_true")]
    pub write_csv_file: bool,

    /// Explicit output directory. Takes precedence over `output_root`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub output_root: Option<PathBuf>,

    /// List hypothetical artifact paths in dry-run summaries.
    #[serde(default = "default_true")]
    pub dry_run_manifest: bool,

    /// Skip dot-files, dot-directories and `.directory` files.
    #[serde(default = "default_true")]
    pub exclude_hidden: bool,

    #[serde(default)]
    pub extensions: ExtensionConfig,

    #[serde(default)]
    pub policy: LanguagePolicy,

    /// Alternate policies keyed by section name (`series/<name>`,
    /// `movies/<name>`).
    #[serde(default)]
    pub policy_sections: BTreeMap<String, LanguagePolicy>,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub matching: MatchingConfig,
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            dry_run: false,
            batch_size: 0,
            write_csv_file: true,
            output_dir: None,
            output_root: None,
            dry_run_manifest: true,
            exclude_hidden: true,
            extensions: ExtensionConfig::default(),
            policy: LanguagePolicy::default(),
            policy_sections: BTreeMap::new(),
            probe: ProbeConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Parse a TOML document into a config. Does not validate.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Check the configuration before any file is touched.
    ///
    /// Returns the first problem found as [`Error::Config`].
    pub fn validate(&self) -> Result<()> {
        if self.probe.timeout_secs == 0 {
            return Err(Error::config("probe.timeout_secs must be greater than 0"));
        }
        if self.probe.tool.trim().is_empty() && self.probe.tool_path.is_none() {
            return Err(Error::config("probe.tool must not be empty"));
        }

        self.extensions.validate()?;
        self.policy.validate("policy")?;
        for (name, section) in &self.policy_sections {
            section.validate(&format!("policy_sections.{}", name))?;
        }

        for root in &self.roots {
            if !root.is_dir() {
                return Err(Error::config(format!(
                    "root does not exist or is not a directory: {}",
                    root.display()
                )));
            }
        }

        Ok(())
    }

    /// Resolve where artifacts go: `output_dir`, then `output_root`, then the
    /// first root, then the current directory.
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(|| self.output_root.clone())
            .or_else(|| self.roots.first().cloned())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Pick the language policy for a scan.
    ///
    /// A root containing a `series/<name>` or `movies/<name>` component whose
    /// `<name>` has an entry in `policy_sections` selects that section;
    /// otherwise the top-level `policy` applies.
    pub fn select_policy(&self) -> (Option<&str>, &LanguagePolicy) {
        for root in &self.roots {
            if let Some(section) = section_name(root) {
                let found = self
                    .policy_sections
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&section));
                if let Some((name, policy)) = found {
                    return (Some(name.as_str()), policy);
                }
            }
        }
        (None, &self.policy)
    }
}

/// Name of the path component that follows `series` or `movies`.
fn section_name(path: &Path) -> Option<String> {
    let mut components = path.components().filter_map(|c| match c {
        Component::Normal(s) => Some(s.to_string_lossy().to_ascii_lowercase()),
        _ => None,
    });
    while let Some(part) = components.next() {
        if part == "series" || part == "movies" {
            return components.next();
        }
    }
    None
}

/// Extension sets used to bucket walked files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_container_video")]
    pub container_video: Vec<String>,

    #[serde(default = "default_other_video")]
    pub other_video: Vec<String>,

    #[serde(default = "default_subtitle")]
    pub subtitle: Vec<String>,
}

fn default_container_video() -> Vec<String> {
    vec!["mkv".to_string()]
}

fn default_other_video() -> Vec<String> {
    [
        "mp4", "avi", "mov", "m4v", "ts", "m2ts", "webm", "wmv", "flv", "mpg", "mpeg",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_subtitle() -> Vec<String> {
    ["srt", "ass", "ssa", "sub", "idx", "vtt", "sup"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            container_video: default_container_video(),
            other_video: default_other_video(),
            subtitle: default_subtitle(),
        }
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn contains_ext(set: &[String], ext: &str) -> bool {
    set.iter().any(|e| normalize_ext(e) == ext)
}

impl ExtensionConfig {
    /// Bucket an extension (with or without a leading dot, any case).
    ///
    /// # Examples
    ///
    /// ```
    /// use trackscan_core::{ExtensionConfig, FileCategory};
    ///
    /// let exts = ExtensionConfig::default();
    /// assert_eq!(exts.categorize(".MKV"), FileCategory::ContainerVideo);
    /// assert_eq!(exts.categorize("mp4"), FileCategory::OtherVideo);
    /// assert_eq!(exts.categorize("srt"), FileCategory::Subtitle);
    /// assert_eq!(exts.categorize("nfo"), FileCategory::Skipped);
    /// ```
    pub fn categorize(&self, ext: &str) -> FileCategory {
        let ext = normalize_ext(ext);
        if ext.is_empty() {
            FileCategory::Skipped
        } else if contains_ext(&self.container_video, &ext) {
            FileCategory::ContainerVideo
        } else if contains_ext(&self.other_video, &ext) {
            FileCategory::OtherVideo
        } else if contains_ext(&self.subtitle, &ext) {
            FileCategory::Subtitle
        } else {
            FileCategory::Skipped
        }
    }

    pub fn is_subtitle(&self, ext: &str) -> bool {
        contains_ext(&self.subtitle, &normalize_ext(ext))
    }

    fn validate(&self) -> Result<()> {
        if self.container_video.iter().all(|e| normalize_ext(e).is_empty()) {
            return Err(Error::config("extensions.container_video must not be empty"));
        }
        if self.other_video.iter().all(|e| normalize_ext(e).is_empty()) {
            return Err(Error::config("extensions.other_video must not be empty"));
        }

        let sets = [
            ("container_video", &self.container_video),
            ("other_video", &self.other_video),
            ("subtitle", &self.subtitle),
        ];
        for (i, (name, set)) in sets.iter().enumerate() {
            for (other, other_set) in &sets[i + 1..] {
                let overlap = set
                    .iter()
                    .map(|e| normalize_ext(e))
                    .find(|ext| !ext.is_empty() && contains_ext(other_set, ext));
                if let Some(ext) = overlap {
                    return Err(Error::config(format!(
                        "extension '{}' appears in both extensions.{} and extensions.{}",
                        ext, name, other
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Allowed languages per track type plus the target video codec.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguagePolicy {
    /// Allowed video languages. Empty disables the video language and
    /// multiplicity checks; a missing video track is always flagged.
    #[serde(default = "default_languages")]
    pub lang_vid: Vec<String>,

    #[serde(default = "default_languages")]
    pub lang_aud: Vec<String>,

    #[serde(default = "default_languages")]
    pub lang_sub: Vec<String>,

    /// Case-insensitive marker the video codec must contain.
    #[serde(default = "default_target_codec")]
    pub target_codec: String,
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_target_codec() -> String {
    "hevc".to_string()
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        Self {
            lang_vid: default_languages(),
            lang_aud: default_languages(),
            lang_sub: default_languages(),
            target_codec: default_target_codec(),
        }
    }
}

impl LanguagePolicy {
    /// Allowed languages configured for a track type.
    pub fn allowed(&self, track_type: TrackType) -> &[String] {
        match track_type {
            TrackType::Video => &self.lang_vid,
            TrackType::Audio => &self.lang_aud,
            TrackType::Subtitle => &self.lang_sub,
        }
    }

    /// Whether checks are enabled for a track type.
    pub fn is_enabled(&self, track_type: TrackType) -> bool {
        self.allowed(track_type).iter().any(|l| !l.trim().is_empty())
    }

    /// Whether `language` satisfies the allowed list for `track_type`.
    ///
    /// Matching is a case-insensitive prefix check, so `en` admits `eng`.
    /// An absent language never matches an enabled list.
    ///
    /// # Examples
    ///
    /// ```
    /// use trackscan_core::{LanguagePolicy, TrackType};
    ///
    /// let mut policy = LanguagePolicy::default();
    /// assert!(policy.language_allowed(TrackType::Audio, Some("ENG")));
    /// assert!(!policy.language_allowed(TrackType::Audio, Some("jpn")));
    /// assert!(!policy.language_allowed(TrackType::Audio, None));
    ///
    /// policy.lang_aud = vec!["en".into()];
    /// assert!(policy.language_allowed(TrackType::Audio, Some("eng")));
    /// ```
    pub fn language_allowed(&self, track_type: TrackType, language: Option<&str>) -> bool {
        if !self.is_enabled(track_type) {
            return true;
        }
        let Some(language) = language else {
            return false;
        };
        let language = language.trim().to_ascii_lowercase();
        if language.is_empty() || language == "und" {
            return false;
        }
        self.allowed(track_type).iter().any(|allowed| {
            let allowed = allowed.trim().to_ascii_lowercase();
            !allowed.is_empty() && language.starts_with(&allowed)
        })
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.target_codec.trim().is_empty() {
            return Err(Error::config(format!(
                "{}.target_codec must not be empty",
                section
            )));
        }
        Ok(())
    }
}

/// External probing tool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Tool name, looked up on PATH when `tool_path` is unset.
    #[serde(default = "default_probe_tool")]
    pub tool: String,

    #[serde(default)]
    pub tool_path: Option<PathBuf>,

    /// Per-file timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

fn default_probe_tool() -> String {
    "mkvmerge".to_string()
}

fn default_probe_timeout() -> u64 {
    300
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tool: default_probe_tool(),
            tool_path: None,
            timeout_secs: default_probe_timeout(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where subtitle files may live relative to their video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScope {
    /// Same directory only.
    #[default]
    Directory,
    /// Anywhere under the same scan root.
    Tree,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub scope: MatchScope,
}
