//! Media domain types shared across the scan pipeline.
//!
//! A [`FileRecord`] is produced once by the tree walker and never mutated;
//! [`TrackInfo`] entries are produced by a prober and owned by its result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of elementary stream inside a media container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
    Subtitle,
}

impl TrackType {
    /// All track types, in report column order.
    pub const ALL: [TrackType; 3] = [TrackType::Video, TrackType::Audio, TrackType::Subtitle];

    /// Long, human-facing name used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Video => "video",
            TrackType::Audio => "audio",
            TrackType::Subtitle => "subtitle",
        }
    }

    /// Short name used in report columns and issue categories
    /// (`vid`, `aud`, `sub`).
    pub fn short(&self) -> &'static str {
        match self {
            TrackType::Video => "vid",
            TrackType::Audio => "aud",
            TrackType::Subtitle => "sub",
        }
    }

    /// Map a prober's track type label to a [`TrackType`].
    ///
    /// Unknown labels (e.g. `buttons`) yield `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use trackscan_core::TrackType;
    ///
    /// assert_eq!(TrackType::from_label("subtitles"), Some(TrackType::Subtitle));
    /// assert_eq!(TrackType::from_label("Video"), Some(TrackType::Video));
    /// assert_eq!(TrackType::from_label("buttons"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "video" => Some(TrackType::Video),
            "audio" => Some(TrackType::Audio),
            "subtitles" | "subtitle" => Some(TrackType::Subtitle),
            _ => None,
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single track within a media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track id as reported by the prober, if any.
    pub id: Option<u32>,
    pub track_type: TrackType,
    /// Codec identifier, e.g. `HEVC/H.265/MPEG-H` or `V_MPEGH/ISO/HEVC`.
    pub codec: String,
    /// Language tag; `None` when absent or undetermined.
    pub language: Option<String>,
    /// Track title.
    pub name: Option<String>,
    pub default: bool,
    pub forced: bool,
}

impl TrackInfo {
    /// Build a track with only the type and codec set.
    pub fn new(track_type: TrackType, codec: impl Into<String>) -> Self {
        Self {
            id: None,
            track_type,
            codec: codec.into(),
            language: None,
            name: None,
            default: false,
            forced: false,
        }
    }

    /// Set the language tag. Empty strings and `und` are treated as absent.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = normalize_language(&language.into());
        self
    }

    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// Language for display, `und` when absent.
    pub fn language_or_und(&self) -> &str {
        self.language.as_deref().unwrap_or("und")
    }
}

/// Normalize a language tag: lowercase, trimmed, `und`/empty become `None`.
///
/// # Examples
///
/// ```
/// use trackscan_core::media::normalize_language;
///
/// assert_eq!(normalize_language(" ENG "), Some("eng".to_string()));
/// assert_eq!(normalize_language("und"), None);
/// assert_eq!(normalize_language(""), None);
/// ```
pub fn normalize_language(tag: &str) -> Option<String> {
    let tag = tag.trim().to_ascii_lowercase();
    if tag.is_empty() || tag == "und" {
        None
    } else {
        Some(tag)
    }
}

/// Category assigned to a file during the tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Matroska-family files, the container targeted for remux.
    ContainerVideo,
    /// Any other recognised video container.
    OtherVideo,
    /// Stand-alone subtitle file.
    Subtitle,
    /// Unsupported extension.
    Skipped,
}

impl FileCategory {
    pub fn is_video(&self) -> bool {
        matches!(self, FileCategory::ContainerVideo | FileCategory::OtherVideo)
    }
}

/// A regular file discovered under a scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub category: FileCategory,
    /// Why the file was skipped (carries the extension for skipped rows).
    pub skip_reason: Option<String>,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, size: u64, category: FileCategory) -> Self {
        Self {
            path: path.into(),
            size,
            category,
            skip_reason: None,
        }
    }

    /// Build a skipped record whose reason names the unsupported extension.
    pub fn skipped(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let reason = match extension_of(&path) {
            Some(ext) => format!("unsupported extension .{}", ext),
            None => "no extension".to_string(),
        };
        Self {
            path,
            size,
            category: FileCategory::Skipped,
            skip_reason: Some(reason),
        }
    }

    /// File name component, lossily converted.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its final extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.path)
    }
}

/// Lowercased extension of `path`, without the dot.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use trackscan_core::media::extension_of;
///
/// assert_eq!(extension_of(Path::new("/m/Movie.MKV")), Some("mkv".to_string()));
/// assert_eq!(extension_of(Path::new("/m/README")), None);
/// ```
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
