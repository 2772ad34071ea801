//! Report groups, tabular rows, and artifact writing.
//!
//! Every run builds a set of named [`ReportGroup`]s, hands them to the
//! [`BatchWriter`], and feeds the resulting [`Manifest`] to the text and
//! HTML summaries.

pub mod html;
pub mod summary;
pub mod writer;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use trackscan_core::{FileCategory, FileRecord, TrackType};
use trackscan_probe::ProbeResult;

use crate::scanner::classifier::{Bucket, ClassificationRow, RowFamily};

pub use summary::{ScanSummary, ScanTotals};
pub use writer::{BatchWriter, Manifest, ManifestEntry, WriteMode};

/// Errors from rendering or writing a report artifact.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render error: {0}")]
    Render(String),
}

impl From<fmt::Error> for ReportError {
    fn from(e: fmt::Error) -> Self {
        ReportError::Render(e.to_string())
    }
}

/// A named logical output of a scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportGroup {
    Ok,
    OkNonTargetCodec,
    Issues,
    IssuesNonTargetCodec,
    ExtSubOk,
    ExtSubOkNonTargetCodec,
    ExtSubIssues,
    ExtSubIssuesNonTargetCodec,
    Failures,
    Skipped,
    UnmatchedSubs,
}

impl ReportGroup {
    /// All groups, in report order.
    pub const ALL: [ReportGroup; 11] = [
        ReportGroup::Ok,
        ReportGroup::OkNonTargetCodec,
        ReportGroup::Issues,
        ReportGroup::IssuesNonTargetCodec,
        ReportGroup::ExtSubOk,
        ReportGroup::ExtSubOkNonTargetCodec,
        ReportGroup::ExtSubIssues,
        ReportGroup::ExtSubIssuesNonTargetCodec,
        ReportGroup::Failures,
        ReportGroup::Skipped,
        ReportGroup::UnmatchedSubs,
    ];

    /// Artifact base name.
    pub fn name(&self) -> &'static str {
        match self {
            ReportGroup::Ok => "ok",
            ReportGroup::OkNonTargetCodec => "ok_non_target_codec",
            ReportGroup::Issues => "issues",
            ReportGroup::IssuesNonTargetCodec => "issues_non_target_codec",
            ReportGroup::ExtSubOk => "ext_sub_ok",
            ReportGroup::ExtSubOkNonTargetCodec => "ext_sub_ok_non_target_codec",
            ReportGroup::ExtSubIssues => "ext_sub_issues",
            ReportGroup::ExtSubIssuesNonTargetCodec => "ext_sub_issues_non_target_codec",
            ReportGroup::Failures => "failures",
            ReportGroup::Skipped => "skipped",
            ReportGroup::UnmatchedSubs => "unmatched_subs",
        }
    }

    /// Group for a classified row.
    pub fn for_row(family: RowFamily, bucket: Bucket) -> Self {
        match (family, bucket) {
            (RowFamily::Plain, Bucket::Ok) => ReportGroup::Ok,
            (RowFamily::Plain, Bucket::OkNonTargetCodec) => ReportGroup::OkNonTargetCodec,
            (RowFamily::Plain, Bucket::Issues) => ReportGroup::Issues,
            (RowFamily::Plain, Bucket::IssuesNonTargetCodec) => ReportGroup::IssuesNonTargetCodec,
            (RowFamily::ExternalSubtitle, Bucket::Ok) => ReportGroup::ExtSubOk,
            (RowFamily::ExternalSubtitle, Bucket::OkNonTargetCodec) => ReportGroup::ExtSubOkNonTargetCodec,
            (RowFamily::ExternalSubtitle, Bucket::Issues) => ReportGroup::ExtSubIssues,
            (RowFamily::ExternalSubtitle, Bucket::IssuesNonTargetCodec) => {
                ReportGroup::ExtSubIssuesNonTargetCodec
            }
        }
    }

    pub fn is_ok_group(&self) -> bool {
        matches!(
            self,
            ReportGroup::Ok | ReportGroup::OkNonTargetCodec | ReportGroup::ExtSubOk | ReportGroup::ExtSubOkNonTargetCodec
        )
    }
}

impl fmt::Display for ReportGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CSV row for a classified video.
///
/// `container` is `container_video` for Matroska files, the ones a remux
/// step can act on, and `other_video` for everything else.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationCsvRow {
    pub path: String,
    pub container: FileCategory,
    pub video: usize,
    pub audio: usize,
    pub subtitle: usize,
    pub lang_vid: String,
    pub lang_aud: String,
    pub lang_sub: String,
    pub video_codec: String,
    pub non_target_codec: bool,
    pub category: String,
    pub violations: String,
    pub external_subtitles: String,
}

impl From<&ClassificationRow> for ClassificationCsvRow {
    fn from(row: &ClassificationRow) -> Self {
        Self {
            path: row.record.path.display().to_string(),
            container: row.record.category,
            video: row.counts.video,
            audio: row.counts.audio,
            subtitle: row.counts.subtitle,
            lang_vid: row.languages(TrackType::Video).join("|"),
            lang_aud: row.languages(TrackType::Audio).join("|"),
            lang_sub: row.languages(TrackType::Subtitle).join("|"),
            video_codec: row.video_codecs(),
            non_target_codec: row.non_target_codec,
            category: row.issue_category().unwrap_or_else(|| "ok".to_string()),
            violations: row.violations.iter().map(|v| v.tag()).collect::<Vec<_>>().join("|"),
            external_subtitles: row
                .external_subtitles
                .iter()
                .map(FileRecord::file_name)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

/// CSV row for a file that could not be probed.
#[derive(Debug, Clone, Serialize)]
pub struct FailureCsvRow {
    pub path: String,
    pub reason: String,
}

impl FailureCsvRow {
    pub fn from_result(result: &ProbeResult) -> Option<Self> {
        result.failure_reason().map(|reason| Self {
            path: result.record().path.display().to_string(),
            reason: reason.to_string(),
        })
    }
}

/// CSV row for a skipped file.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCsvRow {
    pub path: String,
    pub extension: String,
    pub reason: String,
}

impl From<&FileRecord> for SkippedCsvRow {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.display().to_string(),
            extension: record.extension().unwrap_or_default(),
            reason: record.skip_reason.clone().unwrap_or_default(),
        }
    }
}

/// CSV row for a subtitle file that matched no video.
#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedCsvRow {
    pub path: String,
    pub stem: String,
}

impl From<&FileRecord> for UnmatchedCsvRow {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.display().to_string(),
            stem: record.stem(),
        }
    }
}
