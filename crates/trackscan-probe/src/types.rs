//! Probe outcome types.

use serde::Serialize;
use trackscan_core::{FileRecord, TrackInfo};

/// Reason recorded when a prober reports success but no usable tracks.
pub const NO_TRACK_DATA: &str = "no track data";

/// Result of probing one file: either a non-empty track list or a failure
/// reason, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeResult {
    Probed {
        record: FileRecord,
        tracks: Vec<TrackInfo>,
    },
    Failed {
        record: FileRecord,
        reason: String,
    },
}

impl ProbeResult {
    /// Build a success result. An empty track list becomes a failure.
    pub fn probed(record: FileRecord, tracks: Vec<TrackInfo>) -> Self {
        if tracks.is_empty() {
            ProbeResult::Failed {
                record,
                reason: NO_TRACK_DATA.to_string(),
            }
        } else {
            ProbeResult::Probed { record, tracks }
        }
    }

    /// Build a failure result. An empty reason is replaced by a generic one.
    pub fn failed(record: FileRecord, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            "unknown probe failure".to_string()
        } else {
            reason
        };
        ProbeResult::Failed { record, reason }
    }

    pub fn record(&self) -> &FileRecord {
        match self {
            ProbeResult::Probed { record, .. } | ProbeResult::Failed { record, .. } => record,
        }
    }

    pub fn tracks(&self) -> Option<&[TrackInfo]> {
        match self {
            ProbeResult::Probed { tracks, .. } => Some(tracks),
            ProbeResult::Failed { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ProbeResult::Probed { .. } => None,
            ProbeResult::Failed { reason, .. } => Some(reason),
        }
    }

    pub fn is_probed(&self) -> bool {
        matches!(self, ProbeResult::Probed { .. })
    }
}
