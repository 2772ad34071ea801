//! The [`Prober`] trait defining the interface for track metadata probing.

use std::path::Path;

use trackscan_core::{Error, FileRecord, TrackInfo};

use crate::types::ProbeResult;

/// Reason recorded when a file disappears between the walk and the probe.
pub const FILE_MISSING: &str = "file missing during scan";

/// A media file prober capable of listing the tracks of a file.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe a media file and return its tracks in container order.
    ///
    /// Errors carry a short, human-readable reason in their message; see
    /// [`failure_reason`].
    fn probe(&self, path: &Path) -> trackscan_core::Result<Vec<TrackInfo>>;

    /// Check whether this prober supports the given file path.
    ///
    /// A return value of `true` does not guarantee that [`Prober::probe`]
    /// will succeed.
    fn supports(&self, path: &Path) -> bool;
}

/// Short failure reason for a probe error, without the error-kind prefix.
pub fn failure_reason(err: &Error) -> String {
    match err {
        Error::Tool { message, .. } => message.clone(),
        Error::Probe(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Probe one walked file, folding every failure into [`ProbeResult::Failed`].
///
/// Each file is probed exactly once; there is no retry.
pub fn probe_record(prober: &dyn Prober, record: FileRecord) -> ProbeResult {
    if !record.path.is_file() {
        tracing::error!(file = %record.file_name(), "❌ {}", FILE_MISSING);
        return ProbeResult::failed(record, FILE_MISSING);
    }

    match prober.probe(&record.path) {
        Ok(tracks) => {
            tracing::debug!(
                file = %record.file_name(),
                tracks = tracks.len(),
                prober = prober.name(),
                "probed"
            );
            let result = ProbeResult::probed(record, tracks);
            if let Some(reason) = result.failure_reason() {
                tracing::error!(file = %result.record().file_name(), "❌ {}", reason);
            }
            result
        }
        Err(err) => {
            let reason = failure_reason(&err);
            tracing::error!(file = %record.file_name(), "❌ {}", reason);
            ProbeResult::failed(record, reason)
        }
    }
}
