//! Batched CSV artifact writing and the run manifest.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::{ReportError, ReportGroup};

/// Whether artifacts are actually written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Write,
    /// Compute paths only.
    DryRun,
    /// CSV output switched off; paths are still computed.
    Disabled,
}

/// One artifact, written or planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub group: ReportGroup,
    pub path: PathBuf,
    pub rows: usize,
    /// 1-based chunk index when the group was split.
    pub part: Option<usize>,
    pub written: bool,
}

impl ManifestEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Every artifact of a run, in write order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn extend(&mut self, entries: impl IntoIterator<Item = ManifestEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn for_group(&self, group: ReportGroup) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter(move |e| e.group == group)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn written_count(&self) -> usize {
        self.entries.iter().filter(|e| e.written).count()
    }
}

/// Split `len` rows into consecutive ranges of at most `batch_size`.
///
/// A batch size of 0, or one at least `len`, gives a single range.
///
/// ```
/// use trackscan::report::writer::chunk_ranges;
///
/// assert_eq!(chunk_ranges(5, 2), vec![0..2, 2..4, 4..5]);
/// assert_eq!(chunk_ranges(5, 0), vec![0..5]);
/// assert!(chunk_ranges(0, 2).is_empty());
/// ```
pub fn chunk_ranges(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    if batch_size == 0 || len <= batch_size {
        return vec![0..len];
    }
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

/// chrono format of the run timestamp embedded in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

const SUMMARY_BASE: &str = "scan_summary";

/// Whether `stamp` is a run timestamp in [`TIMESTAMP_FORMAT`].
pub fn is_timestamp(stamp: &str) -> bool {
    chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok()
}

/// Whether a file name has the shape of an artifact this tool writes:
/// a report group or summary base, a run timestamp, an optional part
/// suffix and the matching extension.
///
/// ```
/// use trackscan::report::writer::is_artifact_name;
///
/// assert!(is_artifact_name("ok_2024-03-01_101500.csv"));
/// assert!(is_artifact_name("issues_2024-03-01_101500_part02.csv"));
/// assert!(is_artifact_name("scan_summary_2024-03-01_101500.html"));
/// assert!(!is_artifact_name("ok_notes.csv"));
/// ```
pub fn is_artifact_name(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    let bases: Vec<&str> = match ext {
        "csv" => ReportGroup::ALL.iter().map(|g| g.name()).collect(),
        "txt" | "html" => vec![SUMMARY_BASE],
        _ => return false,
    };
    bases.into_iter().any(|base| {
        stem.strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(is_stamp_with_part)
            .unwrap_or(false)
    })
}

fn is_stamp_with_part(rest: &str) -> bool {
    match rest.split_once("_part") {
        Some((stamp, part)) => !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) && is_timestamp(stamp),
        None => is_timestamp(rest),
    }
}

/// `<base>_<timestamp>[_partNN].<ext>`
pub fn artifact_name(base: &str, timestamp: &str, part: Option<usize>, ext: &str) -> String {
    match part {
        Some(n) => format!("{}_{}_part{:02}.{}", base, timestamp, n, ext),
        None => format!("{}_{}.{}", base, timestamp, ext),
    }
}

/// Writes report groups as one or more CSV artifacts.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    output_dir: PathBuf,
    timestamp: String,
    batch_size: usize,
    mode: WriteMode,
}

impl BatchWriter {
    pub fn new(output_dir: impl Into<PathBuf>, timestamp: impl Into<String>, batch_size: usize, mode: WriteMode) -> Self {
        Self {
            output_dir: output_dir.into(),
            timestamp: timestamp.into(),
            batch_size,
            mode,
        }
    }

    /// Path of a summary artifact (`scan_summary_<timestamp>.<ext>`).
    pub fn summary_path(&self, ext: &str) -> PathBuf {
        self.output_dir.join(artifact_name(SUMMARY_BASE, &self.timestamp, None, ext))
    }

    /// Write `rows` in order, one artifact per chunk. Empty groups produce
    /// nothing. Returns the artifacts written, or that would have been.
    pub fn write_group<T: Serialize>(&self, group: ReportGroup, rows: &[T]) -> Result<Vec<ManifestEntry>, ReportError> {
        let ranges = chunk_ranges(rows.len(), self.batch_size);
        let split = ranges.len() > 1;
        let mut entries = Vec::with_capacity(ranges.len());

        for (idx, range) in ranges.into_iter().enumerate() {
            let part = split.then_some(idx + 1);
            let path = self
                .output_dir
                .join(artifact_name(group.name(), &self.timestamp, part, "csv"));
            let chunk = &rows[range];

            let written = match self.mode {
                WriteMode::Write => {
                    write_csv(&path, chunk)?;
                    debug!("📊 {} saved (rows={}) → {}", group, chunk.len(), path.display());
                    true
                }
                WriteMode::DryRun => {
                    info!("[DRY-RUN] Would write {} (rows={})", path.display(), chunk.len());
                    false
                }
                WriteMode::Disabled => false,
            };

            entries.push(ManifestEntry {
                group,
                path,
                rows: chunk.len(),
                part,
                written,
            });
        }

        if self.mode == WriteMode::Write && !entries.is_empty() {
            info!(
                "📊 {} report saved (rows={}, files={})",
                group,
                rows.len(),
                entries.len()
            );
        }
        Ok(entries)
    }
}

/// Write serializable rows to a CSV file with a header line.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
