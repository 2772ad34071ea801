//! Media library scanner.
//!
//! This module runs the scan pipeline over the configured roots:
//! walk → probe → match external subtitles → classify → write reports →
//! summarize. Every stage produces new records from the previous stage's
//! output; nothing is mutated in place.

pub mod classifier;
pub mod matcher;
pub mod walker;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use trackscan_core::{FileRecord, LanguagePolicy, ScanConfig};
use trackscan_probe::{probe_record, ProbeResult, Prober};

use crate::report::html::write_html;
use crate::report::summary::{render_text, write_text_file};
use crate::report::writer::TIMESTAMP_FORMAT;
use crate::report::{
    BatchWriter, ClassificationCsvRow, FailureCsvRow, Manifest, ReportError, ReportGroup, ScanSummary,
    ScanTotals, SkippedCsvRow, UnmatchedCsvRow, WriteMode,
};

pub use classifier::{bucket, Bucket, ClassificationRow, Classifier, RowFamily, Violation};
pub use matcher::{ExternalSubtitle, ExternalSubtitleRow, MatchOutcome, SubtitleMatcher};
pub use walker::{TreeWalker, WalkResult};

/// Classified rows partitioned into report groups, plus the residual lists.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedRun {
    groups: BTreeMap<ReportGroup, Vec<ClassificationRow>>,
    pub failures: Vec<ProbeResult>,
    pub skipped: Vec<FileRecord>,
    pub unmatched: Vec<FileRecord>,
}

impl ClassifiedRun {
    /// File a row into the group chosen by its family and [`bucket`].
    pub fn insert(&mut self, row: ClassificationRow) {
        let group = ReportGroup::for_row(row.family, bucket(&row));
        self.groups.entry(group).or_default().push(row);
    }

    pub fn rows(&self, group: ReportGroup) -> &[ClassificationRow] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of rows destined for a group.
    pub fn count(&self, group: ReportGroup) -> usize {
        match group {
            ReportGroup::Failures => self.failures.len(),
            ReportGroup::Skipped => self.skipped.len(),
            ReportGroup::UnmatchedSubs => self.unmatched.len(),
            other => self.rows(other).len(),
        }
    }

    /// Every classified row with its group, in group order.
    pub fn classified(&self) -> impl Iterator<Item = (ReportGroup, &ClassificationRow)> {
        self.groups
            .iter()
            .flat_map(|(group, rows)| rows.iter().map(move |row| (*group, row)))
    }

    /// OK rows from both families, target and non-target codec.
    pub fn ok_rows(&self) -> Vec<ClassificationRow> {
        self.classified()
            .filter(|(group, _)| group.is_ok_group())
            .map(|(_, row)| row.clone())
            .collect()
    }

    fn sort(&mut self) {
        for rows in self.groups.values_mut() {
            rows.sort_by(|a, b| a.record.path.cmp(&b.record.path));
        }
        self.failures.sort_by(|a, b| a.record().path.cmp(&b.record().path));
        self.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        self.unmatched.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// What a scan hands back to its caller.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// OK rows from the plain and external-subtitle families.
    pub ok_rows: Vec<ClassificationRow>,
    pub manifest: Manifest,
    pub summary: ScanSummary,
    pub summary_text: String,
    pub text_summary_path: Option<PathBuf>,
    pub html_summary_path: Option<PathBuf>,
    /// Non-fatal problems, e.g. a failed HTML summary.
    pub warnings: Vec<String>,
}

/// Scanner running the full pipeline with an injected prober.
pub struct Scanner {
    config: ScanConfig,
    prober: Box<dyn Prober>,
    timestamp: Option<String>,
}

impl Scanner {
    /// Create a scanner. The config is expected to be validated.
    pub fn new(config: ScanConfig, prober: Box<dyn Prober>) -> Self {
        Self {
            config,
            prober,
            timestamp: None,
        }
    }

    /// Use a fixed run timestamp in artifact names instead of the local time.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the pipeline once.
    ///
    /// Only an unwritable output directory is an error; per-file problems
    /// become failure or skipped rows, and report problems become warnings.
    pub fn run(&self) -> Result<ScanOutcome> {
        let started = Instant::now();
        let config = &self.config;
        let roots = self.roots();

        info!("🎬 === Setup ===");
        let output_dir = config.resolve_output_dir();
        let timestamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(TIMESTAMP_FORMAT).to_string());
        let (policy_name, policy) = config.select_policy();
        info!(
            roots = roots.len(),
            output_dir = %output_dir.display(),
            dry_run = config.dry_run,
            policy = policy_name.unwrap_or("default"),
            prober = self.prober.name(),
            "scan configured"
        );
        if !config.dry_run {
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        }

        let walker = TreeWalker::new(config.extensions.clone(), config.exclude_hidden).exclude_output_dir(&output_dir);
        let walk = walker.walk(&roots);
        info!(
            "Found {} files ({} video, {} subtitle, {} other)",
            walk.total(),
            walk.video_count(),
            walk.subtitles.len(),
            walk.skipped.len()
        );

        info!("🧭 === Probing ===");
        let (probed, failures, unsupported) = self.probe_all(&walk);

        info!("🔗 === Matching external subtitles ===");
        let matcher = SubtitleMatcher::new(config.matching.scope, &roots);
        let matched = matcher.match_subtitles(probed, walk.subtitles.clone());
        info!(
            external = matched.external.len(),
            plain = matched.plain.len(),
            unmatched = matched.unmatched.len(),
            "subtitle matching complete"
        );

        info!("✅ === Classification ===");
        let run = classify(policy, matched, failures, walk.skipped.iter().cloned().chain(unsupported).collect());
        for group in ReportGroup::ALL {
            let n = run.count(group);
            if n > 0 {
                info!("  {:<34}{}", group.name(), n);
            }
        }

        info!("📊 === Reports ===");
        let mode = if config.dry_run {
            WriteMode::DryRun
        } else if !config.write_csv_file {
            WriteMode::Disabled
        } else {
            WriteMode::Write
        };
        let writer = BatchWriter::new(&output_dir, &timestamp, config.batch_size, mode);
        let manifest = write_groups(&writer, &run)
            .with_context(|| format!("Failed to write reports to {:?}", output_dir))?;

        let totals = ScanTotals {
            all_files: walk.total(),
            video_files: walk.video_count(),
            subtitle_files: walk.subtitles.len(),
            other_files: walk.skipped.len(),
            probed_ok: run.classified().count(),
            failures: run.failures.len(),
            skipped: run.skipped.len(),
            walk_errors: walk.errors,
        };
        let summary = ScanSummary::build(&run, totals, policy, policy_name, &timestamp, config.dry_run);
        let show_manifest = !config.dry_run || config.dry_run_manifest;
        let summary_text = render_text(&summary, &manifest, show_manifest);

        let mut warnings = Vec::new();
        let mut text_summary_path = None;
        let mut html_summary_path = None;
        if !config.dry_run {
            let text_path = writer.summary_path("txt");
            write_text_file(&text_path, &summary_text)
                .with_context(|| format!("Failed to write text summary: {:?}", text_path))?;
            info!("📝 Text summary saved → {}", text_path.display());
            text_summary_path = Some(text_path);

            match write_html(&writer.summary_path("html"), &summary, &manifest, show_manifest) {
                Ok(path) => {
                    info!("🌐 HTML summary saved → {}", path.display());
                    html_summary_path = Some(path);
                }
                Err(e) => {
                    error!("HTML summary failed: {}", e);
                    warnings.push(format!("HTML summary failed: {}", e));
                }
            }
        }

        if walk.errors > 0 {
            warnings.push(format!("{} entries could not be read during the walk", walk.errors));
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = summary.count(ReportGroup::Ok) + summary.count(ReportGroup::ExtSubOk),
            failures = run.failures.len(),
            "scan complete"
        );

        Ok(ScanOutcome {
            ok_rows: run.ok_rows(),
            manifest,
            summary,
            summary_text,
            text_summary_path,
            html_summary_path,
            warnings,
        })
    }

    /// Configured roots, or the current directory when none are set.
    fn roots(&self) -> Vec<PathBuf> {
        if self.config.roots.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.config.roots.clone()
        }
    }

    /// Probe every video once. Returns successes, failures, and files the
    /// prober does not support (as skipped records).
    fn probe_all(&self, walk: &WalkResult) -> (Vec<ProbeResult>, Vec<ProbeResult>, Vec<FileRecord>) {
        let videos: Vec<&FileRecord> = walk.container_video.iter().chain(&walk.other_video).collect();
        let total = videos.len();
        let mut probed = Vec::new();
        let mut failures = Vec::new();
        let mut unsupported = Vec::new();

        for (idx, record) in videos.into_iter().enumerate() {
            if !self.prober.supports(&record.path) {
                warn!("Prober {} does not support {}", self.prober.name(), record.path.display());
                let mut skipped = FileRecord::skipped(record.path.clone(), record.size);
                skipped.skip_reason = Some(format!("not supported by {}", self.prober.name()));
                unsupported.push(skipped);
                continue;
            }

            debug!("[{}/{}] probing {}", idx + 1, total, record.file_name());
            let result = probe_record(self.prober.as_ref(), record.clone());
            if result.is_probed() {
                probed.push(result);
            } else {
                failures.push(result);
            }
        }

        info!("Probed {} files ({} ok, {} failed)", total, probed.len(), failures.len());
        (probed, failures, unsupported)
    }
}

/// Classify matched rows and partition them into report groups.
pub fn classify(
    policy: &LanguagePolicy,
    matched: MatchOutcome,
    failures: Vec<ProbeResult>,
    skipped: Vec<FileRecord>,
) -> ClassifiedRun {
    let classifier = Classifier::new(policy);
    let mut run = ClassifiedRun {
        failures,
        skipped,
        unmatched: matched.unmatched,
        ..ClassifiedRun::default()
    };

    for result in &matched.plain {
        if let Some(row) = classifier.classify_plain(result) {
            run.insert(row);
        }
    }
    for row in &matched.external {
        run.insert(classifier.classify_external(row));
    }

    run.sort();
    run
}

/// Write every non-empty group, in report order.
fn write_groups(writer: &BatchWriter, run: &ClassifiedRun) -> std::result::Result<Manifest, ReportError> {
    let mut manifest = Manifest::default();
    for group in ReportGroup::ALL {
        let entries = match group {
            ReportGroup::Failures => {
                let rows: Vec<FailureCsvRow> = run.failures.iter().filter_map(FailureCsvRow::from_result).collect();
                writer.write_group(group, &rows)?
            }
            ReportGroup::Skipped => {
                let rows: Vec<SkippedCsvRow> = run.skipped.iter().map(SkippedCsvRow::from).collect();
                writer.write_group(group, &rows)?
            }
            ReportGroup::UnmatchedSubs => {
                let rows: Vec<UnmatchedCsvRow> = run.unmatched.iter().map(UnmatchedCsvRow::from).collect();
                writer.write_group(group, &rows)?
            }
            classified => {
                let rows: Vec<ClassificationCsvRow> =
                    run.rows(classified).iter().map(ClassificationCsvRow::from).collect();
                writer.write_group(group, &rows)?
            }
        };
        manifest.extend(entries);
    }
    Ok(manifest)
}

/// Probe a single file outside a scan.
pub fn probe_one(prober: &dyn Prober, path: &Path) -> ProbeResult {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let category = trackscan_core::ExtensionConfig::default().categorize(
        &path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    probe_record(prober, FileRecord::new(path, size, category))
}
