//! Run summary aggregation and the plain-text report.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use trackscan_core::{LanguagePolicy, TrackType};

use super::writer::Manifest;
use super::{ReportError, ReportGroup};
use crate::scanner::classifier::Violation;
use crate::scanner::ClassifiedRun;

/// File-level totals for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanTotals {
    pub all_files: usize,
    pub video_files: usize,
    pub subtitle_files: usize,
    pub other_files: usize,
    pub probed_ok: usize,
    pub failures: usize,
    pub skipped: usize,
    pub walk_errors: usize,
}

/// One line of the per-file table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLine {
    pub filename: String,
    pub group: ReportGroup,
    pub video: usize,
    pub audio: usize,
    pub subtitle: usize,
    pub lang_issues: String,
}

/// Everything the text and HTML summaries show.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub timestamp: String,
    pub dry_run: bool,
    pub policy_name: Option<String>,
    /// Allowed languages per type; an empty list means the check is off.
    pub allowed: BTreeMap<TrackType, Vec<String>>,
    pub target_codec: String,
    pub totals: ScanTotals,
    /// Row count for every group, including empty ones.
    pub group_counts: Vec<(ReportGroup, usize)>,
    /// Filename to multiplicity violations.
    pub multiplicity: Vec<(String, Vec<Violation>)>,
    /// Filenames with zero tracks of a type.
    pub zero_count: BTreeMap<TrackType, Vec<String>>,
    /// Filenames with a language mismatch for a type.
    pub lang_mismatch: BTreeMap<TrackType, Vec<String>>,
    pub unmatched_subs: Vec<String>,
    /// Filename and reason.
    pub failures: Vec<(String, String)>,
    pub files: Vec<FileLine>,
}

impl ScanSummary {
    /// Aggregate a classified run. Lists follow group order, then path order.
    pub fn build(
        run: &ClassifiedRun,
        totals: ScanTotals,
        policy: &LanguagePolicy,
        policy_name: Option<&str>,
        timestamp: &str,
        dry_run: bool,
    ) -> Self {
        let mut multiplicity = Vec::new();
        let mut zero_count: BTreeMap<TrackType, Vec<String>> = BTreeMap::new();
        let mut lang_mismatch: BTreeMap<TrackType, Vec<String>> = BTreeMap::new();
        let mut files = Vec::new();

        for (group, row) in run.classified() {
            let filename = row.record.file_name();

            let multi: Vec<Violation> = row
                .violations
                .iter()
                .copied()
                .filter(|v| matches!(v, Violation::MultipleCount(_)))
                .collect();
            if !multi.is_empty() {
                multiplicity.push((filename.clone(), multi));
            }

            let mut lang_issues = Vec::new();
            for violation in &row.violations {
                match violation {
                    Violation::ZeroCount(t) => zero_count.entry(*t).or_default().push(filename.clone()),
                    Violation::LanguageMismatch(t) => {
                        lang_mismatch.entry(*t).or_default().push(filename.clone());
                        lang_issues.push(format!("{}:{}", t.short(), row.languages(*t).join("|")));
                    }
                    Violation::MultipleCount(_) => {}
                }
            }

            files.push(FileLine {
                filename,
                group,
                video: row.counts.video,
                audio: row.counts.audio,
                subtitle: row.counts.subtitle,
                lang_issues: lang_issues.join(" "),
            });
        }

        let allowed = TrackType::ALL
            .iter()
            .map(|t| (*t, policy.allowed(*t).to_vec()))
            .collect();

        Self {
            timestamp: timestamp.to_string(),
            dry_run,
            policy_name: policy_name.map(str::to_string),
            allowed,
            target_codec: policy.target_codec.clone(),
            totals,
            group_counts: ReportGroup::ALL.iter().map(|g| (*g, run.count(*g))).collect(),
            multiplicity,
            zero_count,
            lang_mismatch,
            unmatched_subs: run.unmatched.iter().map(|r| r.file_name()).collect(),
            failures: run
                .failures
                .iter()
                .map(|f| {
                    (
                        f.record().file_name(),
                        f.failure_reason().unwrap_or_default().to_string(),
                    )
                })
                .collect(),
            files,
        }
    }

    pub fn count(&self, group: ReportGroup) -> usize {
        self.group_counts
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Allowed languages for display, `any` when the check is off.
    pub fn allowed_display(&self, track_type: TrackType) -> String {
        match self.allowed.get(&track_type) {
            Some(langs) if langs.iter().any(|l| !l.trim().is_empty()) => langs.join(", "),
            _ => "any".to_string(),
        }
    }
}

/// Render the plain-text summary.
///
/// When `show_manifest` is false the artifact section is replaced by a note.
pub fn render_text(summary: &ScanSummary, manifest: &Manifest, show_manifest: bool) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_text(&mut out, summary, manifest, show_manifest);
    out
}

fn write_text(out: &mut String, s: &ScanSummary, manifest: &Manifest, show_manifest: bool) -> std::fmt::Result {
    writeln!(out, "📊 Track scan summary ({})", s.timestamp)?;
    if s.dry_run {
        writeln!(out, "🧪 DRY RUN: no files were written")?;
    }
    writeln!(
        out,
        "Policy: {} | video [{}] | audio [{}] | subtitle [{}] | target codec {}",
        s.policy_name.as_deref().unwrap_or("default"),
        s.allowed_display(TrackType::Video),
        s.allowed_display(TrackType::Audio),
        s.allowed_display(TrackType::Subtitle),
        s.target_codec
    )?;

    writeln!(out, "\n📁 Totals")?;
    let t = &s.totals;
    for (label, n) in [
        ("All files", t.all_files),
        ("Video files", t.video_files),
        ("Subtitle files", t.subtitle_files),
        ("Other files", t.other_files),
        ("Probed OK", t.probed_ok),
        ("Failures", t.failures),
        ("Skipped", t.skipped),
    ] {
        writeln!(out, "  {:<16}{}", format!("{}:", label), n)?;
    }
    if t.walk_errors > 0 {
        writeln!(out, "  {:<16}{}", "Unreadable:", t.walk_errors)?;
    }

    writeln!(out, "\n📂 Report groups")?;
    for (group, n) in &s.group_counts {
        writeln!(out, "  {:<34}{}", group.name(), n)?;
    }

    writeln!(out, "\n🔁 Multiple tracks")?;
    if s.multiplicity.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (file, violations) in &s.multiplicity {
        let list: Vec<String> = violations.iter().map(ToString::to_string).collect();
        writeln!(out, "  {}: {}", file, list.join(", "))?;
    }

    writeln!(out, "\n🚫 Missing tracks")?;
    write_type_lists(out, &s.zero_count)?;

    writeln!(out, "\n🌐 Language mismatches")?;
    write_type_lists(out, &s.lang_mismatch)?;

    writeln!(out, "\n💬 Unmatched subtitles")?;
    if s.unmatched_subs.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for name in &s.unmatched_subs {
        writeln!(out, "  {}", name)?;
    }

    writeln!(out, "\n❌ Failures")?;
    if s.failures.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (name, reason) in &s.failures {
        writeln!(out, "  {}: {}", name, reason)?;
    }

    writeln!(out, "\n📝 Artifacts")?;
    if !show_manifest {
        writeln!(out, "  (artifact paths not listed in dry run)")?;
    } else if manifest.is_empty() {
        writeln!(out, "  (none)")?;
    } else {
        for entry in manifest.entries() {
            let state = if entry.written { "" } else { " [not written]" };
            writeln!(out, "  {} ({} rows){}", entry.path.display(), entry.rows, state)?;
        }
    }

    writeln!(out, "\n📋 Files")?;
    write_file_table(out, &s.files)?;
    Ok(())
}

fn write_type_lists(out: &mut String, lists: &BTreeMap<TrackType, Vec<String>>) -> std::fmt::Result {
    if lists.values().all(Vec::is_empty) {
        return writeln!(out, "  (none)");
    }
    for (track_type, names) in lists {
        writeln!(out, "  {} ({}):", track_type, names.len())?;
        for name in names {
            writeln!(out, "    {}", name)?;
        }
    }
    Ok(())
}

fn write_file_table(out: &mut String, files: &[FileLine]) -> std::fmt::Result {
    if files.is_empty() {
        return writeln!(out, "  (none)");
    }
    let width = files
        .iter()
        .map(|f| f.filename.chars().count())
        .max()
        .unwrap_or(0)
        .max("filename".len());
    writeln!(
        out,
        "  {:<width$}  {:>5}  {:>5}  {:>5}  lang_issues",
        "filename", "video", "audio", "sub"
    )?;
    for f in files {
        writeln!(
            out,
            "  {:<width$}  {:>5}  {:>5}  {:>5}  {}",
            f.filename, f.video, f.audio, f.subtitle, f.lang_issues
        )?;
    }
    Ok(())
}

/// Write the text summary to `path`.
pub fn write_text_file(path: &Path, content: &str) -> Result<(), ReportError> {
    std::fs::write(path, content).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::classifier::Classifier;
    use trackscan_core::{FileCategory, FileRecord, TrackInfo};
    use trackscan_probe::ProbeResult;

    fn probed(name: &str, tracks: Vec<TrackInfo>) -> ProbeResult {
        ProbeResult::probed(
            FileRecord::new(format!("/m/{name}"), 1, FileCategory::ContainerVideo),
            tracks,
        )
    }

    fn sample_run() -> ClassifiedRun {
        let policy = LanguagePolicy::default();
        let classifier = Classifier::new(&policy);
        let mut run = ClassifiedRun::default();

        let good = probed(
            "good.mkv",
            vec![
                TrackInfo::new(TrackType::Video, "HEVC").with_language("eng"),
                TrackInfo::new(TrackType::Audio, "AAC").with_language("eng"),
                TrackInfo::new(TrackType::Subtitle, "SRT").with_language("eng"),
            ],
        );
        let dual = probed(
            "dual.mkv",
            vec![
                TrackInfo::new(TrackType::Video, "AVC").with_language("eng"),
                TrackInfo::new(TrackType::Audio, "AAC").with_language("eng"),
                TrackInfo::new(TrackType::Audio, "AAC").with_language("jpn"),
            ],
        );
        for result in [good, dual] {
            if let Some(row) = classifier.classify_plain(&result) {
                run.insert(row);
            }
        }
        run.failures.push(ProbeResult::failed(
            FileRecord::new("/m/broken.mkv", 1, FileCategory::ContainerVideo),
            "timeout",
        ));
        run.unmatched.push(FileRecord::new("/m/orphan.srt", 1, FileCategory::Subtitle));
        run
    }

    #[test]
    fn aggregates_dual_accounting() {
        let run = sample_run();
        let summary = ScanSummary::build(&run, ScanTotals::default(), &LanguagePolicy::default(), None, "ts", false);

        assert_eq!(summary.count(ReportGroup::Ok), 1);
        assert_eq!(summary.count(ReportGroup::IssuesNonTargetCodec), 1);
        assert_eq!(
            summary.multiplicity,
            vec![("dual.mkv".to_string(), vec![Violation::MultipleCount(TrackType::Audio)])]
        );
        assert_eq!(summary.lang_mismatch[&TrackType::Audio], vec!["dual.mkv"]);
        assert_eq!(summary.zero_count[&TrackType::Subtitle], vec!["dual.mkv"]);
        assert_eq!(summary.unmatched_subs, vec!["orphan.srt"]);
        assert_eq!(summary.failures, vec![("broken.mkv".to_string(), "timeout".to_string())]);
        assert_eq!(summary.files.len(), 2);
    }

    #[test]
    fn text_sections_present() {
        let run = sample_run();
        let summary = ScanSummary::build(&run, ScanTotals::default(), &LanguagePolicy::default(), None, "ts", true);
        let text = render_text(&summary, &Manifest::default(), false);

        assert!(text.contains("DRY RUN"));
        assert!(text.contains("🔁 Multiple tracks"));
        assert!(text.contains("dual.mkv: multiple audio tracks"));
        assert!(text.contains("broken.mkv: timeout"));
        assert!(text.contains("orphan.srt"));
        assert!(text.contains("artifact paths not listed"));
        assert!(text.contains("lang_issues"));
        assert!(text.contains("aud:eng|jpn"));
    }

    #[test]
    fn disabled_type_shows_any() {
        let policy = LanguagePolicy {
            lang_sub: vec![],
            ..LanguagePolicy::default()
        };
        let summary = ScanSummary::build(&ClassifiedRun::default(), ScanTotals::default(), &policy, Some("anime"), "ts", false);
        assert_eq!(summary.allowed_display(TrackType::Subtitle), "any");
        assert_eq!(summary.allowed_display(TrackType::Audio), "eng");
        let text = render_text(&summary, &Manifest::default(), true);
        assert!(text.contains("Policy: anime"));
    }
}
