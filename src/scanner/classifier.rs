//! Track composition and codec classification.
//!
//! Classification is side-effect free: each probed video becomes one
//! [`ClassificationRow`] carrying every violated predicate, and [`bucket`]
//! maps a row to exactly one of four buckets.
//!
//! ## Predicates
//!
//! For each track type whose allowed-language list is non-empty:
//!
//! - **zero**: no track of that type
//! - **multiple**: more than one track of that type
//! - **language**: a track whose language is absent or not allowed
//!
//! An empty list disables all three predicates for that type, except that a
//! row without any video track is always flagged. Independently,
//! a row is *non-target-codec* when any video track lacks the target codec
//! marker, or when it has no video track at all.

use std::fmt;

use serde::Serialize;
use trackscan_core::{FileRecord, LanguagePolicy, TrackInfo, TrackType};
use trackscan_probe::ProbeResult;

use super::matcher::ExternalSubtitleRow;

/// A single violated policy predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Violation {
    ZeroCount(TrackType),
    MultipleCount(TrackType),
    LanguageMismatch(TrackType),
}

impl Violation {
    /// Report tag, e.g. `zero_vid`, `multi_aud`, `lang_sub`.
    pub fn tag(&self) -> String {
        match self {
            Violation::ZeroCount(t) => format!("zero_{}", t.short()),
            Violation::MultipleCount(t) => format!("multi_{}", t.short()),
            Violation::LanguageMismatch(t) => format!("lang_{}", t.short()),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ZeroCount(t) => write!(f, "no {} tracks", t),
            Violation::MultipleCount(t) => write!(f, "multiple {} tracks", t),
            Violation::LanguageMismatch(t) => write!(f, "{} language mismatch", t),
        }
    }
}

/// Per-type track counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackCounts {
    pub video: usize,
    pub audio: usize,
    pub subtitle: usize,
}

impl TrackCounts {
    pub fn from_tracks(tracks: &[TrackInfo]) -> Self {
        let mut counts = Self::default();
        for track in tracks {
            match track.track_type {
                TrackType::Video => counts.video += 1,
                TrackType::Audio => counts.audio += 1,
                TrackType::Subtitle => counts.subtitle += 1,
            }
        }
        counts
    }

    pub fn get(&self, track_type: TrackType) -> usize {
        match track_type {
            TrackType::Video => self.video,
            TrackType::Audio => self.audio,
            TrackType::Subtitle => self.subtitle,
        }
    }
}

/// Which report family a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowFamily {
    /// Classified from embedded tracks only.
    Plain,
    /// Classified with matched external subtitle files.
    ExternalSubtitle,
}

/// A probed video annotated with counts and violated predicates.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRow {
    pub record: FileRecord,
    pub family: RowFamily,
    /// Tracks the row was classified on (embedded plus external subtitles).
    pub tracks: Vec<TrackInfo>,
    pub external_subtitles: Vec<FileRecord>,
    pub counts: TrackCounts,
    /// Violations in a stable order: zero, multiple, language; video first.
    pub violations: Vec<Violation>,
    pub non_target_codec: bool,
}

impl ClassificationRow {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has(&self, violation: Violation) -> bool {
        self.violations.contains(&violation)
    }

    /// Primary issue category for reports, `None` for OK rows.
    ///
    /// A single violation yields its own tag, language-only violations yield
    /// `lang_mismatch`, anything else is `multi_issue`.
    pub fn issue_category(&self) -> Option<String> {
        match self.violations.as_slice() {
            [] => None,
            [Violation::LanguageMismatch(_)] => Some("lang_mismatch".to_string()),
            [single] => Some(single.tag()),
            many if many.iter().all(|v| matches!(v, Violation::LanguageMismatch(_))) => {
                Some("lang_mismatch".to_string())
            }
            _ => Some("multi_issue".to_string()),
        }
    }

    /// Distinct languages of one track type, in track order (`und` for absent).
    pub fn languages(&self, track_type: TrackType) -> Vec<String> {
        let mut langs: Vec<String> = Vec::new();
        for track in self.tracks.iter().filter(|t| t.track_type == track_type) {
            let lang = track.language_or_und().to_string();
            if !langs.contains(&lang) {
                langs.push(lang);
            }
        }
        langs
    }

    /// Video codec identifiers, `|`-joined.
    pub fn video_codecs(&self) -> String {
        self.tracks
            .iter()
            .filter(|t| t.track_type == TrackType::Video)
            .map(|t| t.codec.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Placement of a classified row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Ok,
    OkNonTargetCodec,
    Issues,
    IssuesNonTargetCodec,
}

/// Map a row to its bucket. Policy decides OK vs Issues; the codec flag
/// decides which sub-group.
pub fn bucket(row: &ClassificationRow) -> Bucket {
    match (row.is_ok(), row.non_target_codec) {
        (true, false) => Bucket::Ok,
        (true, true) => Bucket::OkNonTargetCodec,
        (false, false) => Bucket::Issues,
        (false, true) => Bucket::IssuesNonTargetCodec,
    }
}

/// Flags rows whose video codec is not the target codec.
#[derive(Debug, Clone)]
pub struct CodecClassifier {
    marker: String,
}

impl CodecClassifier {
    pub fn new(target_codec: &str) -> Self {
        Self {
            marker: target_codec.trim().to_ascii_lowercase(),
        }
    }

    /// True when there is no video track or any video codec lacks the marker.
    pub fn is_non_target(&self, tracks: &[TrackInfo]) -> bool {
        let mut videos = tracks.iter().filter(|t| t.track_type == TrackType::Video).peekable();
        if videos.peek().is_none() {
            return true;
        }
        videos.any(|t| !t.codec.to_ascii_lowercase().contains(&self.marker))
    }
}

/// Counts tracks and evaluates the language policy.
#[derive(Debug, Clone)]
pub struct PolicyClassifier {
    policy: LanguagePolicy,
}

impl PolicyClassifier {
    pub fn new(policy: LanguagePolicy) -> Self {
        Self { policy }
    }

    /// Counts and every violated predicate, in stable order.
    pub fn evaluate(&self, tracks: &[TrackInfo]) -> (TrackCounts, Vec<Violation>) {
        let counts = TrackCounts::from_tracks(tracks);
        let mut violations = Vec::new();

        for track_type in TrackType::ALL {
            let enabled = self.policy.is_enabled(track_type);
            match counts.get(track_type) {
                // A file without video is never acceptable.
                0 if enabled || track_type == TrackType::Video => violations.push(Violation::ZeroCount(track_type)),
                0 | 1 => {}
                _ if enabled => violations.push(Violation::MultipleCount(track_type)),
                _ => {}
            }
        }

        for track_type in TrackType::ALL {
            let mismatch = tracks
                .iter()
                .filter(|t| t.track_type == track_type)
                .any(|t| !self.policy.language_allowed(track_type, t.language.as_deref()));
            if mismatch {
                violations.push(Violation::LanguageMismatch(track_type));
            }
        }

        (counts, violations)
    }
}

/// Policy and codec classification combined.
#[derive(Debug, Clone)]
pub struct Classifier {
    policy: PolicyClassifier,
    codec: CodecClassifier,
}

impl Classifier {
    pub fn new(policy: &LanguagePolicy) -> Self {
        Self {
            codec: CodecClassifier::new(&policy.target_codec),
            policy: PolicyClassifier::new(policy.clone()),
        }
    }

    /// Classify a plain probe result. Failures yield `None`.
    pub fn classify_plain(&self, result: &ProbeResult) -> Option<ClassificationRow> {
        let tracks = result.tracks()?.to_vec();
        Some(self.build(result.record().clone(), RowFamily::Plain, tracks, Vec::new()))
    }

    /// Classify a video together with its external subtitle files.
    pub fn classify_external(&self, row: &ExternalSubtitleRow) -> ClassificationRow {
        let externals = row.subtitles.iter().map(|s| s.record.clone()).collect();
        self.build(
            row.video.record().clone(),
            RowFamily::ExternalSubtitle,
            row.combined_tracks(),
            externals,
        )
    }

    fn build(
        &self,
        record: FileRecord,
        family: RowFamily,
        tracks: Vec<TrackInfo>,
        external_subtitles: Vec<FileRecord>,
    ) -> ClassificationRow {
        let (counts, violations) = self.policy.evaluate(&tracks);
        let non_target_codec = self.codec.is_non_target(&tracks);
        ClassificationRow {
            record,
            family,
            tracks,
            external_subtitles,
            counts,
            violations,
            non_target_codec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackscan_core::FileCategory;

    fn track(t: TrackType, codec: &str, lang: &str) -> TrackInfo {
        TrackInfo::new(t, codec).with_language(lang)
    }

    fn result(tracks: Vec<TrackInfo>) -> ProbeResult {
        ProbeResult::probed(FileRecord::new("/m/a.mkv", 1, FileCategory::ContainerVideo), tracks)
    }

    fn classify(policy: &LanguagePolicy, tracks: Vec<TrackInfo>) -> ClassificationRow {
        Classifier::new(policy).classify_plain(&result(tracks)).unwrap()
    }

    fn clean_tracks() -> Vec<TrackInfo> {
        vec![
            track(TrackType::Video, "HEVC/H.265/MPEG-H", "eng"),
            track(TrackType::Audio, "AAC", "eng"),
            track(TrackType::Subtitle, "SubRip/SRT", "eng"),
        ]
    }

    #[test]
    fn conforming_row_is_ok() {
        let row = classify(&LanguagePolicy::default(), clean_tracks());
        assert!(row.is_ok());
        assert!(!row.non_target_codec);
        assert_eq!(bucket(&row), Bucket::Ok);
        assert_eq!(row.issue_category(), None);
        assert_eq!(row.counts, TrackCounts { video: 1, audio: 1, subtitle: 1 });
    }

    #[test]
    fn zero_video_always_issue() {
        let mut policy = LanguagePolicy::default();
        policy.lang_vid.clear();
        policy.lang_aud.clear();
        policy.lang_sub.clear();
        let row = classify(&policy, vec![track(TrackType::Audio, "AAC", "eng")]);
        assert_eq!(row.violations, vec![Violation::ZeroCount(TrackType::Video)]);
        assert!(row.has(Violation::ZeroCount(TrackType::Video)));
        assert!(row.non_target_codec);
        assert_eq!(bucket(&row), Bucket::IssuesNonTargetCodec);
        assert_eq!(row.issue_category().as_deref(), Some("zero_vid"));
    }

    #[test]
    fn two_english_audio_tracks_is_multiplicity_only() {
        let mut tracks = clean_tracks();
        tracks.push(track(TrackType::Audio, "AC-3", "eng"));
        let row = classify(&LanguagePolicy::default(), tracks);
        assert_eq!(row.violations, vec![Violation::MultipleCount(TrackType::Audio)]);
        assert!(!row.has(Violation::LanguageMismatch(TrackType::Audio)));
        assert_eq!(bucket(&row), Bucket::Issues);
        assert_eq!(row.issue_category().as_deref(), Some("multi_aud"));
    }

    #[test]
    fn disabled_subtitle_check_suppresses_zero_count() {
        let policy = LanguagePolicy {
            lang_sub: vec![],
            ..LanguagePolicy::default()
        };
        let row = classify(
            &policy,
            vec![
                track(TrackType::Video, "HEVC", "eng"),
                track(TrackType::Audio, "AAC", "eng"),
            ],
        );
        assert!(row.is_ok());
    }

    #[test]
    fn multiplicity_and_language_recorded_together() {
        let row = classify(
            &LanguagePolicy::default(),
            vec![
                track(TrackType::Video, "HEVC", "jpn"),
                track(TrackType::Audio, "AAC", "eng"),
                track(TrackType::Audio, "AAC", "eng"),
                track(TrackType::Subtitle, "SRT", "eng"),
            ],
        );
        assert_eq!(
            row.violations,
            vec![
                Violation::MultipleCount(TrackType::Audio),
                Violation::LanguageMismatch(TrackType::Video),
            ]
        );
        assert_eq!(row.issue_category().as_deref(), Some("multi_issue"));
    }

    #[test]
    fn missing_language_is_mismatch() {
        let mut tracks = clean_tracks();
        tracks[1] = TrackInfo::new(TrackType::Audio, "AAC");
        let row = classify(&LanguagePolicy::default(), tracks);
        assert_eq!(row.violations, vec![Violation::LanguageMismatch(TrackType::Audio)]);
        assert_eq!(row.issue_category().as_deref(), Some("lang_mismatch"));
        assert_eq!(row.languages(TrackType::Audio), vec!["und"]);
    }

    #[test]
    fn any_non_target_video_flags_codec() {
        let codec = CodecClassifier::new("HEVC");
        assert!(!codec.is_non_target(&[track(TrackType::Video, "hevc", "eng")]));
        assert!(codec.is_non_target(&[
            track(TrackType::Video, "HEVC", "eng"),
            track(TrackType::Video, "AVC/H.264", "eng"),
        ]));
        assert!(codec.is_non_target(&[track(TrackType::Audio, "AAC", "eng")]));
    }

    #[test]
    fn ok_non_target_codec_bucket() {
        let mut tracks = clean_tracks();
        tracks[0].codec = "AVC/H.264/MPEG-4p10".into();
        let row = classify(&LanguagePolicy::default(), tracks);
        assert!(row.is_ok());
        assert_eq!(bucket(&row), Bucket::OkNonTargetCodec);
        assert_eq!(row.video_codecs(), "AVC/H.264/MPEG-4p10");
    }

    #[test]
    fn failed_probe_not_classified() {
        let failed = ProbeResult::failed(FileRecord::new("/m/b.mkv", 1, FileCategory::ContainerVideo), "timeout");
        assert!(Classifier::new(&LanguagePolicy::default()).classify_plain(&failed).is_none());
    }

    #[test]
    fn violation_tags() {
        assert_eq!(Violation::ZeroCount(TrackType::Subtitle).tag(), "zero_sub");
        assert_eq!(Violation::MultipleCount(TrackType::Video).tag(), "multi_vid");
        assert_eq!(Violation::LanguageMismatch(TrackType::Audio).tag(), "lang_aud");
        assert_eq!(
            Violation::MultipleCount(TrackType::Audio).to_string(),
            "multiple audio tracks"
        );
    }
}
