//! Pairing of stand-alone subtitle files with probed videos.
//!
//! A subtitle matches a video when its stem equals the video stem or starts
//! with `<video stem>.`, compared case-insensitively. The remainder of the
//! stem holds qualifiers such as a language code or `forced`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use trackscan_core::media::normalize_language;
use trackscan_core::{FileRecord, MatchScope, TrackInfo, TrackType};
use trackscan_probe::ProbeResult;

/// A subtitle file attached to a video, with qualifiers parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalSubtitle {
    pub record: FileRecord,
    pub language: Option<String>,
    pub forced: bool,
}

impl ExternalSubtitle {
    /// Build from a subtitle record and the stem of the video it matched.
    pub fn new(record: FileRecord, video_stem: &str) -> Self {
        let stem = record.stem().to_lowercase();
        let video_stem = video_stem.to_lowercase();
        let qualifiers = stem.strip_prefix(&video_stem).unwrap_or("");

        let mut language = None;
        let mut forced = false;
        for token in qualifiers.split('.').filter(|t| !t.is_empty()) {
            match token {
                "forced" => forced = true,
                "sdh" | "cc" | "hi" | "default" | "full" => {}
                t if language.is_none() && looks_like_language(t) => {
                    language = normalize_language(t);
                }
                _ => {}
            }
        }

        Self {
            record,
            language,
            forced,
        }
    }

    /// The file viewed as one subtitle track.
    pub fn as_track(&self) -> TrackInfo {
        let codec = self
            .record
            .extension()
            .map(|e| e.to_ascii_uppercase())
            .unwrap_or_default();
        let mut track = TrackInfo::new(TrackType::Subtitle, codec).with_forced(self.forced);
        track.language = self.language.clone();
        track.name = Some(self.record.file_name());
        track
    }
}

/// `en`, `eng`, `pt-br`, `zh-hans`.
fn looks_like_language(token: &str) -> bool {
    let mut parts = token.splitn(2, '-');
    let primary = parts.next().unwrap_or("");
    let primary_ok = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    let region_ok = parts
        .next()
        .map(|r| (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(true);
    primary_ok && region_ok
}

/// A probed video joined with every subtitle file that matched it.
#[derive(Debug, Clone)]
pub struct ExternalSubtitleRow {
    pub video: ProbeResult,
    pub subtitles: Vec<ExternalSubtitle>,
}

impl ExternalSubtitleRow {
    /// Embedded tracks followed by one subtitle track per external file.
    pub fn combined_tracks(&self) -> Vec<TrackInfo> {
        let mut tracks: Vec<TrackInfo> = self.video.tracks().map(<[_]>::to_vec).unwrap_or_default();
        tracks.extend(self.subtitles.iter().map(ExternalSubtitle::as_track));
        tracks
    }
}

/// Output of the matching stage.
#[derive(Debug, Default, Clone)]
pub struct MatchOutcome {
    /// Probed videos with no external subtitle.
    pub plain: Vec<ProbeResult>,
    pub external: Vec<ExternalSubtitleRow>,
    /// Subtitle files that matched no probed video.
    pub unmatched: Vec<FileRecord>,
}

/// Matches subtitle files to videos by stem within a scope.
pub struct SubtitleMatcher {
    scope: MatchScope,
    roots: Vec<PathBuf>,
}

impl SubtitleMatcher {
    pub fn new(scope: MatchScope, roots: &[PathBuf]) -> Self {
        Self {
            scope,
            roots: roots.to_vec(),
        }
    }

    /// Partition probed videos into plain and external-subtitle rows.
    ///
    /// Only successfully probed videos are candidates. Each subtitle attaches
    /// to at most one video (longest matching stem, then same directory,
    /// then path order); each video lands in exactly one of `plain` and
    /// `external`.
    pub fn match_subtitles(&self, probed: Vec<ProbeResult>, subtitles: Vec<FileRecord>) -> MatchOutcome {
        let mut by_scope: HashMap<PathBuf, Vec<usize>> = HashMap::new();
        let stems: Vec<String> = probed.iter().map(|p| p.record().stem().to_lowercase()).collect();
        for (idx, video) in probed.iter().enumerate() {
            by_scope.entry(self.scope_key(&video.record().path)).or_default().push(idx);
        }

        let mut attached: Vec<Vec<ExternalSubtitle>> = vec![Vec::new(); probed.len()];
        let mut unmatched = Vec::new();

        for sub in subtitles {
            let sub_stem = sub.stem().to_lowercase();
            let sub_dir = sub.path.parent().map(Path::to_path_buf);
            let best = by_scope
                .get(&self.scope_key(&sub.path))
                .into_iter()
                .flatten()
                .copied()
                .filter(|&idx| stem_matches(&sub_stem, &stems[idx]))
                .max_by(|&a, &b| {
                    let same_dir = |i: usize| probed[i].record().path.parent().map(Path::to_path_buf) == sub_dir;
                    stems[a]
                        .len()
                        .cmp(&stems[b].len())
                        .then(same_dir(a).cmp(&same_dir(b)))
                        .then(probed[b].record().path.cmp(&probed[a].record().path))
                });

            match best {
                Some(idx) => {
                    let video_stem = probed[idx].record().stem();
                    tracing::debug!(
                        subtitle = %sub.file_name(),
                        video = %probed[idx].record().file_name(),
                        "matched external subtitle"
                    );
                    attached[idx].push(ExternalSubtitle::new(sub, &video_stem));
                }
                None => unmatched.push(sub),
            }
        }

        let mut outcome = MatchOutcome {
            unmatched,
            ..MatchOutcome::default()
        };
        for (video, mut subs) in probed.into_iter().zip(attached) {
            if subs.is_empty() {
                outcome.plain.push(video);
            } else {
                subs.sort_by(|a, b| a.record.path.cmp(&b.record.path));
                outcome.external.push(ExternalSubtitleRow { video, subtitles: subs });
            }
        }
        outcome
    }

    fn scope_key(&self, path: &Path) -> PathBuf {
        match self.scope {
            MatchScope::Directory => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            MatchScope::Tree => self
                .roots
                .iter()
                .filter(|root| path.starts_with(root))
                .max_by_key(|root| root.components().count())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Whether a lowercased subtitle stem belongs to a lowercased video stem.
fn stem_matches(sub_stem: &str, video_stem: &str) -> bool {
    if video_stem.is_empty() {
        return false;
    }
    match sub_stem.strip_prefix(video_stem) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
