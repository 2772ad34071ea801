//! Benchmarks for classification
//!
//! Tests performance of policy classification, subtitle matching and
//! report partitioning over synthetic libraries.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::path::PathBuf;
use trackscan::scanner::{classify, Classifier, SubtitleMatcher};
use trackscan_core::{FileCategory, FileRecord, LanguagePolicy, MatchScope, TrackInfo, TrackType};
use trackscan_probe::ProbeResult;

/// One English HEVC/AAC/SRT track each
fn conforming_tracks() -> Vec<TrackInfo> {
    vec![
        TrackInfo::new(TrackType::Video, "HEVC/H.265/MPEG-H").with_language("eng"),
        TrackInfo::new(TrackType::Audio, "AAC").with_language("eng"),
        TrackInfo::new(TrackType::Subtitle, "SubRip/SRT").with_language("eng"),
    ]
}

/// A busy release: AVC video, three audio tracks and many subtitles
fn busy_tracks() -> Vec<TrackInfo> {
    let mut tracks = vec![
        TrackInfo::new(TrackType::Video, "AVC/H.264/MPEG-4p10").with_language("eng"),
        TrackInfo::new(TrackType::Audio, "TrueHD Atmos").with_language("eng"),
        TrackInfo::new(TrackType::Audio, "AC-3").with_language("eng"),
        TrackInfo::new(TrackType::Audio, "AAC").with_language("jpn"),
    ];
    for lang in ["eng", "fre", "ger", "spa", "ita", "jpn", "por", "und"] {
        tracks.push(TrackInfo::new(TrackType::Subtitle, "HDMV PGS").with_language(lang));
    }
    tracks
}

fn probed(path: &str, tracks: Vec<TrackInfo>) -> ProbeResult {
    ProbeResult::probed(FileRecord::new(path, 1024, FileCategory::ContainerVideo), tracks)
}

/// `n` videos across `n / 20` directories, every fourth with a subtitle
fn library(n: usize) -> (Vec<ProbeResult>, Vec<FileRecord>) {
    let mut videos = Vec::with_capacity(n);
    let mut subtitles = Vec::new();
    for i in 0..n {
        let dir = format!("/media/movies/dir{:03}", i / 20);
        let tracks = if i % 3 == 0 { busy_tracks() } else { conforming_tracks() };
        videos.push(probed(&format!("{}/movie{:05}.mkv", dir, i), tracks));
        if i % 4 == 0 {
            subtitles.push(FileRecord::new(
                format!("{}/movie{:05}.en.srt", dir, i),
                64,
                FileCategory::Subtitle,
            ));
        }
    }
    (videos, subtitles)
}

fn bench_single_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_row");

    let classifier = Classifier::new(&LanguagePolicy::default());
    let conforming = probed("/media/a.mkv", conforming_tracks());
    let busy = probed("/media/b.mkv", busy_tracks());

    group.bench_function("conforming", |b| {
        b.iter(|| classifier.classify_plain(black_box(&conforming)))
    });

    group.bench_function("busy", |b| {
        b.iter(|| classifier.classify_plain(black_box(&busy)))
    });

    let mut permissive = LanguagePolicy::default();
    permissive.lang_sub.clear();
    let permissive = Classifier::new(&permissive);
    group.bench_function("busy/subtitles_disabled", |b| {
        b.iter(|| permissive.classify_plain(black_box(&busy)))
    });

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_subtitles");
    let roots = vec![PathBuf::from("/media")];

    for size in [100usize, 1_000, 10_000] {
        let (videos, subtitles) = library(size);
        group.throughput(Throughput::Elements(size as u64));

        for scope in [MatchScope::Directory, MatchScope::Tree] {
            let matcher = SubtitleMatcher::new(scope, &roots);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", scope).to_lowercase(), size),
                &(videos.clone(), subtitles.clone()),
                |b, (v, s)| b.iter(|| matcher.match_subtitles(v.clone(), s.clone())),
            );
        }
    }

    group.finish();
}

fn bench_full_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_library");
    let policy = LanguagePolicy::default();
    let matcher = SubtitleMatcher::new(MatchScope::Directory, &[PathBuf::from("/media")]);

    for size in [100usize, 1_000, 10_000] {
        let (videos, subtitles) = library(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let matched = matcher.match_subtitles(videos.clone(), subtitles.clone());
                classify(black_box(&policy), matched, Vec::new(), Vec::new())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_row,
    bench_matching,
    bench_full_partition
);
criterion_main!(benches);
