//! Shared test harness for integration tests.
//!
//! Provides [`MediaTree`], a temporary directory populated with placeholder
//! media files, and [`FakeProber`], which answers probes from a table keyed
//! by file name instead of running mkvmerge.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use trackscan_core::{Error, ScanConfig, TrackInfo, TrackType};
use trackscan_probe::Prober;

/// A temporary media library.
pub struct MediaTree {
    dir: TempDir,
}

impl MediaTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create a placeholder file (and its parent directories).
    pub fn file(&self, rel: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"placeholder").unwrap();
        path
    }

    /// Config scanning this tree, reports under `<root>/reports`.
    pub fn config(&self) -> ScanConfig {
        ScanConfig {
            roots: vec![self.root().to_path_buf()],
            output_dir: Some(self.reports_dir()),
            ..ScanConfig::default()
        }
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root().join("reports")
    }

    /// File names in the reports directory, sorted.
    pub fn report_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.reports_dir())
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Report files whose name starts with `<group>_` followed by a digit.
    pub fn group_files(&self, group: &str) -> Vec<String> {
        let prefix = format!("{}_", group);
        self.report_files()
            .into_iter()
            .filter(|n| {
                n.strip_prefix(&prefix)
                    .map(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Data rows (header excluded) of every artifact of a group.
    pub fn group_rows(&self, group: &str) -> Vec<String> {
        self.group_files(group)
            .iter()
            .flat_map(|name| {
                let content = fs::read_to_string(self.reports_dir().join(name)).unwrap();
                content.lines().skip(1).map(str::to_string).collect::<Vec<_>>()
            })
            .collect()
    }
}

/// One video, one audio and one subtitle track, all English HEVC.
pub fn conforming_tracks() -> Vec<TrackInfo> {
    vec![
        TrackInfo::new(TrackType::Video, "HEVC/H.265/MPEG-H").with_language("eng"),
        TrackInfo::new(TrackType::Audio, "AAC").with_language("eng"),
        TrackInfo::new(TrackType::Subtitle, "SubRip/SRT").with_language("eng"),
    ]
}

/// A prober answering from a table keyed by file name.
///
/// Unknown files get [`conforming_tracks`].
#[derive(Default)]
pub struct FakeProber {
    answers: HashMap<String, Result<Vec<TrackInfo>, String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(mut self, file_name: &str, tracks: Vec<TrackInfo>) -> Self {
        self.answers.insert(file_name.to_string(), Ok(tracks));
        self
    }

    pub fn with_failure(mut self, file_name: &str, reason: &str) -> Self {
        self.answers.insert(file_name.to_string(), Err(reason.to_string()));
        self
    }

    /// File names probed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Prober for FakeProber {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn probe(&self, path: &Path) -> trackscan_core::Result<Vec<TrackInfo>> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.calls.lock().unwrap().push(name.clone());
        match self.answers.get(&name) {
            Some(Ok(tracks)) => Ok(tracks.clone()),
            Some(Err(reason)) => Err(Error::tool("fake", reason.clone())),
            None => Ok(conforming_tracks()),
        }
    }

    fn supports(&self, _path: &Path) -> bool {
        true
    }
}

/// Shares a [`FakeProber`] with a scanner so calls can be inspected after
/// the run.
pub struct SharedProber(pub std::sync::Arc<FakeProber>);

impl Prober for SharedProber {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn probe(&self, path: &Path) -> trackscan_core::Result<Vec<TrackInfo>> {
        self.0.probe(path)
    }

    fn supports(&self, path: &Path) -> bool {
        self.0.supports(path)
    }
}
