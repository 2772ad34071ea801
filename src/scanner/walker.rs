//! Tree walking and extension bucketing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use trackscan_core::{ExtensionConfig, FileCategory, FileRecord};
use walkdir::{DirEntry, WalkDir};

use crate::report::writer::is_artifact_name;

/// Files found under the scan roots, bucketed by category and sorted by path.
#[derive(Debug, Default, Clone)]
pub struct WalkResult {
    pub container_video: Vec<FileRecord>,
    pub other_video: Vec<FileRecord>,
    pub subtitles: Vec<FileRecord>,
    pub skipped: Vec<FileRecord>,
    /// Entries that could not be read.
    pub errors: usize,
}

impl WalkResult {
    /// Every bucketed file.
    pub fn total(&self) -> usize {
        self.container_video.len() + self.other_video.len() + self.subtitles.len() + self.skipped.len()
    }

    pub fn video_count(&self) -> usize {
        self.container_video.len() + self.other_video.len()
    }

    fn sort(&mut self) {
        for list in [
            &mut self.container_video,
            &mut self.other_video,
            &mut self.subtitles,
            &mut self.skipped,
        ] {
            list.sort_by(|a, b| a.path.cmp(&b.path));
        }
    }
}

/// Walks scan roots and buckets regular files by extension.
///
/// Nothing beyond directory entries and metadata is read.
pub struct TreeWalker {
    extensions: ExtensionConfig,
    exclude_hidden: bool,
    output_dir: Option<PathBuf>,
}

impl TreeWalker {
    pub fn new(extensions: ExtensionConfig, exclude_hidden: bool) -> Self {
        Self {
            extensions,
            exclude_hidden,
            output_dir: None,
        }
    }

    /// Exclude everything under `dir`. When `dir` is itself a scan root it is
    /// walked, but report artifacts from earlier runs directly inside it are
    /// dropped.
    pub fn exclude_output_dir(mut self, dir: &Path) -> Self {
        self.output_dir = Some(comparable(dir));
        self
    }

    /// Walk every root. Unreadable entries are logged and counted, never fatal.
    pub fn walk(&self, roots: &[PathBuf]) -> WalkResult {
        let mut result = WalkResult::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for root in roots {
            let root_cmp = comparable(root);
            let excluded = self
                .output_dir
                .as_ref()
                .filter(|out| **out != root_cmp)
                .cloned();
            let reports_in_root = self.output_dir.as_ref().filter(|out| **out == root_cmp);

            let walker = WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| self.keep_entry(e, excluded.as_deref()));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("⚠️ Skipping unreadable entry: {}", e);
                        result.errors += 1;
                        continue;
                    }
                };

                if !entry.file_type().is_file() {
                    continue;
                }

                if let Some(out) = reports_in_root {
                    if is_previous_report(&entry, out) {
                        debug!("Ignoring previous report {}", entry.path().display());
                        continue;
                    }
                }

                if !seen.insert(comparable(entry.path())) {
                    continue;
                }

                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        warn!("⚠️ Cannot stat {}: {}", entry.path().display(), e);
                        result.errors += 1;
                        continue;
                    }
                };

                self.bucket(&mut result, entry.into_path(), size);
            }
        }

        result.sort();
        debug!(
            container_video = result.container_video.len(),
            other_video = result.other_video.len(),
            subtitles = result.subtitles.len(),
            skipped = result.skipped.len(),
            errors = result.errors,
            "walk complete"
        );
        result
    }

    fn bucket(&self, result: &mut WalkResult, path: PathBuf, size: u64) {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.extensions.categorize(&ext) {
            FileCategory::ContainerVideo => result
                .container_video
                .push(FileRecord::new(path, size, FileCategory::ContainerVideo)),
            FileCategory::OtherVideo => result
                .other_video
                .push(FileRecord::new(path, size, FileCategory::OtherVideo)),
            FileCategory::Subtitle => result
                .subtitles
                .push(FileRecord::new(path, size, FileCategory::Subtitle)),
            FileCategory::Skipped => result.skipped.push(FileRecord::skipped(path, size)),
        }
    }

    fn keep_entry(&self, entry: &DirEntry, excluded: Option<&Path>) -> bool {
        // Roots are always walked, even when hidden.
        if entry.depth() == 0 {
            return true;
        }
        if self.exclude_hidden && is_hidden(entry) {
            return false;
        }
        match excluded {
            Some(out) if entry.file_type().is_dir() => comparable(entry.path()) != out,
            _ => true,
        }
    }
}

fn is_previous_report(entry: &DirEntry, output_dir: &Path) -> bool {
    entry.depth() == 1
        && entry.file_name().to_str().map(is_artifact_name).unwrap_or(false)
        && entry.path().parent().map(comparable).as_deref() == Some(output_dir)
}

/// Dot-files, dot-directories and KDE `.directory` files.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Canonical form when the path exists, the path as given otherwise.
fn comparable(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    fn names(records: &[FileRecord]) -> Vec<String> {
        records.iter().map(|r| r.file_name()).collect()
    }

    #[test]
    fn buckets_by_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/Movie.MKV");
        touch(dir.path(), "a/Movie.en.srt");
        touch(dir.path(), "b/clip.mp4");
        touch(dir.path(), "b/notes.txt");
        touch(dir.path(), "README");

        let walker = TreeWalker::new(ExtensionConfig::default(), true);
        let result = walker.walk(&[dir.path().to_path_buf()]);

        assert_eq!(names(&result.container_video), vec!["Movie.MKV"]);
        assert_eq!(names(&result.other_video), vec!["clip.mp4"]);
        assert_eq!(names(&result.subtitles), vec!["Movie.en.srt"]);
        assert_eq!(names(&result.skipped), vec!["README", "notes.txt"]);
        assert_eq!(result.total(), 5);
        assert_eq!(result.video_count(), 2);
        assert_eq!(result.container_video[0].size, 4);
    }

    #[test]
    fn hidden_entries_excluded() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".hidden.mkv");
        touch(dir.path(), ".directory");
        touch(dir.path(), ".cache/inner.mkv");
        touch(dir.path(), "visible.mkv");

        let walker = TreeWalker::new(ExtensionConfig::default(), true);
        let result = walker.walk(&[dir.path().to_path_buf()]);
        assert_eq!(result.total(), 1);
        assert_eq!(names(&result.container_video), vec!["visible.mkv"]);

        let walker = TreeWalker::new(ExtensionConfig::default(), false);
        let result = walker.walk(&[dir.path().to_path_buf()]);
        assert_eq!(result.total(), 4);
    }

    #[test]
    fn output_dir_excluded() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "movie.mkv");
        touch(dir.path(), "reports/ok_2024-01-01_000000.csv");
        touch(dir.path(), "reports/nested/old.mkv");

        let walker = TreeWalker::new(ExtensionConfig::default(), true)
            .exclude_output_dir(&dir.path().join("reports"));
        let result = walker.walk(&[dir.path().to_path_buf()]);
        assert_eq!(result.total(), 1);
        assert_eq!(names(&result.container_video), vec!["movie.mkv"]);
    }

    #[test]
    fn output_dir_equal_to_root_still_walked() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "movie.mkv");

        let walker = TreeWalker::new(ExtensionConfig::default(), true).exclude_output_dir(dir.path());
        let result = walker.walk(&[dir.path().to_path_buf()]);
        assert_eq!(result.total(), 1);
    }

    #[test]
    fn previous_reports_in_root_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "movie.mkv");
        touch(dir.path(), "ok_2024-01-01_000000.csv");
        touch(dir.path(), "issues_2024-01-01_000000_part02.csv");
        touch(dir.path(), "scan_summary_2024-01-01_000000.html");
        touch(dir.path(), "library_2024-01-01_000000.csv");
        touch(dir.path(), "Extras/ok_2024-01-01_000000.csv");

        let walker = TreeWalker::new(ExtensionConfig::default(), true).exclude_output_dir(dir.path());
        let result = walker.walk(&[dir.path().to_path_buf()]);
        assert_eq!(names(&result.container_video), vec!["movie.mkv"]);
        assert_eq!(
            names(&result.skipped),
            vec!["ok_2024-01-01_000000.csv", "library_2024-01-01_000000.csv"]
        );

        // Without an output dir nothing is filtered.
        let walker = TreeWalker::new(ExtensionConfig::default(), true);
        assert_eq!(walker.walk(&[dir.path().to_path_buf()]).total(), 6);
    }

    #[test]
    fn overlapping_roots_do_not_duplicate() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "show/ep1.mkv");

        let walker = TreeWalker::new(ExtensionConfig::default(), true);
        let result = walker.walk(&[dir.path().to_path_buf(), dir.path().join("show")]);
        assert_eq!(result.total(), 1);
    }

    #[test]
    fn missing_root_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.mkv");

        let walker = TreeWalker::new(ExtensionConfig::default(), true);
        let result = walker.walk(&[dir.path().join("gone"), dir.path().to_path_buf()]);
        assert_eq!(result.total(), 1);
        assert_eq!(result.errors, 1);
    }
}
