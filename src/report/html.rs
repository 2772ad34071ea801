//! Best-effort HTML summary.
//!
//! Callers treat every error from this module as a warning: the text summary
//! is the mandatory artifact.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use trackscan_core::TrackType;

use super::summary::ScanSummary;
use super::writer::Manifest;
use super::{ReportError, ReportGroup};

const STYLE: &str = "body{font-family:sans-serif;margin:2em;}\
table{border-collapse:collapse;margin:.5em 0;}\
th,td{border:1px solid #ccc;padding:.25em .6em;text-align:left;}\
th{background:#f0f0f0;}\
summary{font-weight:bold;cursor:pointer;margin-top:1em;}\
.none{color:#888;}";

/// Escape text for HTML element and attribute content.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Render the HTML summary document.
///
/// Artifact links are relative file names, valid when the HTML file sits in
/// the output directory. Unwritten artifacts are listed without a link.
pub fn render_html(summary: &ScanSummary, manifest: &Manifest, show_manifest: bool) -> Result<String, ReportError> {
    let mut out = String::new();
    let s = summary;

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html><head><meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Track scan summary {}</title>", html_escape(&s.timestamp))?;
    writeln!(out, "<style>{}</style></head><body>", STYLE)?;
    writeln!(out, "<h1>📊 Track scan summary</h1>")?;
    writeln!(out, "<p>Run {}{}</p>", html_escape(&s.timestamp), if s.dry_run { " (dry run)" } else { "" })?;
    writeln!(
        out,
        "<p>Policy <b>{}</b>: video [{}], audio [{}], subtitle [{}], target codec <code>{}</code></p>",
        html_escape(s.policy_name.as_deref().unwrap_or("default")),
        html_escape(&s.allowed_display(TrackType::Video)),
        html_escape(&s.allowed_display(TrackType::Audio)),
        html_escape(&s.allowed_display(TrackType::Subtitle)),
        html_escape(&s.target_codec)
    )?;

    // Totals
    let t = &s.totals;
    writeln!(out, "<h2>📁 Totals</h2><table>")?;
    for (label, n) in [
        ("All files", t.all_files),
        ("Video files", t.video_files),
        ("Subtitle files", t.subtitle_files),
        ("Other files", t.other_files),
        ("Probed OK", t.probed_ok),
        ("Failures", t.failures),
        ("Skipped", t.skipped),
    ] {
        writeln!(out, "<tr><th>{}</th><td>{}</td></tr>", label, n)?;
    }
    writeln!(out, "</table>")?;

    // Groups with links
    writeln!(out, "<h2>📂 Report groups</h2><table><tr><th>Group</th><th>Rows</th><th>Artifacts</th></tr>")?;
    for (group, n) in &s.group_counts {
        write!(out, "<tr><td>{}</td><td>{}</td><td>", group.name(), n)?;
        if show_manifest {
            write_group_links(&mut out, manifest, *group)?;
        }
        writeln!(out, "</td></tr>")?;
    }
    writeln!(out, "</table>")?;

    // Multiplicity
    writeln!(out, "<details open><summary>🔁 Multiple tracks ({})</summary>", s.multiplicity.len())?;
    if s.multiplicity.is_empty() {
        writeln!(out, "<p class=\"none\">none</p>")?;
    } else {
        writeln!(out, "<table><tr><th>File</th><th>Violations</th></tr>")?;
        for (file, violations) in &s.multiplicity {
            let list: Vec<String> = violations.iter().map(ToString::to_string).collect();
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td></tr>",
                html_escape(file),
                html_escape(&list.join(", "))
            )?;
        }
        writeln!(out, "</table>")?;
    }
    writeln!(out, "</details>")?;

    for track_type in TrackType::ALL {
        let names = s.zero_count.get(&track_type).map(Vec::as_slice).unwrap_or(&[]);
        write_name_list(&mut out, &format!("🚫 No {} tracks", track_type), names)?;
    }
    for track_type in TrackType::ALL {
        let names = s.lang_mismatch.get(&track_type).map(Vec::as_slice).unwrap_or(&[]);
        let title = format!(
            "🌐 {} language mismatch (allowed: {})",
            track_type,
            s.allowed_display(track_type)
        );
        write_name_list(&mut out, &title, names)?;
    }
    write_name_list(&mut out, "💬 Unmatched subtitles", &s.unmatched_subs)?;

    writeln!(out, "<details><summary>❌ Failures ({})</summary>", s.failures.len())?;
    if s.failures.is_empty() {
        writeln!(out, "<p class=\"none\">none</p>")?;
    } else {
        writeln!(out, "<table><tr><th>File</th><th>Reason</th></tr>")?;
        for (name, reason) in &s.failures {
            writeln!(out, "<tr><td>{}</td><td>{}</td></tr>", html_escape(name), html_escape(reason))?;
        }
        writeln!(out, "</table>")?;
    }
    writeln!(out, "</details>")?;

    writeln!(out, "<details><summary>📋 Files ({})</summary>", s.files.len())?;
    writeln!(
        out,
        "<table><tr><th>filename</th><th>group</th><th>video</th><th>audio</th><th>sub</th><th>lang_issues</th></tr>"
    )?;
    for f in &s.files {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&f.filename),
            f.group.name(),
            f.video,
            f.audio,
            f.subtitle,
            html_escape(&f.lang_issues)
        )?;
    }
    writeln!(out, "</table></details>")?;

    writeln!(out, "</body></html>")?;
    Ok(out)
}

fn write_group_links(out: &mut String, manifest: &Manifest, group: ReportGroup) -> std::fmt::Result {
    let links: Vec<String> = manifest
        .for_group(group)
        .map(|entry| {
            let name = entry.file_name();
            if entry.written {
                format!("<a href=\"{0}\">{0}</a>", html_escape(&name))
            } else {
                html_escape(&name).into_owned()
            }
        })
        .collect();
    out.write_str(&links.join("<br>"))
}

fn write_name_list(out: &mut String, title: &str, names: &[String]) -> std::fmt::Result {
    writeln!(out, "<details><summary>{} ({})</summary>", html_escape(title), names.len())?;
    if names.is_empty() {
        writeln!(out, "<p class=\"none\">none</p>")?;
    } else {
        writeln!(out, "<ul>")?;
        for name in names {
            writeln!(out, "<li>{}</li>", html_escape(name))?;
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "</details>")
}

/// Render and write the HTML summary, returning its path.
pub fn write_html(
    path: &Path,
    summary: &ScanSummary,
    manifest: &Manifest,
    show_manifest: bool,
) -> Result<PathBuf, ReportError> {
    let html = render_html(summary, manifest, show_manifest)?;
    std::fs::write(path, html).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}
