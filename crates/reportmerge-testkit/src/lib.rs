//! Small helpers for building report fixtures in tests.
//!
//! Keeping these in one crate avoids copy-paste across the merge, engine and
//! CLI tests. Everything here panics on failure; it is only meant for tests.

pub mod proptest;

use reportmerge_archive::{ArchiveConfig, ArchiveEntry, encode_archive_to_vec};
use reportmerge_output_layout::{BundlePaths, ENTRY_REPORT_JSON};
use reportmerge_schema::{
    Extra, FileReport, HtmlReport, Location, Outcome, Stats, TestCaseSummary, TestEntry,
    TestFileSummary,
};
use reportmerge_shell::{ShellTemplate, render_shell};
use std::fs;
use std::path::{Path, PathBuf};

/// Default shell of a fixture bundle.
pub const SHELL_HTML: &str = "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Playwright Test Report</title></head>\n<body><div id=\"root\"></div></body>\n</html>\n";

/// Stats for `total` tests, all expected when `ok`, one unexpected otherwise.
pub fn stats(total: u64, ok: bool) -> Stats {
    let unexpected = if ok || total == 0 { 0 } else { 1 };
    Stats {
        total,
        expected: total - unexpected,
        unexpected,
        flaky: 0,
        skipped: 0,
        ok,
        duration: (total * 10) as f64,
        extra: Extra::new(),
    }
}

pub fn test_id(file_id: &str, project: &str, n: usize) -> String {
    format!("{file_id}-{project}-t{n}")
}

/// Archive path a fixture stores a file report under.
pub fn file_report_path(file_id: &str) -> String {
    format!("{file_id}.json")
}

pub fn test_case(file_id: &str, project: &str, n: usize, ok: bool) -> TestCaseSummary {
    TestCaseSummary {
        test_id: test_id(file_id, project, n),
        title: format!("test {n}"),
        path: vec![],
        project_name: project.to_string(),
        location: Location::new(format!("{file_id}.spec.ts"), n as u32 + 1, 1),
        annotations: vec![],
        outcome: if ok { Outcome::Expected } else { Outcome::Unexpected },
        duration: 10.0,
        ok,
        extra: Extra::new(),
    }
}

pub fn test_entry(file_id: &str, project: &str, n: usize, ok: bool) -> TestEntry {
    TestEntry {
        test_id: test_id(file_id, project, n),
        title: format!("test {n}"),
        project_name: project.to_string(),
        location: Location::new(format!("{file_id}.spec.ts"), n as u32 + 1, 1),
        duration: 10.0,
        annotations: Some(vec![]),
        outcome: if ok { "expected" } else { "unexpected" }.to_string(),
        path: Some(vec![]),
        results: Some(vec![]),
        ok,
        extra: Extra::new(),
    }
}

/// A file summary whose stats match its tests.
pub fn file_summary(file_id: &str, tests: Vec<TestCaseSummary>) -> TestFileSummary {
    let ok = tests.iter().all(|t| t.ok);
    TestFileSummary {
        file_id: file_id.to_string(),
        file_name: format!("{file_id}.spec.ts"),
        stats: stats(tests.len() as u64, ok),
        tests,
        extra: Extra::new(),
    }
}

/// An aggregate whose top-level stats are the sum of its files' stats.
pub fn aggregate(files: Vec<TestFileSummary>, projects: &[&str]) -> HtmlReport {
    let mut total = Stats::default();
    for f in &files {
        total.accumulate(&f.stats);
    }
    HtmlReport {
        files,
        stats: total,
        project_names: projects.iter().map(|p| p.to_string()).collect(),
        extra: Extra::new(),
    }
}

pub fn file_report(file_id: &str, tests: Vec<TestEntry>) -> FileReport {
    FileReport {
        file_id: file_id.to_string(),
        file_name: format!("{file_id}.spec.ts"),
        tests,
        extra: Extra::new(),
    }
}

pub fn json_entry<T: serde::Serialize>(path: &str, value: &T) -> ArchiveEntry {
    ArchiveEntry::new(path, serde_json::to_vec(value).expect("serialize fixture"))
}

/// Everything one fixture bundle holds.
#[derive(Clone, Debug)]
pub struct BundleFixture {
    pub aggregate: HtmlReport,
    /// File reports with their archive paths, in archive order.
    pub file_reports: Vec<(String, FileReport)>,
    pub data_files: Vec<(String, Vec<u8>)>,
    pub trace_files: Vec<(String, Vec<u8>)>,
    /// HTML the report-data marker is appended to.
    pub shell: String,
}

impl BundleFixture {
    /// A bundle with one file of `tests` tests run under `project`.
    pub fn single_file(file_id: &str, project: &str, tests: usize, ok: bool) -> Self {
        Self::new(&[file_id], project, tests, ok)
    }

    /// A bundle with `tests` tests in each of `file_ids`, all under `project`.
    ///
    /// When `ok` is false the last test of every file fails.
    pub fn new(file_ids: &[&str], project: &str, tests: usize, ok: bool) -> Self {
        let passed = |n: usize| ok || n + 1 < tests;
        let summaries = file_ids
            .iter()
            .map(|id| {
                let cases = (0..tests).map(|n| test_case(id, project, n, passed(n))).collect();
                file_summary(id, cases)
            })
            .collect();
        let file_reports = file_ids
            .iter()
            .map(|id| {
                let entries = (0..tests).map(|n| test_entry(id, project, n, passed(n))).collect();
                (file_report_path(id), file_report(id, entries))
            })
            .collect();
        Self {
            aggregate: aggregate(summaries, &[project]),
            file_reports,
            data_files: vec![],
            trace_files: vec![],
            shell: SHELL_HTML.to_string(),
        }
    }

    pub fn with_data_file(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.data_files.push((name.to_string(), content.into()));
        self
    }

    pub fn with_trace_file(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.trace_files.push((name.to_string(), content.into()));
        self
    }

    pub fn with_shell(mut self, html: impl Into<String>) -> Self {
        self.shell = html.into();
        self
    }

    /// Store a file report under an explicit archive path.
    pub fn with_file_report_at(mut self, path: &str, report: FileReport) -> Self {
        self.file_reports.push((path.to_string(), report));
        self
    }

    /// Archive entries: file reports first, `report.json` last.
    pub fn entries(&self) -> Vec<ArchiveEntry> {
        let mut entries: Vec<ArchiveEntry> = self
            .file_reports
            .iter()
            .map(|(path, report)| json_entry(path, report))
            .collect();
        entries.push(json_entry(ENTRY_REPORT_JSON, &self.aggregate));
        entries
    }

    pub fn archive(&self) -> Vec<u8> {
        encode_archive_to_vec(&self.entries(), &ArchiveConfig::default()).expect("encode fixture archive")
    }

    /// The bundle's `index.html`.
    pub fn html(&self) -> String {
        render_shell(&ShellTemplate::appending_to(self.shell.as_str()), &self.archive()).expect("render fixture shell")
    }

    /// Write the bundle into `dir`, creating it. Returns `dir`.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let paths = BundlePaths::new(dir);
        fs::create_dir_all(dir).expect("create bundle dir");
        fs::write(paths.index_html(), self.html()).expect("write index.html");
        write_files(&paths.data_dir(), &self.data_files);
        write_files(&paths.trace_dir(), &self.trace_files);
        dir.to_path_buf()
    }
}

fn write_files(dir: &Path, files: &[(String, Vec<u8>)]) {
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create asset dir");
        }
        fs::write(path, content).expect("write asset");
    }
}

/// Write `bundles` as `bundle-0`, `bundle-1`, ... under `root`.
pub fn write_bundles(root: &Path, bundles: &[BundleFixture]) -> Vec<PathBuf> {
    bundles
        .iter()
        .enumerate()
        .map(|(i, b)| b.write_to(&root.join(format!("bundle-{i}"))))
        .collect()
}

/// A bundle directory whose `index.html` has no report data.
pub fn write_shell_only_bundle(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).expect("create bundle dir");
    fs::write(BundlePaths::new(dir).index_html(), SHELL_HTML).expect("write index.html");
    dir.to_path_buf()
}

/// A fresh temporary directory.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}
