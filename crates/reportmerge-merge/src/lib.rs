//! Report tree merging.
//!
//! [`ReportAccumulator`] folds the archive entries of several bundles into
//! one aggregate report and one ordered set of per-file reports:
//!
//! * the first `report.json` is adopted as-is; later ones are folded in file
//!   by file, keyed by `fileId`, with stats accumulated and project names
//!   unioned;
//! * per-file reports are keyed by archive path; a repeated path appends its
//!   tests, unless the `fileId` differs, which is an identity collision.
//!
//! Tests are always appended, so the result depends on the order entries are
//! applied in. Callers apply bundles in the order they were given.

use reportmerge_archive::ArchiveEntry;
use reportmerge_error::{Categorized, ErrorCategory};
use reportmerge_output_layout::ENTRY_REPORT_JSON;
use reportmerge_schema::{FileReport, HtmlReport, TestFileSummary};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error(
        "collision with file ids in two file reports at `{path}`: existing `{existing}`, incoming `{incoming}`"
    )]
    IdentityCollision {
        path: String,
        existing: String,
        incoming: String,
    },
    #[error("`{path}` is not a valid report: {source}")]
    Schema {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize merged `{path}`: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("none of the merged archives contains report.json")]
    MissingAggregate,
}

impl Categorized for MergeError {
    fn category(&self) -> ErrorCategory {
        match self {
            MergeError::IdentityCollision { .. } => ErrorCategory::IdentityCollision,
            MergeError::Schema { .. } | MergeError::Serialize { .. } => ErrorCategory::Schema,
            MergeError::MissingAggregate => ErrorCategory::MissingReportData,
        }
    }
}

/// A parsed archive entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEntry {
    Aggregate(HtmlReport),
    File { path: String, report: FileReport },
}

impl ReportEntry {
    /// Parse `entry` according to its path: `report.json` is the aggregate,
    /// anything else a per-file report.
    pub fn classify(entry: &ArchiveEntry) -> Result<Self, MergeError> {
        let schema_err = |source| MergeError::Schema {
            path: entry.path.clone(),
            source,
        };
        if entry.path == ENTRY_REPORT_JSON {
            let report = serde_json::from_slice(&entry.content).map_err(schema_err)?;
            Ok(ReportEntry::Aggregate(report))
        } else {
            let report = serde_json::from_slice(&entry.content).map_err(schema_err)?;
            Ok(ReportEntry::File {
                path: entry.path.clone(),
                report,
            })
        }
    }
}

/// Merge state for one run.
#[derive(Debug, Default)]
pub struct ReportAccumulator {
    aggregate: Option<HtmlReport>,
    /// fileId -> index into `aggregate.files`.
    summary_index: HashMap<String, usize>,
    /// Per-file reports in first-insertion order.
    files: Vec<(String, FileReport)>,
    /// archive path -> index into `files`.
    path_index: HashMap<String, usize>,
}

impl ReportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_archive_entry(&mut self, entry: &ArchiveEntry) -> Result<(), MergeError> {
        self.apply(ReportEntry::classify(entry)?)
    }

    pub fn apply(&mut self, entry: ReportEntry) -> Result<(), MergeError> {
        match entry {
            ReportEntry::Aggregate(report) => {
                self.merge_aggregate(report);
                Ok(())
            }
            ReportEntry::File { path, report } => self.merge_file_report(path, report),
        }
    }

    fn merge_aggregate(&mut self, incoming: HtmlReport) {
        let Some(held) = self.aggregate.as_mut() else {
            for (i, file) in incoming.files.iter().enumerate() {
                self.summary_index.entry(file.file_id.clone()).or_insert(i);
            }
            self.aggregate = Some(incoming);
            return;
        };

        for file in incoming.files {
            match self.summary_index.get(&file.file_id) {
                Some(&i) => {
                    tracing::debug!(file_id = %file.file_id, tests = file.tests.len(), "merging file summary");
                    absorb_summary(&mut held.files[i], file);
                }
                None => {
                    self.summary_index.insert(file.file_id.clone(), held.files.len());
                    held.files.push(file);
                }
            }
        }
        held.stats.accumulate(&incoming.stats);
        union_project_names(&mut held.project_names, incoming.project_names);
    }

    fn merge_file_report(&mut self, path: String, incoming: FileReport) -> Result<(), MergeError> {
        let Some(&i) = self.path_index.get(&path) else {
            self.path_index.insert(path.clone(), self.files.len());
            self.files.push((path, incoming));
            return Ok(());
        };

        let existing = &mut self.files[i].1;
        if existing.file_id != incoming.file_id {
            return Err(MergeError::IdentityCollision {
                path,
                existing: existing.file_id.clone(),
                incoming: incoming.file_id,
            });
        }
        tracing::debug!(%path, tests = incoming.tests.len(), "merging duplicate file report");
        existing.tests.extend(incoming.tests);
        Ok(())
    }

    pub fn aggregate(&self) -> Option<&HtmlReport> {
        self.aggregate.as_ref()
    }

    /// Per-file reports with their archive paths, in first-insertion order.
    pub fn file_reports(&self) -> impl Iterator<Item = (&str, &FileReport)> {
        self.files.iter().map(|(path, report)| (path.as_str(), report))
    }

    pub fn file_report(&self, path: &str) -> Option<&FileReport> {
        self.path_index.get(path).map(|&i| &self.files[i].1)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Merged state as archive entries: per-file reports first, in
    /// first-insertion order, then `report.json`.
    pub fn into_entries(self) -> Result<Vec<ArchiveEntry>, MergeError> {
        let aggregate = self.aggregate.ok_or(MergeError::MissingAggregate)?;
        let mut entries = Vec::with_capacity(self.files.len() + 1);
        for (path, report) in &self.files {
            entries.push(json_entry(path, report)?);
        }
        entries.push(json_entry(ENTRY_REPORT_JSON, &aggregate)?);
        Ok(entries)
    }
}

fn json_entry<T: serde::Serialize>(path: &str, value: &T) -> Result<ArchiveEntry, MergeError> {
    let content = serde_json::to_vec(value).map_err(|source| MergeError::Serialize {
        path: path.to_string(),
        source,
    })?;
    Ok(ArchiveEntry::new(path, content))
}

/// Append `incoming`'s tests after `held`'s and add its stats.
fn absorb_summary(held: &mut TestFileSummary, incoming: TestFileSummary) {
    held.tests.extend(incoming.tests);
    held.stats.accumulate(&incoming.stats);
}

/// Set union keeping first-seen order.
fn union_project_names(held: &mut Vec<String>, incoming: Vec<String>) {
    let mut seen = HashSet::new();
    let merged: Vec<String> = held
        .drain(..)
        .chain(incoming)
        .filter(|name| seen.insert(name.clone()))
        .collect();
    *held = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportmerge_testkit::{
        BundleFixture, aggregate, file_report, file_summary, json_entry as fixture_entry,
        test_case, test_entry,
    };

    fn apply_bundle(acc: &mut ReportAccumulator, bundle: &BundleFixture) {
        for entry in bundle.entries() {
            acc.apply_archive_entry(&entry).unwrap();
        }
    }

    #[test]
    fn first_aggregate_is_adopted_as_is() {
        let bundle = BundleFixture::single_file("f1", "chromium", 2, true);
        let mut acc = ReportAccumulator::new();
        apply_bundle(&mut acc, &bundle);
        assert_eq!(acc.aggregate(), Some(&bundle.aggregate));
        assert_eq!(acc.file_count(), 1);
    }

    #[test]
    fn end_to_end_scenario_keeps_bundle_order() {
        let a = aggregate(
            vec![file_summary("f1", vec![test_case("f1", "chromium", 1, true)])],
            &["chromium"],
        );
        let mut b = aggregate(
            vec![file_summary("f1", vec![test_case("f1", "firefox", 2, true)])],
            &["firefox"],
        );
        b.stats.ok = false;

        let mut acc = ReportAccumulator::new();
        acc.apply(ReportEntry::Aggregate(a)).unwrap();
        acc.apply(ReportEntry::Aggregate(b)).unwrap();

        let merged = acc.aggregate().unwrap();
        assert_eq!(merged.files.len(), 1);
        let ids: Vec<&str> = merged.files[0].tests.iter().map(|t| t.test_id.as_str()).collect();
        assert_eq!(ids, ["f1-chromium-t1", "f1-firefox-t2"]);
        assert_eq!(merged.files[0].stats.total, 2);
        assert_eq!(merged.stats.total, 2);
        assert!(!merged.stats.ok);
        assert_eq!(merged.project_names, ["chromium", "firefox"]);
    }

    #[test]
    fn new_file_ids_are_appended() {
        let mut acc = ReportAccumulator::new();
        apply_bundle(&mut acc, &BundleFixture::single_file("f1", "chromium", 1, true));
        apply_bundle(&mut acc, &BundleFixture::single_file("f2", "chromium", 1, true));
        let merged = acc.aggregate().unwrap();
        let ids: Vec<&str> = merged.files.iter().map(|f| f.file_id.as_str()).collect();
        assert_eq!(ids, ["f1", "f2"]);
        assert_eq!(merged.project_names, ["chromium"]);
        assert_eq!(merged.stats.total, 2);
    }

    #[test]
    fn duplicate_paths_append_tests_existing_first() {
        let mut acc = ReportAccumulator::new();
        let first = file_report("f1", vec![test_entry("f1", "chromium", 0, true)]);
        let second = file_report("f1", vec![test_entry("f1", "webkit", 0, false)]);
        acc.apply(ReportEntry::File { path: "f1.json".into(), report: first }).unwrap();
        acc.apply(ReportEntry::File { path: "f1.json".into(), report: second }).unwrap();

        let merged = acc.file_report("f1.json").unwrap();
        let ids: Vec<&str> = merged.tests.iter().map(|t| t.test_id.as_str()).collect();
        assert_eq!(ids, ["f1-chromium-t0", "f1-webkit-t0"]);
        assert_eq!(acc.file_count(), 1);
    }

    #[test]
    fn differing_file_id_at_same_path_collides() {
        let mut acc = ReportAccumulator::new();
        acc.apply(ReportEntry::File { path: "shared.json".into(), report: file_report("f1", vec![]) })
            .unwrap();
        let err = acc
            .apply(ReportEntry::File { path: "shared.json".into(), report: file_report("f2", vec![]) })
            .unwrap_err();
        assert!(matches!(
            &err,
            MergeError::IdentityCollision { path, existing, incoming }
                if path == "shared.json" && existing == "f1" && incoming == "f2"
        ));
        assert_eq!(err.category(), ErrorCategory::IdentityCollision);
        insta::assert_snapshot!(
            err.to_string(),
            @"collision with file ids in two file reports at `shared.json`: existing `f1`, incoming `f2`"
        );
    }

    #[test]
    fn project_names_are_deduplicated() {
        let mut held = vec!["chromium".to_string(), "firefox".to_string()];
        union_project_names(&mut held, vec!["webkit".into(), "chromium".into(), "webkit".into()]);
        assert_eq!(held, ["chromium", "firefox", "webkit"]);
    }

    #[test]
    fn invalid_json_is_a_schema_error() {
        let entry = ArchiveEntry::new("f1.json", "{not json");
        let err = ReportEntry::classify(&entry).unwrap_err();
        assert!(matches!(&err, MergeError::Schema { path, .. } if path == "f1.json"));
        assert_eq!(err.category(), ErrorCategory::Schema);
    }

    #[test]
    fn aggregate_shape_is_checked() {
        let entry = ArchiveEntry::new("report.json", r#"{"fileId":"f1","fileName":"x","tests":[]}"#);
        assert!(matches!(
            ReportEntry::classify(&entry),
            Err(MergeError::Schema { .. })
        ));
    }

    #[test]
    fn classify_routes_by_path() {
        let bundle = BundleFixture::single_file("f1", "chromium", 1, true);
        let entries = bundle.entries();
        assert!(matches!(
            ReportEntry::classify(&entries[0]).unwrap(),
            ReportEntry::File { ref path, .. } if path == "f1.json"
        ));
        assert!(matches!(
            ReportEntry::classify(&entries[1]).unwrap(),
            ReportEntry::Aggregate(_)
        ));
    }

    #[test]
    fn into_entries_puts_aggregate_last() {
        let mut acc = ReportAccumulator::new();
        apply_bundle(&mut acc, &BundleFixture::new(&["b", "a"], "chromium", 1, true));
        apply_bundle(&mut acc, &BundleFixture::single_file("c", "chromium", 1, true));
        let paths: Vec<String> = acc.into_entries().unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, ["b.json", "a.json", "c.json", "report.json"]);
    }

    #[test]
    fn into_entries_without_aggregate_fails() {
        let mut acc = ReportAccumulator::new();
        acc.apply_archive_entry(&fixture_entry("f1.json", &file_report("f1", vec![])))
            .unwrap();
        assert!(matches!(acc.into_entries(), Err(MergeError::MissingAggregate)));
    }

    #[test]
    fn merged_entries_parse_back() {
        let mut acc = ReportAccumulator::new();
        let bundle = BundleFixture::single_file("f1", "chromium", 2, true);
        apply_bundle(&mut acc, &bundle);
        apply_bundle(&mut acc, &bundle);
        let entries = acc.into_entries().unwrap();
        let mut again = ReportAccumulator::new();
        for entry in &entries {
            again.apply_archive_entry(entry).unwrap();
        }
        assert_eq!(again.aggregate().unwrap().test_count(), 4);
        assert_eq!(again.file_report("f1.json").unwrap().tests.len(), 4);
    }
}
