//! The aggregate report stored at `report.json`.

use crate::{Extra, Location, Stats};
use serde::{Deserialize, Serialize};

/// Result classification of a test case.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Skipped,
    Expected,
    Unexpected,
    Flaky,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One test as listed in the aggregate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSummary {
    pub test_id: String,
    pub title: String,
    #[serde(default)]
    pub path: Vec<String>,
    pub project_name: String,
    pub location: Location,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub outcome: Outcome,
    pub duration: f64,
    pub ok: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Tests and stats for one source file.
///
/// `file_id` is the identity key across bundles.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestFileSummary {
    pub file_id: String,
    pub file_name: String,
    pub tests: Vec<TestCaseSummary>,
    pub stats: Stats,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Top-level summary spanning every file of a report.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HtmlReport {
    pub files: Vec<TestFileSummary>,
    pub stats: Stats,
    #[serde(default)]
    pub project_names: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl HtmlReport {
    pub fn file(&self, file_id: &str) -> Option<&TestFileSummary> {
        self.files.iter().find(|f| f.file_id == file_id)
    }

    /// Number of test cases across all files.
    pub fn test_count(&self) -> usize {
        self.files.iter().map(|f| f.tests.len()).sum()
    }
}
