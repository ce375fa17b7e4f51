//! Data model for HTML test reports.
//!
//! A report archive holds one [`HtmlReport`] at `report.json` and one
//! [`FileReport`] per test file. Both sides share [`Stats`] and
//! [`Location`]. Every struct carries an `extra` map with the fields it does
//! not model, so reading and re-writing a report keeps producer data intact.

pub mod aggregate;
pub mod file_report;
pub mod stats;

pub use aggregate::{Annotation, HtmlReport, Outcome, TestCaseSummary, TestFileSummary};
pub use file_report::{Attachment, FileReport, TestEntry, TestResult, TestStep};
pub use stats::Stats;

use serde::{Deserialize, Serialize};

/// Fields a struct does not model, kept verbatim.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Source position of a test or step.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            extra: Extra::new(),
        }
    }
}
