//! Error taxonomy for reportmerge.
//!
//! Every failure a merge run can surface falls into one [`ErrorCategory`].
//! The category drives the CLI exit code and lets callers branch on the kind
//! of failure without matching on concrete error types from each crate.

use std::fmt;

/// Kind of failure surfaced by a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No inputs, or the output directory exists and overwrite is off.
    InputValidation,
    /// A bundle's `index.html` carries no embedded report archive.
    MissingReportData,
    /// The embedded archive could not be decoded.
    CorruptArchive,
    /// Two reports with different file ids share one archive path.
    IdentityCollision,
    /// A JSON report does not have the expected shape.
    Schema,
    /// Filesystem failure while reading bundles or writing output.
    Io,
}

impl ErrorCategory {
    /// Process exit code reported by the CLI.
    ///
    /// `1` is left for anyhow-level failures outside the merge itself
    /// (bad config file, unparsable flags).
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCategory::InputValidation => 2,
            ErrorCategory::MissingReportData => 3,
            ErrorCategory::CorruptArchive => 4,
            ErrorCategory::IdentityCollision => 5,
            ErrorCategory::Schema => 6,
            ErrorCategory::Io => 7,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::InputValidation => write!(f, "input_validation"),
            ErrorCategory::MissingReportData => write!(f, "missing_report_data"),
            ErrorCategory::CorruptArchive => write!(f, "corrupt_archive"),
            ErrorCategory::IdentityCollision => write!(f, "identity_collision"),
            ErrorCategory::Schema => write!(f, "schema"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Errors that know which [`ErrorCategory`] they belong to.
pub trait Categorized {
    fn category(&self) -> ErrorCategory;

    fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }
}
