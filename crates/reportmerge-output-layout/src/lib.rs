//! Canonical layout contracts for report bundles and merged output.

use std::path::{Path, PathBuf};

/// HTML shell that embeds the report archive.
pub const FILE_INDEX_HTML: &str = "index.html";

/// Archive entry holding the aggregate report.
pub const ENTRY_REPORT_JSON: &str = "report.json";

/// Attachment assets, merged from every bundle.
pub const DIR_DATA: &str = "data";
/// Trace viewer application, copied once.
pub const DIR_TRACE: &str = "trace";

pub const DEFAULT_OUTPUT_FOLDER: &str = "merged-html-report";

/// Global the viewer reads the embedded archive from.
pub const DEFAULT_REPORT_VARIABLE: &str = "playwrightReportBase64";

/// Paths inside one input bundle directory.
#[derive(Debug, Clone)]
pub struct BundlePaths {
    pub root: PathBuf,
}

impl BundlePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `index.html`
    pub fn index_html(&self) -> PathBuf {
        self.root.join(FILE_INDEX_HTML)
    }

    /// `data/`
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DIR_DATA)
    }

    /// `trace/`
    pub fn trace_dir(&self) -> PathBuf {
        self.root.join(DIR_TRACE)
    }
}

/// Paths inside the merged output directory (or its staging twin).
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// `index.html`
    pub fn index_html(&self) -> PathBuf {
        self.out_dir.join(FILE_INDEX_HTML)
    }

    /// `data/`
    pub fn data_dir(&self) -> PathBuf {
        self.out_dir.join(DIR_DATA)
    }

    /// `trace/`
    pub fn trace_dir(&self) -> PathBuf {
        self.out_dir.join(DIR_TRACE)
    }
}

/// Resolve `<base>/<folder>`.
///
/// An absolute `folder` replaces the base, mirroring [`Path::join`].
pub fn resolve_output_dir(base: &Path, folder: &str) -> PathBuf {
    base.join(folder)
}
