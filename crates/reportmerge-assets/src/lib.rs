//! Asset directory reconciliation.
//!
//! Bundles carry opaque assets next to `index.html`: `data/` holds
//! attachments referenced by the reports, `trace/` holds the trace viewer.
//! Every bundle's `data/` is copied into the output; `trace/` is the same
//! application in every bundle and is copied only once.

use reportmerge_error::{Categorized, ErrorCategory};
use reportmerge_output_layout::{BundlePaths, OutputPaths};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("failed to copy `{}` to `{}`: {source}", src.display(), dst.display())]
pub struct AssetError {
    pub src: PathBuf,
    pub dst: PathBuf,
    #[source]
    pub source: io::Error,
}

impl Categorized for AssetError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Io
    }
}

/// What [`reconcile_assets`] did for one bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetReport {
    /// Files copied from `data/`.
    pub data_files: u64,
    /// Files copied from `trace/`; 0 when skipped or absent.
    pub trace_files: u64,
    /// The bundle had a `trace/` but the output already had one.
    pub trace_skipped: bool,
}

/// Copy `src` into `dst` recursively, creating `dst` as needed.
///
/// Files already present at the destination are overwritten. Returns the
/// number of files copied.
pub fn copy_dir(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut copied = 0;
    let mut stack = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((from, to)) = stack.pop() {
        std::fs::create_dir_all(&to)?;
        for entry in std::fs::read_dir(&from)? {
            let entry = entry?;
            let target = to.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                stack.push((entry.path(), target));
            } else {
                tracing::trace!(src = %entry.path().display(), dst = %target.display(), "copy asset");
                std::fs::copy(entry.path(), &target)?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}

/// Bring one bundle's assets into the output directory.
pub fn reconcile_assets(bundle: &BundlePaths, output: &OutputPaths) -> Result<AssetReport, AssetError> {
    let mut report = AssetReport::default();

    let data = bundle.data_dir();
    if data.is_dir() {
        report.data_files = copy_tracked(&data, &output.data_dir())?;
        tracing::debug!(src = %data.display(), files = report.data_files, "copied data assets");
    }

    let trace = bundle.trace_dir();
    if trace.is_dir() {
        let out_trace = output.trace_dir();
        if out_trace.exists() {
            report.trace_skipped = true;
        } else {
            report.trace_files = copy_tracked(&trace, &out_trace)?;
            tracing::debug!(src = %trace.display(), files = report.trace_files, "copied trace viewer");
        }
    }

    Ok(report)
}

fn copy_tracked(src: &Path, dst: &Path) -> Result<u64, AssetError> {
    copy_dir(src, dst).map_err(|source| AssetError {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })
}
