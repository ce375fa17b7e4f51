//! Merge orchestration for HTML report bundles.
//!
//! [`Engine::merge`] runs the whole pipeline for an ordered list of bundle
//! directories: extract each shell's payload, decode the archive, fold its
//! entries into a [`ReportAccumulator`], copy assets, then encode the merged
//! archive and stream it into the first bundle's shell.
//!
//! Output is written to a staging directory next to the destination and
//! only renamed into place once everything succeeded, so a failed run
//! leaves the destination as it was.

mod error;
mod publish;

pub use error::EngineError;

use reportmerge_archive::{decode_archive, encode_archive_to_vec};
use reportmerge_assets::reconcile_assets;
use reportmerge_config::MergeConfig;
use reportmerge_merge::ReportAccumulator;
use reportmerge_output_layout::{BundlePaths, OutputPaths};
use reportmerge_schema::Stats;
use reportmerge_shell::{ShellTemplate, ShellWriter, extract_shell};
use publish::{CreatedDirs, publish};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

const STAGING_PREFIX: &str = ".reportmerge-";

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutputs {
    pub out_dir: PathBuf,
    pub index_html: PathBuf,
    pub bundles_merged: usize,
    /// Distinct per-file reports in the merged archive.
    pub file_reports: usize,
    /// Test cases listed in the merged aggregate.
    pub total_tests: usize,
    pub stats: Stats,
}

#[derive(Debug)]
pub struct Engine {
    config: MergeConfig,
}

impl Engine {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Merge `inputs`, in order, into the configured output directory.
    pub fn merge<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<MergeOutputs, EngineError> {
        if inputs.is_empty() {
            return Err(EngineError::NoInputs);
        }
        let out_dir = self.config.output_dir();
        if out_dir.exists() && !self.config.overwrite_existing {
            return Err(EngineError::OutputExists { path: out_dir });
        }

        let parent = staging_parent(&out_dir);
        let created = CreatedDirs::create(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(EngineError::io(parent))?;
        let staged = OutputPaths::new(staging.path());
        tracing::debug!(staging = %staging.path().display(), "created staging directory");

        let mut acc = ReportAccumulator::new();
        let mut template: Option<ShellTemplate> = None;
        for (i, input) in inputs.iter().enumerate() {
            let bundle = input.as_ref();
            tracing::info!(bundle = %bundle.display(), n = i + 1, of = inputs.len(), "processing bundle");
            let shell = self.merge_bundle(bundle, &mut acc, &staged)?;
            template.get_or_insert(shell);
        }
        let template = template.ok_or(EngineError::NoInputs)?;

        if self.config.debug {
            log_aggregate(&acc);
        }
        let stats = acc.aggregate().map(|a| a.stats.clone()).unwrap_or_default();
        let total_tests = acc.aggregate().map_or(0, |a| a.test_count());
        let file_reports = acc.file_count();

        let entries = acc.into_entries().map_err(EngineError::Finalize)?;
        let archive =
            encode_archive_to_vec(&entries, &self.config.archive).map_err(EngineError::Encode)?;
        write_index_html(&staged.index_html(), &template, &archive)?;

        publish(staging, &out_dir, parent)?;
        created.disarm();
        tracing::info!(out_dir = %out_dir.display(), bundles = inputs.len(), "merged report written");

        Ok(MergeOutputs {
            index_html: OutputPaths::new(&out_dir).index_html(),
            out_dir,
            bundles_merged: inputs.len(),
            file_reports,
            total_tests,
            stats,
        })
    }

    /// Fold one bundle into `acc` and copy its assets. Returns the bundle's
    /// shell template.
    fn merge_bundle(
        &self,
        bundle: &Path,
        acc: &mut ReportAccumulator,
        staged: &OutputPaths,
    ) -> Result<ShellTemplate, EngineError> {
        let paths = BundlePaths::new(bundle);
        let index = paths.index_html();
        let html = std::fs::read_to_string(&index).map_err(EngineError::io(&index))?;

        let shell = extract_shell(&html).map_err(|source| EngineError::Shell {
            bundle: bundle.to_path_buf(),
            source,
        })?;
        let bytes = shell.decode_payload().map_err(|source| EngineError::Shell {
            bundle: bundle.to_path_buf(),
            source,
        })?;
        let entries = decode_archive(&bytes).map_err(|source| EngineError::Archive {
            bundle: bundle.to_path_buf(),
            source,
        })?;
        tracing::debug!(bundle = %bundle.display(), entries = entries.len(), "decoded archive");

        for entry in &entries {
            acc.apply_archive_entry(entry)
                .map_err(|source| EngineError::Merge {
                    bundle: bundle.to_path_buf(),
                    source,
                })?;
        }

        let assets = reconcile_assets(&paths, staged).map_err(|source| EngineError::Assets {
            bundle: bundle.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            bundle = %bundle.display(),
            data_files = assets.data_files,
            trace_files = assets.trace_files,
            trace_skipped = assets.trace_skipped,
            "reconciled assets"
        );

        Ok(shell.template)
    }
}

/// Merge `inputs` with `config`.
pub fn merge_html_reports<P: AsRef<Path>>(
    inputs: &[P],
    config: &MergeConfig,
) -> Result<MergeOutputs, EngineError> {
    Engine::new(config.clone()).merge(inputs)
}

fn staging_parent(out_dir: &Path) -> &Path {
    match out_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn log_aggregate(acc: &ReportAccumulator) {
    let Some(aggregate) = acc.aggregate() else {
        return;
    };
    match serde_json::to_string_pretty(aggregate) {
        Ok(json) => tracing::debug!(aggregate = %json, "merged aggregate"),
        Err(err) => tracing::debug!(%err, "could not render merged aggregate"),
    }
}

/// Stream the shell with `archive` embedded into `path`.
///
/// The file is opened once; it is closed when the writer drops, on success
/// and on every error path.
fn write_index_html(path: &Path, template: &ShellTemplate, archive: &[u8]) -> Result<(), EngineError> {
    let write = || -> io::Result<()> {
        let file = BufWriter::new(File::create(path)?);
        let mut shell = ShellWriter::begin(file, template)?;
        io::copy(&mut &archive[..], &mut shell)?;
        tracing::debug!(path = %path.display(), archive_bytes = shell.payload_bytes(), "embedded report data");
        let file = shell.finish()?;
        file.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()
    };
    write().map_err(EngineError::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_parent_of_bare_name_is_cwd() {
        assert_eq!(staging_parent(Path::new("merged")), Path::new("."));
        assert_eq!(staging_parent(Path::new("out/merged")), Path::new("out"));
    }

    #[test]
    fn empty_input_list_is_rejected_before_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let config = MergeConfig {
            output_base_path: tmp.path().join("never-created"),
            ..MergeConfig::default()
        };
        let inputs: Vec<PathBuf> = vec![];
        assert!(matches!(
            merge_html_reports(&inputs, &config),
            Err(EngineError::NoInputs)
        ));
        assert!(!tmp.path().join("never-created").exists());
    }
}
