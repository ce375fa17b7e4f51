use reportmerge_archive::ArchiveError;
use reportmerge_assets::AssetError;
use reportmerge_error::{Categorized, ErrorCategory};
use reportmerge_merge::MergeError;
use reportmerge_shell::ShellError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a merge run failed. Bundle-specific variants name the bundle.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No input paths provided")]
    NoInputs,
    #[error(
        "Report merge aborted. Output directory already exists and overwrite is disabled: {}",
        path.display()
    )]
    OutputExists { path: PathBuf },
    #[error("bundle `{}`: {source}", bundle.display())]
    Shell {
        bundle: PathBuf,
        #[source]
        source: ShellError,
    },
    #[error("bundle `{}`: {source}", bundle.display())]
    Archive {
        bundle: PathBuf,
        #[source]
        source: ArchiveError,
    },
    #[error("bundle `{}`: {source}", bundle.display())]
    Merge {
        bundle: PathBuf,
        #[source]
        source: MergeError,
    },
    #[error("bundle `{}`: {source}", bundle.display())]
    Assets {
        bundle: PathBuf,
        #[source]
        source: AssetError,
    },
    #[error(transparent)]
    Finalize(MergeError),
    #[error("failed to encode merged archive: {0}")]
    Encode(#[source] ArchiveError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| EngineError::Io { path, source }
    }
}

impl Categorized for EngineError {
    fn category(&self) -> ErrorCategory {
        match self {
            EngineError::NoInputs | EngineError::OutputExists { .. } => {
                ErrorCategory::InputValidation
            }
            EngineError::Shell {
                source: ShellError::MissingReportData,
                ..
            } => ErrorCategory::MissingReportData,
            EngineError::Shell {
                source: ShellError::InvalidPayload(_),
                ..
            }
            | EngineError::Archive { .. } => ErrorCategory::CorruptArchive,
            EngineError::Merge { source, .. } | EngineError::Finalize(source) => source.category(),
            EngineError::Assets { source, .. } => source.category(),
            EngineError::Encode(_) | EngineError::Io { .. } => ErrorCategory::Io,
        }
    }
}
