//! Moving a finished staging directory into place.

use crate::EngineError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BACKUP_PREFIX: &str = ".reportmerge-previous-";

/// Directories created on the way to the output's parent.
///
/// Dropping the guard removes them again, deepest first, as long as they are
/// still empty. [`disarm`](Self::disarm) keeps them.
#[derive(Debug)]
pub(crate) struct CreatedDirs {
    dirs: Vec<PathBuf>,
    armed: bool,
}

impl CreatedDirs {
    /// Create `dir` and any missing ancestors.
    pub(crate) fn create(dir: &Path) -> Result<Self, EngineError> {
        let mut missing = Vec::new();
        let mut cur = Some(dir);
        while let Some(d) = cur {
            if d.as_os_str().is_empty() || d.exists() {
                break;
            }
            missing.push(d.to_path_buf());
            cur = d.parent();
        }

        let mut created = Self {
            dirs: Vec::with_capacity(missing.len()),
            armed: true,
        };
        for d in missing.into_iter().rev() {
            match fs::create_dir(&d) {
                Ok(()) => created.dirs.push(d),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(source) => return Err(EngineError::Io { path: d, source }),
            }
        }
        if !created.dirs.is_empty() {
            tracing::debug!(dirs = created.dirs.len(), "created output parent directories");
        }
        Ok(created)
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CreatedDirs {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for d in self.dirs.iter().rev() {
            if let Err(err) = fs::remove_dir(d) {
                tracing::debug!(dir = %d.display(), %err, "left created directory in place");
            }
        }
    }
}

/// Publish `staging` as `out_dir`, replacing whatever is there.
pub(crate) fn publish(staging: TempDir, out_dir: &Path, parent: &Path) -> Result<(), EngineError> {
    inherit_dir_mode(staging.path())?;
    let staged = staging.keep();
    let result = swap_into_place(&staged, out_dir, parent);
    if result.is_err() {
        let _ = fs::remove_dir_all(&staged);
    }
    result
}

/// Rename `staged` to `out_dir`. An existing `out_dir` is parked under
/// `parent` first and only deleted once the new one is in place; if the
/// rename fails it is moved back.
pub(crate) fn swap_into_place(staged: &Path, out_dir: &Path, parent: &Path) -> Result<(), EngineError> {
    if !out_dir.exists() {
        return fs::rename(staged, out_dir).map_err(EngineError::io(out_dir));
    }

    let holder = tempfile::Builder::new()
        .prefix(BACKUP_PREFIX)
        .tempdir_in(parent)
        .map_err(EngineError::io(parent))?;
    let previous = holder.path().join("previous");
    fs::rename(out_dir, &previous).map_err(EngineError::io(out_dir))?;
    tracing::debug!(out_dir = %out_dir.display(), "parked existing output");

    match fs::rename(staged, out_dir) {
        Ok(()) => {
            // Dropping the holder deletes the previous output.
            if let Err(err) = holder.close() {
                tracing::warn!(out_dir = %out_dir.display(), %err, "could not remove previous output");
            }
            Ok(())
        }
        Err(source) => {
            if let Err(err) = fs::rename(&previous, out_dir) {
                let kept = holder.keep();
                tracing::error!(
                    previous = %kept.join("previous").display(),
                    %err,
                    "could not restore previous output"
                );
            }
            Err(EngineError::Io {
                path: out_dir.to_path_buf(),
                source,
            })
        }
    }
}

/// Give `dir` the mode a plain `create_dir` would get under the current
/// umask. Temporary directories are created owner-only.
#[cfg(unix)]
fn inherit_dir_mode(dir: &Path) -> Result<(), EngineError> {
    let sample = dir.join(".mode");
    fs::create_dir(&sample).map_err(EngineError::io(&sample))?;
    let perms = fs::metadata(&sample).map(|m| m.permissions());
    fs::remove_dir(&sample).map_err(EngineError::io(&sample))?;
    let perms = perms.map_err(EngineError::io(&sample))?;
    fs::set_permissions(dir, perms).map_err(EngineError::io(dir))
}

#[cfg(not(unix))]
fn inherit_dir_mode(_dir: &Path) -> Result<(), EngineError> {
    Ok(())
}
