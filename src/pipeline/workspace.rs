//! Temp workspace: the unique input file and the well-known output path.
//!
//! ## Why `TempPath`?
//!
//! The input file must be removed exactly once per run. [`Workspace`] owns a
//! [`tempfile::TempPath`]; [`Workspace::remove_input`] consumes the workspace
//! and calls [`TempPath::close`], which performs a single delete and disarms
//! the drop guard. Ownership makes a second delete unrepresentable, and if a
//! panic skips `remove_input` the guard still cleans up on drop.

use crate::config::ScribeConfig;
use crate::error::ScribeError;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Windows `ERROR_SHARING_VIOLATION`.
const ERROR_SHARING_VIOLATION: i32 = 32;
/// Windows `ERROR_LOCK_VIOLATION`.
const ERROR_LOCK_VIOLATION: i32 = 33;

/// Paths for one job.
#[derive(Debug)]
pub struct Workspace {
    input: TempPath,
    output: PathBuf,
}

impl Workspace {
    /// Create a uniquely named, empty input file and compute the output path.
    pub fn allocate(config: &ScribeConfig) -> Result<Self, ScribeError> {
        let input = tempfile::Builder::new()
            .prefix(&config.input_prefix)
            .suffix(".ps")
            .tempfile_in(&config.temp_dir)
            .map_err(|source| ScribeError::WorkspaceAllocation {
                dir: config.temp_dir.clone(),
                source,
            })?
            .into_temp_path();

        let output = config.output_path();
        debug!(
            "Workspace allocated: input={} output={}",
            input.display(),
            output.display()
        );

        Ok(Self { input, output })
    }

    /// Where the relayed PostScript is written.
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// The well-known PDF output path.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Delete a PDF left over from a previous run. A missing file is fine.
    pub fn clear_output(&self) -> Result<(), ScribeError> {
        match std::fs::remove_file(&self.output) {
            Ok(()) => {
                debug!("Removed stale output {}", self.output.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(classify_output_error(&self.output, e)),
        }
    }

    /// Delete the input temp file. Consumes the workspace, so this runs at
    /// most once. Failure is logged and otherwise ignored.
    ///
    /// Returns `true` when the file is gone.
    pub fn remove_input(self) -> bool {
        let path = self.input.to_path_buf();
        match self.input.close() {
            Ok(()) => {
                debug!("Removed temp input {}", path.display());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("{} could not be deleted. ({e})", path.display());
                false
            }
        }
    }
}

/// Classify a failure to delete the stale output file.
///
/// Locks and sharing violations mean another process holds the file;
/// permission problems mean it is read-only or access is denied. Anything else
/// is not an expected failure mode and is passed on unclassified.
pub fn classify_output_error(path: &Path, source: io::Error) -> ScribeError {
    let path = path.to_path_buf();
    match source.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            ScribeError::OutputAccessDenied { path, source }
        }
        io::ErrorKind::ResourceBusy => ScribeError::OutputInUse { path, source },
        _ if cfg!(windows)
            && matches!(
                source.raw_os_error(),
                Some(ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
            ) =>
        {
            ScribeError::OutputInUse { path, source }
        }
        _ => ScribeError::OutputDeleteFailed { path, source },
    }
}
