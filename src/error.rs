//! Error types for the pdfscribe library.
//!
//! [`ScribeError`] is what the individual stages return. The orchestrator
//! never lets one escape: every error is folded into a
//! [`crate::outcome::JobOutcome`] by [`crate::outcome::JobOutcome::from_error`],
//! which decides the dialog the user sees.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the pdfscribe stages.
#[derive(Debug, Error)]
pub enum ScribeError {
    // ── Output file ───────────────────────────────────────────────────────
    /// The stale output file is held open by another process.
    #[error("{} is being used by another process.", path.display())]
    OutputInUse {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stale output file is read-only or its directory denies deletion.
    #[error("Access to '{}' is denied: {source}", path.display())]
    OutputAccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Deleting the stale output failed for a reason that is neither a lock
    /// nor a permission problem.
    #[error("Failed to delete '{}': {source}", path.display())]
    OutputDeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // ── Input temp file ───────────────────────────────────────────────────
    /// No temp file could be created in the temp directory.
    #[error("Failed to create a temp file in '{}': {source}", dir.display())]
    WorkspaceAllocation {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying standard input into the temp file failed.
    #[error("Failed to write PostScript input to '{}': {source}", path.display())]
    InputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // ── Ghostscript ───────────────────────────────────────────────────────
    /// The interpreter ran and reported a failure.
    #[error("Ghostscript error code {code}.")]
    Ghostscript { code: i32 },

    /// The Ghostscript library could not be located or bound.
    #[error("Ghostscript is not available")]
    LibraryUnavailable(#[source] gsapi_auto::GsError),

    // ── UI ────────────────────────────────────────────────────────────────
    /// The notification thread could not be started or stopped responding.
    #[error("Notification presenter unavailable: {0}")]
    PresenterUnavailable(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<gsapi_auto::GsError> for ScribeError {
    fn from(e: gsapi_auto::GsError) -> Self {
        match e {
            gsapi_auto::GsError::Api { code, .. } => ScribeError::Ghostscript { code },
            gsapi_auto::GsError::InvalidArgument { argument } => {
                ScribeError::Internal(format!("Ghostscript argument contains NUL: {argument:?}"))
            }
            other => ScribeError::LibraryUnavailable(other),
        }
    }
}
