//! Job outcome, failure taxonomy, and the user-facing error text.
//!
//! Every run produces exactly one [`JobOutcome`]. The outcome alone decides
//! which dialog the user sees, so the message templates live here next to
//! the classification rather than in the UI code.

use crate::error::ScribeError;
use crate::fault::Fault;
use crate::presenter::ErrorDialog;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

// ── Message templates ────────────────────────────────────────────────────

/// Caption of every error dialog.
pub const DIALOG_CAPTION: &str = "PDF Scribe";

pub const INSTRUCTION_PDF_GENERATION: &str = "There was a PDF generation error.";
pub const INSTRUCTION_COULD_NOT_WRITE: &str = "Could not create the output file.";
pub const INSTRUCTION_UNEXPECTED: &str =
    "There was an unexpected, and unhandled error in PDF Scribe.";

/// Detail line for a conversion failure carrying Ghostscript's native code.
pub fn ghostscript_error_text(code: i32) -> String {
    format!("Ghostscript error code {code}.")
}

/// Detail line for an output file locked by another process.
pub fn file_in_use_text(path: &std::path::Path) -> String {
    format!("{} is being used by another process.", path.display())
}

// ── Outcome ──────────────────────────────────────────────────────────────

/// Why writing a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailureKind {
    /// Another process holds the file open.
    InUse,
    /// Read-only file, ACL denial, or read-only filesystem.
    Unauthorized,
    /// Any other I/O failure (disk full, broken pipe, …).
    Io,
}

/// The four error kinds a failed job can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InputOutput,
    Permission,
    ConversionLibrary,
    Unexpected,
}

/// Result of one conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Ghostscript returned normally; the PDF is at the output path.
    Success,
    /// Deleting the stale output, creating the temp input, or relaying stdin
    /// into it failed.
    InputWriteFailed {
        kind: WriteFailureKind,
        path: PathBuf,
        reason: String,
    },
    /// Ghostscript ran and reported a failure.
    ConversionFailed { code: i32 },
    /// Anything else, including panics caught at the job boundary.
    UnexpectedFailure { message: String, trace: String },
}

impl JobOutcome {
    /// Fold a stage error into an outcome.
    pub fn from_error(error: &ScribeError) -> Self {
        match error {
            ScribeError::OutputInUse { path, source } => JobOutcome::InputWriteFailed {
                kind: WriteFailureKind::InUse,
                path: path.clone(),
                reason: source.to_string(),
            },
            ScribeError::OutputAccessDenied { path, source } => JobOutcome::InputWriteFailed {
                kind: WriteFailureKind::Unauthorized,
                path: path.clone(),
                reason: source.to_string(),
            },
            ScribeError::WorkspaceAllocation { dir: path, source }
            | ScribeError::InputWrite { path, source } => JobOutcome::InputWriteFailed {
                kind: write_failure_kind(source),
                path: path.clone(),
                reason: source.to_string(),
            },
            ScribeError::Ghostscript { code } => JobOutcome::ConversionFailed { code: *code },
            // Unclassified delete failures, missing library, UI and config
            // problems all surface as unexpected.
            other => JobOutcome::UnexpectedFailure {
                message: other.to_string(),
                trace: source_chain(other),
            },
        }
    }

    /// Outcome for a panic caught at the job boundary.
    pub fn from_fault(fault: Fault) -> Self {
        JobOutcome::UnexpectedFailure {
            message: fault.message,
            trace: fault.trace,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }

    /// Project the outcome onto the error taxonomy. `None` on success.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            JobOutcome::Success => None,
            JobOutcome::InputWriteFailed { kind, .. } => Some(match kind {
                WriteFailureKind::Unauthorized => FailureKind::Permission,
                WriteFailureKind::InUse | WriteFailureKind::Io => FailureKind::InputOutput,
            }),
            JobOutcome::ConversionFailed { .. } => Some(FailureKind::ConversionLibrary),
            JobOutcome::UnexpectedFailure { .. } => Some(FailureKind::Unexpected),
        }
    }

    /// The dialog to show for this outcome. `None` on success.
    pub fn dialog(&self) -> Option<ErrorDialog> {
        let (instruction, detail) = match self {
            JobOutcome::Success => return None,
            JobOutcome::InputWriteFailed {
                kind: WriteFailureKind::InUse,
                path,
                ..
            } => (INSTRUCTION_COULD_NOT_WRITE, Some(file_in_use_text(path))),
            JobOutcome::InputWriteFailed { .. } => (INSTRUCTION_COULD_NOT_WRITE, None),
            JobOutcome::ConversionFailed { code } => {
                (INSTRUCTION_PDF_GENERATION, Some(ghostscript_error_text(*code)))
            }
            JobOutcome::UnexpectedFailure { message, trace } => {
                let detail = if trace.is_empty() {
                    message.clone()
                } else {
                    format!("{message}\n{trace}")
                };
                (INSTRUCTION_UNEXPECTED, Some(detail))
            }
        };

        Some(ErrorDialog {
            caption: DIALOG_CAPTION.to_string(),
            instruction: instruction.to_string(),
            detail,
        })
    }
}

fn write_failure_kind(e: &io::Error) -> WriteFailureKind {
    match e.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            WriteFailureKind::Unauthorized
        }
        _ => WriteFailureKind::Io,
    }
}

/// Render the `source()` chain below `error`, one cause per line.
fn source_chain(error: &dyn StdError) -> String {
    let mut lines = Vec::new();
    let mut current = error.source();
    while let Some(cause) = current {
        lines.push(format!("caused by: {cause}"));
        current = cause.source();
    }
    lines.join("\n")
}
