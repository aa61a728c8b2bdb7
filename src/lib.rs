//! # pdfscribe
//!
//! Postprocessor for a virtual PDF printer port: PostScript arrives on
//! standard input, a PDF is written to a well-known path in the temp
//! directory.
//!
//! ## Job Overview
//!
//! ```text
//! stdin (PostScript)
//!  │
//!  ├─ 1. UI        start the notification thread, show activity
//!  ├─ 2. Clear     delete a stale <temp>/OAISISSOFTSCAN.PDF
//!  ├─ 3. Relay     copy stdin into a unique temp .ps file
//!  ├─ 4. Convert   one Ghostscript pdfwrite call via the C API
//!  ├─ 5. Report    on failure: log, then a modal error dialog
//!  └─ 6. Teardown  remove the temp .ps, close the UI
//! ```
//!
//! Failures never escape [`run_job`]; they are classified into a
//! [`JobOutcome`] and reported through the [`NotificationSurface`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfscribe::{convert_stdin, NoopSurface, ScribeConfig};
//!
//! let report = convert_stdin(&ScribeConfig::default(), Box::new(NoopSurface));
//! eprintln!("{:?} in {}ms", report.outcome, report.duration_ms);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfscribe` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `native-dialogs` | on | Error dialogs as native message boxes (rfd); `--console` opts out |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfscribe = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod fault;
pub mod job;
pub mod outcome;
pub mod pipeline;
pub mod presenter;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ScribeConfig, ScribeConfigBuilder};
pub use error::ScribeError;
pub use job::{convert_stdin, run_job, JobReport, JobState};
pub use outcome::{FailureKind, JobOutcome, WriteFailureKind};
pub use pipeline::invoke::{ConversionJob, GhostscriptConverter, PostScriptConverter};
pub use presenter::{ErrorDialog, NoopSurface, NotificationPresenter, NotificationSurface};
