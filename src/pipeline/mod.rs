//! Pipeline stages for one PostScript → PDF job.
//!
//! Each submodule implements exactly one step and returns a
//! [`crate::error::ScribeError`] on failure; sequencing, classification and
//! cleanup belong to [`crate::job`].
//!
//! ## Data Flow
//!
//! ```text
//! workspace ──▶ relay ──▶ invoke ──▶ workspace
//! (allocate,    (stdin →   (Ghostscript  (remove
//!  clear out)    temp .ps)  pdfwrite)     temp .ps)
//! ```
//!
//! 1. [`workspace`] allocates the unique temp input and removes a stale PDF
//!    from the fixed output path
//! 2. [`relay`] copies standard input into the temp input verbatim
//! 3. [`invoke`] runs Ghostscript once with the fixed argument set
//! 4. [`workspace`] removes the temp input, best effort

pub mod invoke;
pub mod relay;
pub mod workspace;
