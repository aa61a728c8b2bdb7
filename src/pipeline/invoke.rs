//! Conversion invoker: one synchronous Ghostscript call per job.
//!
//! The argument set is fixed. [`PostScriptConverter`] is the seam between the
//! orchestrator and the library so the lifecycle can be driven without a
//! Ghostscript install.

use crate::error::ScribeError;
use gsapi_auto::Ghostscript;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Build the Ghostscript argument vector for `input` → `output`.
///
/// `argv[0]` is not included; the library binding adds it. Arguments cross
/// the C API as UTF-8; a path that is not valid UTF-8 is an error.
pub fn ghostscript_arguments(output: &Path, input: &Path) -> Result<Vec<String>, ScribeError> {
    Ok(vec![
        "-dBATCH".to_string(),
        "-dNOPAUSE".to_string(),
        "-dSAFER".to_string(),
        "-sDEVICE=pdfwrite".to_string(),
        format!("-sOutputFile={}", utf8_path(output)?),
        utf8_path(input)?.to_string(),
    ])
}

fn utf8_path(path: &Path) -> Result<&str, ScribeError> {
    path.to_str().ok_or_else(|| {
        ScribeError::Internal(format!(
            "Path is not valid UTF-8 and cannot be passed to Ghostscript: {}",
            path.display()
        ))
    })
}

/// One PostScript → PDF conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub arguments: Vec<String>,
}

impl ConversionJob {
    pub fn new(input_path: &Path, output_path: &Path) -> Result<Self, ScribeError> {
        Ok(Self {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            arguments: ghostscript_arguments(output_path, input_path)?,
        })
    }

    /// Run the conversion. Called exactly once; nothing is retried.
    pub fn run(&self, converter: &dyn PostScriptConverter) -> Result<(), ScribeError> {
        info!(
            "Converting {} -> {}",
            self.input_path.display(),
            self.output_path.display()
        );
        converter.convert(&self.arguments)
    }
}

/// Something that can run Ghostscript-style arguments.
pub trait PostScriptConverter {
    /// Run a single conversion with `arguments` (no `argv[0]`). Blocks until
    /// done. A non-zero library code is [`ScribeError::Ghostscript`].
    fn convert(&self, arguments: &[String]) -> Result<(), ScribeError>;
}

/// Converter backed by the Ghostscript shared library.
///
/// The library is bound on each call, so a missing install only fails the
/// job that needs it.
#[derive(Debug, Clone, Default)]
pub struct GhostscriptConverter {
    library: Option<PathBuf>,
}

impl GhostscriptConverter {
    /// Search the usual locations for the library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the library at `path` instead of searching.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library: Some(path.into()),
        }
    }
}

impl PostScriptConverter for GhostscriptConverter {
    fn convert(&self, arguments: &[String]) -> Result<(), ScribeError> {
        let gs = Ghostscript::load_with(self.library.as_deref())?;

        match gs.revision() {
            Ok(rev) => debug!(
                "Using {} revision {} from {}",
                rev.product,
                rev.revision,
                gs.path().display()
            ),
            Err(e) => warn!("Could not query Ghostscript revision: {e}"),
        }

        gs.run(arguments)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<Vec<String>>>,
        code: Option<i32>,
    }

    impl PostScriptConverter for Recorder {
        fn convert(&self, arguments: &[String]) -> Result<(), ScribeError> {
            self.calls.borrow_mut().push(arguments.to_vec());
            match self.code {
                Some(code) => Err(ScribeError::Ghostscript { code }),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn arguments_are_fixed_and_ordered() {
        let args = ghostscript_arguments(
            Path::new("/tmp/OAISISSOFTSCAN.PDF"),
            Path::new("/tmp/pdfscribe123.ps"),
        )
        .unwrap();
        assert_eq!(
            args,
            vec![
                "-dBATCH",
                "-dNOPAUSE",
                "-dSAFER",
                "-sDEVICE=pdfwrite",
                "-sOutputFile=/tmp/OAISISSOFTSCAN.PDF",
                "/tmp/pdfscribe123.ps",
            ]
        );
    }

    #[test]
    fn paths_with_spaces_stay_single_arguments() {
        let args = ghostscript_arguments(
            Path::new("/tmp/my docs/out.pdf"),
            Path::new("/tmp/my docs/in.ps"),
        )
        .unwrap();
        assert_eq!(args.len(), 6);
        assert_eq!(args[4], "-sOutputFile=/tmp/my docs/out.pdf");
        assert_eq!(args[5], "/tmp/my docs/in.ps");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = Path::new("/tmp").join(OsStr::from_bytes(b"spool\xff"));
        let err = ghostscript_arguments(&dir.join("out.pdf"), Path::new("/tmp/in.ps")).unwrap_err();
        assert!(matches!(err, ScribeError::Internal(_)), "got {err}");

        let err = ConversionJob::new(&dir.join("in.ps"), Path::new("/tmp/out.pdf")).unwrap_err();
        assert!(matches!(err, ScribeError::Internal(_)), "got {err}");
    }

    #[test]
    fn job_invokes_converter_once() {
        let job = ConversionJob::new(Path::new("in.ps"), Path::new("out.pdf")).unwrap();
        let recorder = Recorder::default();

        job.run(&recorder).unwrap();

        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], job.arguments);
    }

    #[test]
    fn converter_code_is_propagated() {
        let job = ConversionJob::new(Path::new("in.ps"), Path::new("out.pdf")).unwrap();
        let recorder = Recorder {
            code: Some(-100),
            ..Default::default()
        };
        let err = job.run(&recorder).unwrap_err();
        assert!(matches!(err, ScribeError::Ghostscript { code: -100 }));
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    #[test]
    fn missing_library_is_library_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let converter = GhostscriptConverter::with_library(dir.path().join("libgs-missing.so"));
        let err = converter.convert(&[]).unwrap_err();
        assert!(
            matches!(err, ScribeError::LibraryUnavailable(_)),
            "got {err}"
        );
    }
}
