//! Configuration for a conversion job.
//!
//! The process contract has no required configuration: a default
//! [`ScribeConfig`] produces exactly the behaviour the printer port expects
//! (temp input in the system temp dir, output at
//! `<temp>/OAISISSOFTSCAN.PDF`). The knobs exist so the binary can point at a
//! specific Ghostscript build and so tests can run inside a scratch directory.

use crate::error::ScribeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name downstream tooling expects to find in the temp directory.
pub const DEFAULT_OUTPUT_FILENAME: &str = "OAISISSOFTSCAN.PDF";

/// Prefix for the temp file holding the relayed PostScript.
pub const DEFAULT_INPUT_PREFIX: &str = "pdfscribe";

/// Configuration for one conversion job.
///
/// Built via [`ScribeConfig::builder()`] or [`ScribeConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfscribe::ScribeConfig;
///
/// let config = ScribeConfig::builder()
///     .temp_dir("/var/tmp")
///     .build()
///     .unwrap();
/// assert!(config.output_path().ends_with("OAISISSOFTSCAN.PDF"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// Directory holding both the temp input and the output. Default: the
    /// system temp directory.
    pub temp_dir: PathBuf,

    /// Output file name inside `temp_dir`. Default: `OAISISSOFTSCAN.PDF`.
    pub output_filename: String,

    /// Prefix of the uniquely named temp input file. Default: `pdfscribe`.
    pub input_prefix: String,

    /// Explicit Ghostscript library. If None, `gsapi-auto` searches for one.
    pub ghostscript_library: Option<PathBuf>,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            input_prefix: DEFAULT_INPUT_PREFIX.to_string(),
            ghostscript_library: None,
        }
    }
}

impl ScribeConfig {
    /// Create a new builder for `ScribeConfig`.
    pub fn builder() -> ScribeConfigBuilder {
        ScribeConfigBuilder {
            config: Self::default(),
        }
    }

    /// The well-known output path: `temp_dir / output_filename`.
    pub fn output_path(&self) -> PathBuf {
        self.temp_dir.join(&self.output_filename)
    }
}

/// Builder for [`ScribeConfig`].
#[derive(Debug)]
pub struct ScribeConfigBuilder {
    config: ScribeConfig,
}

impl ScribeConfigBuilder {
    pub fn temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.temp_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn output_filename(mut self, name: impl Into<String>) -> Self {
        self.config.output_filename = name.into();
        self
    }

    pub fn input_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.input_prefix = prefix.into();
        self
    }

    pub fn ghostscript_library(mut self, path: impl AsRef<Path>) -> Self {
        self.config.ghostscript_library = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScribeConfig, ScribeError> {
        let c = &self.config;
        if c.output_filename.trim().is_empty() {
            return Err(ScribeError::InvalidConfig(
                "Output file name must not be empty".into(),
            ));
        }
        let bare = Path::new(&c.output_filename)
            .file_name()
            .and_then(|n| n.to_str())
            == Some(c.output_filename.as_str());
        if !bare || c.output_filename.contains(['/', '\\']) {
            return Err(ScribeError::InvalidConfig(format!(
                "Output file name must be a bare file name, got '{}'",
                c.output_filename
            )));
        }
        if c.input_prefix.contains(['/', '\\']) {
            return Err(ScribeError::InvalidConfig(format!(
                "Input prefix must not contain path separators, got '{}'",
                c.input_prefix
            )));
        }
        Ok(self.config)
    }
}
