//! Stream relay: copy the PostScript job from stdin into the temp input file.
//!
//! The bytes are copied verbatim until end of stream. There is no size cap and
//! no inspection; rejecting malformed PostScript is Ghostscript's job.

use crate::error::ScribeError;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::debug;

/// Copy everything from `source` into a fresh file at `dest`.
///
/// `dest` is created or truncated. Both `source` and the file handle are
/// dropped before this returns, on success and on error.
///
/// # Returns
/// Number of bytes written.
pub fn relay<R: Read>(mut source: R, dest: &Path) -> Result<u64, ScribeError> {
    let write_err = |source: io::Error| ScribeError::InputWrite {
        path: dest.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)
        .map_err(write_err)?;

    let bytes = io::copy(&mut source, &mut file).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    debug!("Relayed {} bytes to {}", bytes, dest.display());
    Ok(bytes)
}
