//! # gsapi-auto
//!
//! Locate and drive the [Ghostscript](https://ghostscript.com/) C API at
//! runtime, so that callers never link against `libgs` at build time and a
//! missing installation surfaces as an ordinary error instead of a loader
//! failure at process start.
//!
//! ## How it works
//!
//! On the first call to [`Ghostscript::load`]:
//!
//! 1. Uses `GHOSTSCRIPT_LIB_PATH` if it names an existing file.
//! 2. On Windows, scans `%ProgramFiles%\gs\gs*\bin\` (newest version first).
//! 3. Falls back to the platform library names on the system loader path.
//! 4. Resolves every `gsapi_*` entry point up front.
//!
//! The path that loaded successfully is cached for the rest of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gsapi_auto::Ghostscript;
//!
//! let gs = Ghostscript::load().expect("Ghostscript unavailable");
//! gs.run(&["-dBATCH", "-dNOPAUSE", "-sDEVICE=pdfwrite", "-sOutputFile=out.pdf", "in.ps"])
//!     .expect("conversion failed");
//! ```
//!
//! ## Platform support
//!
//! | OS      | Arch            | Library                         |
//! |---------|-----------------|---------------------------------|
//! | Windows | x86_64, aarch64 | `gsdll64.dll`                   |
//! | Windows | x86             | `gsdll32.dll`                   |
//! | macOS   | any             | `libgs.dylib`, `libgs.10.dylib` |
//! | Linux   | any             | `libgs.so.10`, `libgs.so`       |

use std::ffi::{c_char, c_int, c_long, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::{Mutex, OnceLock, PoisonError};

use libloading::Library;
use thiserror::Error;
use tracing::{debug, info};

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable naming an explicit Ghostscript library to load.
pub const LIB_PATH_ENV: &str = "GHOSTSCRIPT_LIB_PATH";

/// `argv[0]` handed to `gsapi_init_with_args`; Ghostscript ignores it.
pub const PROGRAM_NAME: &str = "gs";

/// Returned by Ghostscript when the interpreter executed `quit`. Not an error.
pub const GS_ERROR_QUIT: i32 = -101;

const GS_ARG_ENCODING_UTF8: c_int = 1;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by gsapi-auto operations.
#[derive(Error, Debug)]
pub enum GsError {
    /// The current OS/architecture combination has no known library name.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No candidate library could be loaded.
    #[error("Ghostscript library not found (tried: {})", tried.join(", "))]
    NotFound { tried: Vec<String> },

    /// The library file exists but could not be loaded.
    #[error("Failed to load Ghostscript from '{path}': {reason}")]
    Load { path: PathBuf, reason: String },

    /// The library loaded but lacks a required `gsapi_*` entry point.
    #[error("Ghostscript library '{path}' has no symbol '{symbol}'")]
    MissingSymbol { path: PathBuf, symbol: String },

    /// An argument contains an interior NUL byte and cannot cross the C API.
    #[error("Argument contains a NUL byte: {argument:?}")]
    InvalidArgument { argument: String },

    /// A `gsapi_*` call returned a negative status code.
    #[error("{call} failed with Ghostscript error code {code}")]
    Api { call: &'static str, code: i32 },
}

impl GsError {
    /// The native status code, if this error came from the interpreter itself.
    pub fn code(&self) -> Option<i32> {
        match self {
            GsError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// Library file names to try for the current platform, in preference order.
pub fn library_names() -> Result<&'static [&'static str], GsError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    match (os, arch) {
        ("windows", "x86_64") | ("windows", "aarch64") => Ok(&["gsdll64.dll"]),
        ("windows", "x86") => Ok(&["gsdll32.dll"]),
        ("macos", _) => Ok(&["libgs.dylib", "libgs.10.dylib", "libgs.9.dylib"]),
        ("linux", _) | ("freebsd", _) | ("openbsd", _) | ("netbsd", _) => {
            Ok(&["libgs.so.10", "libgs.so.9", "libgs.so"])
        }
        (os, arch) => Err(GsError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }),
    }
}

// ── Candidate resolution ─────────────────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Ghostscript instances are process-global in most builds.
static INSTANCE_LOCK: Mutex<()> = Mutex::new(());

/// Ordered list of library locations to try.
///
/// An explicit path is returned alone: if the caller named a library, silently
/// loading a different one would hide the misconfiguration.
pub fn library_candidates(explicit: Option<&Path>) -> Result<Vec<PathBuf>, GsError> {
    if let Some(path) = explicit {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut candidates = Vec::new();

    if let Some(cached) = RESOLVED_PATH.get() {
        candidates.push(cached.clone());
    }

    if let Ok(env_path) = std::env::var(LIB_PATH_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_file() {
            candidates.push(p);
        } else {
            debug!("{LIB_PATH_ENV} '{}' does not exist; ignoring", p.display());
        }
    }

    let names = library_names()?;

    if cfg!(windows) {
        candidates.extend(windows_install_candidates(names));
    }

    // Bare names: let the platform loader search its own path.
    candidates.extend(names.iter().map(PathBuf::from));
    candidates.dedup();

    Ok(candidates)
}

/// Scan `%ProgramFiles%\gs\gs<version>\bin` directories, newest first.
fn windows_install_candidates(names: &[&str]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = ["ProgramW6432", "ProgramFiles"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|dir| PathBuf::from(dir).join("gs"))
        .collect();
    roots.dedup();

    let mut version_dirs: Vec<PathBuf> = roots
        .iter()
        .filter_map(|root| std::fs::read_dir(root).ok())
        .flat_map(|entries| entries.filter_map(Result::ok))
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("gs"))
        })
        .collect();
    // Lexically gs9.x sorts after gs10.x; compare numeric components.
    version_dirs.sort_by_key(|p| std::cmp::Reverse(version_key(p)));

    version_dirs
        .into_iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join("bin").join(name)))
        .filter(|p| p.is_file())
        .collect()
}

fn version_key(dir: &Path) -> Vec<u32> {
    dir.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.trim_start_matches("gs"))
        .unwrap_or_default()
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

// ── FFI surface ──────────────────────────────────────────────────────────────

// GSDLLAPI is __stdcall on 32-bit Windows and the C convention elsewhere,
// which is exactly what `extern "system"` selects.
type NewInstanceFn = unsafe extern "system" fn(*mut *mut c_void, *mut c_void) -> c_int;
type SetArgEncodingFn = unsafe extern "system" fn(*mut c_void, c_int) -> c_int;
type InitWithArgsFn = unsafe extern "system" fn(*mut c_void, c_int, *mut *mut c_char) -> c_int;
type ExitFn = unsafe extern "system" fn(*mut c_void) -> c_int;
type DeleteInstanceFn = unsafe extern "system" fn(*mut c_void);
type RevisionFn = unsafe extern "system" fn(*mut RawRevision, c_int) -> c_int;

#[repr(C)]
struct RawRevision {
    product: *const c_char,
    _copyright: *const c_char,
    revision: c_long,
    revisiondate: c_long,
}

/// Product information reported by `gsapi_revision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub product: String,
    pub revision: i64,
    pub revision_date: i64,
}

/// A loaded Ghostscript library with all entry points resolved.
pub struct Ghostscript {
    path: PathBuf,
    new_instance: NewInstanceFn,
    set_arg_encoding: SetArgEncodingFn,
    init_with_args: InitWithArgsFn,
    exit: ExitFn,
    delete_instance: DeleteInstanceFn,
    revision: RevisionFn,
    // Must outlive every function pointer above.
    _library: Library,
}

impl std::fmt::Debug for Ghostscript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ghostscript").field("path", &self.path).finish()
    }
}

impl Ghostscript {
    /// Load Ghostscript from the first candidate location that works.
    pub fn load() -> Result<Self, GsError> {
        Self::load_with(None)
    }

    /// Load Ghostscript, preferring `explicit` when given.
    pub fn load_with(explicit: Option<&Path>) -> Result<Self, GsError> {
        let candidates = library_candidates(explicit)?;
        let mut tried = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match Self::load_from(&candidate) {
                Ok(gs) => {
                    let _ = RESOLVED_PATH.set(candidate);
                    return Ok(gs);
                }
                Err(e) => {
                    debug!("Ghostscript candidate rejected: {e}");
                    tried.push(candidate.display().to_string());
                    if explicit.is_some() {
                        return Err(e);
                    }
                }
            }
        }

        Err(GsError::NotFound { tried })
    }

    /// Load Ghostscript from an explicit `path`, bypassing the search.
    pub fn load_from(path: &Path) -> Result<Self, GsError> {
        // SAFETY: loading Ghostscript runs only its library initialisers, which
        // do not depend on state owned by this process.
        let library = unsafe { Library::new(path) }.map_err(|e| GsError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // SAFETY: each signature matches the declaration in Ghostscript's iapi.h.
        let gs = unsafe {
            Ghostscript {
                new_instance: resolve(&library, path, b"gsapi_new_instance\0")?,
                set_arg_encoding: resolve(&library, path, b"gsapi_set_arg_encoding\0")?,
                init_with_args: resolve(&library, path, b"gsapi_init_with_args\0")?,
                exit: resolve(&library, path, b"gsapi_exit\0")?,
                delete_instance: resolve(&library, path, b"gsapi_delete_instance\0")?,
                revision: resolve(&library, path, b"gsapi_revision\0")?,
                path: path.to_path_buf(),
                _library: library,
            }
        };

        info!("Loaded Ghostscript from {}", gs.path.display());
        Ok(gs)
    }

    /// The file this library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query product name and revision.
    pub fn revision(&self) -> Result<Revision, GsError> {
        let mut raw = RawRevision {
            product: ptr::null(),
            _copyright: ptr::null(),
            revision: 0,
            revisiondate: 0,
        };
        let size = std::mem::size_of::<RawRevision>() as c_int;

        // SAFETY: `raw` is a valid, writable gsapi_revision_t of `size` bytes.
        let code = unsafe { (self.revision)(&mut raw, size) };
        if code != 0 {
            return Err(GsError::Api {
                call: "gsapi_revision",
                code,
            });
        }

        // SAFETY: on success Ghostscript fills the string pointers with static,
        // NUL-terminated strings (or leaves them null).
        let text = |p: *const c_char| {
            if p.is_null() {
                String::new()
            } else {
                unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
            }
        };

        Ok(Revision {
            product: text(raw.product),
            revision: raw.revision as i64,
            revision_date: raw.revisiondate as i64,
        })
    }

    /// Run one interpreter instance to completion with `args`.
    ///
    /// `args` excludes `argv[0]`; [`PROGRAM_NAME`] is prepended. Blocks until
    /// Ghostscript returns. A `quit` from the interpreter counts as success.
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<(), GsError> {
        let owned = build_argv(args)?;
        let mut argv: Vec<*mut c_char> = owned.iter().map(|a| a.as_ptr() as *mut c_char).collect();
        let argc = argv.len() as c_int;

        let _guard = INSTANCE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let mut instance: *mut c_void = ptr::null_mut();
        // SAFETY: `instance` is a valid out-pointer; no caller handle is used.
        let code = unsafe { (self.new_instance)(&mut instance, ptr::null_mut()) };
        if code < 0 {
            return Err(GsError::Api {
                call: "gsapi_new_instance",
                code,
            });
        }

        // SAFETY: `instance` was produced by gsapi_new_instance above and is
        // deleted exactly once at the end of this block. `argv` points into
        // `owned`, which outlives the call.
        let code = unsafe {
            let encoding = (self.set_arg_encoding)(instance, GS_ARG_ENCODING_UTF8);
            if encoding < 0 {
                (self.delete_instance)(instance);
                return Err(GsError::Api {
                    call: "gsapi_set_arg_encoding",
                    code: encoding,
                });
            }

            let mut code = (self.init_with_args)(instance, argc, argv.as_mut_ptr());
            let exit_code = (self.exit)(instance);
            if code == 0 || code == GS_ERROR_QUIT {
                code = exit_code;
            }
            (self.delete_instance)(instance);
            code
        };

        if code == 0 || code == GS_ERROR_QUIT {
            debug!("Ghostscript finished ({} arguments)", argc - 1);
            Ok(())
        } else {
            Err(GsError::Api {
                call: "gsapi_init_with_args",
                code,
            })
        }
    }
}

/// Build the NUL-terminated argument vector, `argv[0]` included.
pub fn build_argv<S: AsRef<str>>(args: &[S]) -> Result<Vec<CString>, GsError> {
    std::iter::once(PROGRAM_NAME)
        .chain(args.iter().map(AsRef::as_ref))
        .map(|a| {
            CString::new(a).map_err(|_| GsError::InvalidArgument {
                argument: a.to_string(),
            })
        })
        .collect()
}

unsafe fn resolve<T: Copy>(library: &Library, path: &Path, name: &[u8]) -> Result<T, GsError> {
    library
        .get::<T>(name)
        .map(|symbol| *symbol)
        .map_err(|_| GsError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name)).into_owned(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_names_nonempty() {
        let names = library_names().expect("current platform should be supported");
        assert!(!names.is_empty());
        assert!(names.iter().all(|n| !n.is_empty()));
    }

    #[test]
    fn explicit_path_is_the_only_candidate() {
        let explicit = PathBuf::from("/opt/custom/libgs.so");
        let c = library_candidates(Some(&explicit)).unwrap();
        assert_eq!(c, vec![explicit]);
    }

    #[test]
    fn bare_names_are_always_tried() {
        let c = library_candidates(None).unwrap();
        for name in library_names().unwrap() {
            assert!(c.contains(&PathBuf::from(name)), "missing {name}");
        }
    }

    #[test]
    fn missing_env_override_is_ignored() {
        std::env::set_var(LIB_PATH_ENV, "/nonexistent/gs/libgs-missing.so");
        let c = library_candidates(None).unwrap();
        std::env::remove_var(LIB_PATH_ENV);
        assert!(!c.contains(&PathBuf::from("/nonexistent/gs/libgs-missing.so")));
    }

    #[test]
    fn loading_a_non_library_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("libgs-bogus.so");
        std::fs::write(&bogus, b"not a shared object").unwrap();

        let err = Ghostscript::load_with(Some(&bogus)).unwrap_err();
        assert!(matches!(err, GsError::Load { .. }), "got: {err}");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn argv_gets_program_name() {
        let argv = build_argv(&["-dBATCH", "in.ps"]).unwrap();
        let as_str: Vec<&str> = argv.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(as_str, vec![PROGRAM_NAME, "-dBATCH", "in.ps"]);
    }

    #[test]
    fn argv_rejects_interior_nul() {
        let err = build_argv(&["bad\0arg"]).unwrap_err();
        assert!(matches!(err, GsError::InvalidArgument { .. }));
    }

    #[test]
    fn api_error_exposes_code() {
        let e = GsError::Api {
            call: "gsapi_init_with_args",
            code: -100,
        };
        assert_eq!(e.code(), Some(-100));
        assert!(e.to_string().contains("-100"));
    }

    #[test]
    fn version_dirs_compare_numerically() {
        assert!(version_key(Path::new("gs10.03.1")) > version_key(Path::new("gs9.56.1")));
    }
}
