//! CLI binary for pdfscribe.
//!
//! The printer port runs this with no arguments and PostScript on stdin.
//! Flags only tune diagnostics and the Ghostscript location.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfscribe::{convert_stdin, ErrorDialog, NotificationSurface, ScribeConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal surface using indicatif ─────────────────────────────────────────

/// Spinner on stderr while the job runs; errors printed above it.
///
/// Lives on the presenter's UI thread, so the spinner is created there too.
struct ConsoleSurface {
    bar: Option<ProgressBar>,
    spinner: bool,
    quiet: bool,
}

impl ConsoleSurface {
    fn new(spinner: bool, quiet: bool) -> Self {
        Self {
            bar: None,
            spinner,
            quiet,
        }
    }

    fn print(&self, text: String) {
        match &self.bar {
            Some(bar) => bar.suspend(|| eprintln!("{text}")),
            None => eprintln!("{text}"),
        }
    }
}

impl NotificationSurface for ConsoleSurface {
    fn show_activity(&mut self) {
        if !self.spinner {
            return;
        }
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("PDF Scribe");
        bar.set_message("Creating PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(bar);
    }

    fn show_error(&mut self, dialog: &ErrorDialog) {
        if self.quiet {
            return;
        }
        let mut text = format!(
            "{} {}: {}",
            red("✗"),
            bold(&dialog.caption),
            dialog.instruction
        );
        if let Some(detail) = &dialog.detail {
            for line in detail.lines() {
                text.push_str(&format!("\n  {}", dim(line)));
            }
        }
        self.print(text);
    }

    fn close_all(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

// ── Native message boxes using rfd ───────────────────────────────────────────

/// Console spinner for activity, native message box for errors.
#[cfg(feature = "native-dialogs")]
struct NativeSurface {
    console: ConsoleSurface,
}

#[cfg(feature = "native-dialogs")]
impl NotificationSurface for NativeSurface {
    fn show_activity(&mut self) {
        self.console.show_activity();
    }

    fn show_error(&mut self, dialog: &ErrorDialog) {
        let description = match &dialog.detail {
            Some(detail) => format!("{}\n\n{detail}", dialog.instruction),
            None => dialog.instruction.clone(),
        };
        // Blocks until the user dismisses the box.
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(&dialog.caption)
            .set_description(description)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }

    fn close_all(&mut self) {
        self.console.close_all();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # What the printer port does
  pdfscribe < job.ps

  # Use a specific Ghostscript build and print the job report
  pdfscribe --gs-lib /opt/gs/lib/libgs.so.10 --json < job.ps

  # Report errors on the terminal instead of in a message box
  pdfscribe --console < job.ps

OUTPUT:
  The PDF is always written to <temp dir>/OAISISSOFTSCAN.PDF, replacing any
  previous file. The process exits 0 once the job has finished, whether or not
  the conversion succeeded; failures are shown in a message box (or on stderr
  with --console) and in the log.

GHOSTSCRIPT:
  The library is searched for in GHOSTSCRIPT_LIB_PATH, then (on Windows) under
  Program Files\gs\gs*\bin, then by name on the system loader path.
"#;

/// Convert a PostScript print job on stdin to a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfscribe",
    version,
    about = "Convert a PostScript print job on stdin to a PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Ghostscript shared library to load instead of searching for one.
    #[arg(long, env = "PDFSCRIBE_GS_LIB")]
    gs_lib: Option<PathBuf>,

    /// Print the job report as JSON to stdout.
    #[arg(long, env = "PDFSCRIBE_JSON")]
    json: bool,

    /// Disable the activity spinner.
    #[arg(long, env = "PDFSCRIBE_NO_PROGRESS")]
    no_progress: bool,

    /// Report errors on stderr instead of in a native message box.
    #[arg(long, env = "PDFSCRIBE_CONSOLE")]
    console: bool,

    /// Enable debug logging.
    #[arg(short, long, env = "PDFSCRIBE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors in the log.
    #[arg(short, long, env = "PDFSCRIBE_QUIET")]
    quiet: bool,
}

/// Where error dialogs are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceKind {
    Console,
    #[cfg(feature = "native-dialogs")]
    Native,
}

impl Cli {
    /// The printer port starts us without a console, so errors go to a
    /// modal message box unless `--console` is given.
    fn surface_kind(&self) -> SurfaceKind {
        #[cfg(feature = "native-dialogs")]
        if !self.console {
            return SurfaceKind::Native;
        }
        SurfaceKind::Console
    }

    fn surface(&self, show_progress: bool) -> Box<dyn NotificationSurface> {
        let console = ConsoleSurface::new(show_progress, self.quiet);
        match self.surface_kind() {
            SurfaceKind::Console => Box::new(console),
            #[cfg(feature = "native-dialogs")]
            SurfaceKind::Native => Box::new(NativeSurface { console }),
        }
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep the log quiet under the spinner; the error dialog already tells
    // the user what went wrong.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Config ───────────────────────────────────────────────────────────
    let mut builder = ScribeConfig::builder();
    if let Some(lib) = &cli.gs_lib {
        builder = builder.ghostscript_library(lib);
    }
    let config = builder.build().context("Invalid configuration")?;
    tracing::debug!(
        "Config: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    // ── Run ──────────────────────────────────────────────────────────────
    let report = convert_stdin(&config, cli.surface(show_progress));

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && report.is_success() {
        eprintln!(
            "{} {}  {}",
            green("✓"),
            bold(&report.output_path.display().to_string()),
            dim(&format!("{} bytes in, {}ms", report.input_bytes, report.duration_ms)),
        );
    }

    // The port expects exit code 0 for every finished job.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdfscribe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_arguments_is_a_valid_invocation() {
        let cli = parse(&[]);
        assert!(cli.gs_lib.is_none());
        assert!(!cli.json && !cli.quiet && !cli.console);
    }

    #[cfg(feature = "native-dialogs")]
    #[test]
    fn native_dialogs_are_the_default() {
        assert_eq!(parse(&[]).surface_kind(), SurfaceKind::Native);
    }

    #[test]
    fn console_flag_keeps_errors_on_stderr() {
        assert_eq!(parse(&["--console"]).surface_kind(), SurfaceKind::Console);
    }

    #[cfg(not(feature = "native-dialogs"))]
    #[test]
    fn without_native_dialogs_errors_go_to_console() {
        assert_eq!(parse(&[]).surface_kind(), SurfaceKind::Console);
    }
}
