//! Job orchestrator: the single-conversion lifecycle.
//!
//! ```text
//! Idle ─▶ UiStarting ─▶ Running ─┬─▶ Succeeded ─┬─▶ TearingDown ─▶ Terminal
//!                                └─▶ Failed ────┘
//! ```
//!
//! [`run_job`] never returns an error. Every stage failure, and any panic
//! raised while Running, is folded into the [`JobOutcome`] of the returned
//! [`JobReport`]. Teardown runs on every path: the temp input is removed once
//! and the notification presenter is closed once.

use crate::config::ScribeConfig;
use crate::error::ScribeError;
use crate::fault;
use crate::outcome::JobOutcome;
use crate::pipeline::invoke::{ConversionJob, GhostscriptConverter, PostScriptConverter};
use crate::pipeline::relay::relay;
use crate::pipeline::workspace::Workspace;
use crate::presenter::{NotificationPresenter, NotificationSurface};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Lifecycle states of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    UiStarting,
    Running,
    Succeeded,
    Failed,
    TearingDown,
    Terminal,
}

/// Everything a finished job reports.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub outcome: JobOutcome,
    /// States visited, in order, ending with [`JobState::Terminal`].
    pub states: Vec<JobState>,
    /// The temp input, if one was allocated.
    pub input_path: Option<PathBuf>,
    pub output_path: PathBuf,
    /// Bytes relayed from the input stream.
    pub input_bytes: u64,
    /// Whether no temp input is left behind.
    pub input_removed: bool,
    pub duration_ms: u64,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

struct Trail {
    states: Vec<JobState>,
}

impl Trail {
    fn new() -> Self {
        Self {
            states: vec![JobState::Idle],
        }
    }

    fn enter(&mut self, next: JobState) {
        if let Some(prev) = self.states.last() {
            debug!(from = ?prev, to = ?next, "Job state transition");
        }
        self.states.push(next);
    }
}

/// Run one conversion job from `input` to the configured output path.
///
/// `surface` is driven on the presenter's UI thread. `converter` is called at
/// most once, on the calling thread.
pub fn run_job<R: Read>(
    config: &ScribeConfig,
    input: R,
    converter: &dyn PostScriptConverter,
    surface: Box<dyn NotificationSurface>,
) -> JobReport {
    let start = Instant::now();
    let mut trail = Trail::new();

    // ── UiStarting ───────────────────────────────────────────────────────
    trail.enter(JobState::UiStarting);
    let presenter = match NotificationPresenter::start(surface) {
        Ok(p) => Some(p),
        Err(e) => {
            warn!("Continuing without notifications: {e}");
            None
        }
    };

    // ── Running ──────────────────────────────────────────────────────────
    // The workspace lives outside the panic boundary so teardown can still
    // remove the temp input after a panic.
    trail.enter(JobState::Running);
    let mut workspace: Option<Workspace> = None;
    let mut input_bytes = 0u64;

    let result = fault::catch(|| -> Result<(), ScribeError> {
        let ws = workspace.insert(Workspace::allocate(config)?);
        ws.clear_output()?;
        input_bytes = relay(input, ws.input_path())?;
        ConversionJob::new(ws.input_path(), ws.output_path())?.run(converter)
    });

    let outcome = match result {
        Ok(Ok(())) => JobOutcome::Success,
        Ok(Err(e)) => JobOutcome::from_error(&e),
        Err(fault) => JobOutcome::from_fault(fault),
    };

    // ── Succeeded | Failed ───────────────────────────────────────────────
    if outcome.is_success() {
        trail.enter(JobState::Succeeded);
        info!("PDF written to {}", config.output_path().display());
    } else {
        trail.enter(JobState::Failed);
        log_failure(&outcome);
        if let (Some(presenter), Some(dialog)) = (presenter.as_ref(), outcome.dialog()) {
            if let Err(e) = presenter.show_error(dialog) {
                warn!("Could not show error dialog: {e}");
            }
        }
    }

    // ── TearingDown ──────────────────────────────────────────────────────
    trail.enter(JobState::TearingDown);
    let input_path = workspace.as_ref().map(|ws| ws.input_path().to_path_buf());
    let input_removed = workspace.take().is_none_or(Workspace::remove_input);
    if let Some(presenter) = presenter {
        if let Err(e) = presenter.shutdown() {
            warn!("{e}");
        }
    }

    trail.enter(JobState::Terminal);
    let duration_ms = start.elapsed().as_millis() as u64;
    debug!("Job finished in {}ms", duration_ms);

    JobReport {
        outcome,
        states: trail.states,
        input_path,
        output_path: config.output_path(),
        input_bytes,
        input_removed,
        duration_ms,
    }
}

/// Convert standard input with the Ghostscript library.
///
/// This is the whole process contract of the printer-port postprocessor.
pub fn convert_stdin(config: &ScribeConfig, surface: Box<dyn NotificationSurface>) -> JobReport {
    let converter = match &config.ghostscript_library {
        Some(path) => GhostscriptConverter::with_library(path),
        None => GhostscriptConverter::new(),
    };
    run_job(config, std::io::stdin().lock(), &converter, surface)
}

fn log_failure(outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Success => {}
        JobOutcome::InputWriteFailed { kind, path, reason } => {
            error!(?kind, path = %path.display(), "{reason}");
        }
        JobOutcome::ConversionFailed { code } => {
            error!(code, "{}", crate::outcome::ghostscript_error_text(*code));
        }
        JobOutcome::UnexpectedFailure { message, trace } => {
            error!(severity = "critical", "Exception message: {message}\n{trace}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::NoopSurface;
    use std::cell::Cell;
    use std::io::Cursor;

    struct CountingConverter {
        calls: Cell<usize>,
    }

    impl PostScriptConverter for CountingConverter {
        fn convert(&self, _arguments: &[String]) -> Result<(), ScribeError> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn success_trail() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScribeConfig::builder().temp_dir(dir.path()).build().unwrap();
        let converter = CountingConverter { calls: Cell::new(0) };

        let report = run_job(
            &config,
            Cursor::new(b"%!PS\nshowpage\n".to_vec()),
            &converter,
            Box::new(NoopSurface),
        );

        assert!(report.is_success());
        assert_eq!(converter.calls.get(), 1);
        assert_eq!(report.input_bytes, 14);
        assert!(report.input_removed);
        assert_eq!(
            report.states,
            vec![
                JobState::Idle,
                JobState::UiStarting,
                JobState::Running,
                JobState::Succeeded,
                JobState::TearingDown,
                JobState::Terminal,
            ]
        );
    }

    #[test]
    fn allocation_failure_skips_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScribeConfig::builder()
            .temp_dir(dir.path().join("missing"))
            .build()
            .unwrap();
        let converter = CountingConverter { calls: Cell::new(0) };

        let report = run_job(&config, std::io::empty(), &converter, Box::new(NoopSurface));

        assert_eq!(converter.calls.get(), 0);
        assert!(report.input_path.is_none());
        assert!(report.input_removed);
        assert!(report.states.contains(&JobState::Failed));
        assert_eq!(report.states.last(), Some(&JobState::Terminal));
    }

    #[test]
    fn report_serialises_states_in_snake_case() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScribeConfig::builder().temp_dir(dir.path()).build().unwrap();
        let converter = CountingConverter { calls: Cell::new(0) };
        let report = run_job(&config, std::io::empty(), &converter, Box::new(NoopSurface));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["outcome"], "success");
        assert_eq!(json["states"][1], "ui_starting");
        assert_eq!(json["states"][4], "tearing_down");
    }
}
