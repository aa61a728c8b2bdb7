//! Notification presenter: activity indicator and error dialogs on a
//! dedicated UI thread.
//!
//! ## Why a separate thread?
//!
//! The Ghostscript call blocks the orchestrator thread for as long as the
//! conversion takes. Window message loops must keep pumping during that time,
//! so the surface lives on its own OS thread (`pdfscribe-ui`) and the
//! orchestrator talks to it only through commands.
//!
//! ## Protocol
//!
//! ```text
//! orchestrator ──UiCommand──▶ pdfscribe-ui
//!              ◀──oneshot ack──
//! ```
//!
//! Every command carries a `oneshot` reply sender and the caller blocks on the
//! reply, so "show" returns once the window is visible and "show error"
//! returns once the dialog was dismissed. Commands only ever flow from the
//! orchestrator to the UI thread.
//!
//! [`NotificationPresenter`] is the UI session: created by
//! [`NotificationPresenter::start`], torn down by
//! [`NotificationPresenter::shutdown`] or, on any path that skips it, by
//! `Drop`. Either way `close_all` reaches the surface exactly once and the UI
//! thread is joined before the presenter is gone.

mod surface;

pub use surface::{ErrorDialog, NoopSurface, NotificationSurface};

use crate::error::ScribeError;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Name of the presenter's UI thread.
pub const UI_THREAD_NAME: &str = "pdfscribe-ui";

// ── Internal channel protocol ─────────────────────────────────────────────────

enum UiCommand {
    ShowActivity {
        reply_tx: oneshot::Sender<()>,
    },
    ShowError {
        dialog: ErrorDialog,
        reply_tx: oneshot::Sender<()>,
    },
    CloseAll {
        reply_tx: oneshot::Sender<()>,
    },
}

// ── UI thread ─────────────────────────────────────────────────────────────────

struct UiThreadState {
    surface: Box<dyn NotificationSurface>,
    cmd_rx: mpsc::UnboundedReceiver<UiCommand>,
}

impl UiThreadState {
    fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.blocking_recv() {
            match cmd {
                UiCommand::ShowActivity { reply_tx } => {
                    self.surface.show_activity();
                    let _ = reply_tx.send(());
                }
                UiCommand::ShowError { dialog, reply_tx } => {
                    self.surface.show_error(&dialog);
                    let _ = reply_tx.send(());
                }
                UiCommand::CloseAll { reply_tx } => {
                    self.surface.close_all();
                    let _ = reply_tx.send(());
                    return;
                }
            }
        }
        // Sender dropped without a CloseAll.
        self.surface.close_all();
    }
}

// ── Presenter handle ──────────────────────────────────────────────────────────

/// Handle to the running UI thread.
pub struct NotificationPresenter {
    cmd_tx: Option<mpsc::UnboundedSender<UiCommand>>,
    thread: Option<JoinHandle<()>>,
}

impl NotificationPresenter {
    /// Spawn the UI thread and block until the activity indicator is shown.
    pub fn start(surface: Box<dyn NotificationSurface>) -> Result<Self, ScribeError> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = UiThreadState { surface, cmd_rx };

        let thread = std::thread::Builder::new()
            .name(UI_THREAD_NAME.to_string())
            .spawn(move || state.run())
            .map_err(|e| {
                ScribeError::PresenterUnavailable(format!("failed to spawn UI thread: {e}"))
            })?;

        let presenter = Self {
            cmd_tx: Some(cmd_tx),
            thread: Some(thread),
        };
        presenter.request(|reply_tx| UiCommand::ShowActivity { reply_tx })?;
        debug!("Activity notification visible");

        Ok(presenter)
    }

    /// Show a modal error dialog; blocks until it is dismissed.
    pub fn show_error(&self, dialog: ErrorDialog) -> Result<(), ScribeError> {
        self.request(|reply_tx| UiCommand::ShowError { dialog, reply_tx })
    }

    /// Close all windows, stop the UI loop and join the thread.
    pub fn shutdown(mut self) -> Result<(), ScribeError> {
        self.close()
    }

    fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<()>) -> UiCommand,
    ) -> Result<(), ScribeError> {
        let cmd_tx = self.cmd_tx.as_ref().ok_or_else(|| {
            ScribeError::PresenterUnavailable("presenter already shut down".into())
        })?;

        let (reply_tx, reply_rx) = oneshot::channel();
        cmd_tx
            .send(make(reply_tx))
            .map_err(|_| ScribeError::PresenterUnavailable("UI thread has exited".into()))?;
        reply_rx.blocking_recv().map_err(|_| {
            ScribeError::PresenterUnavailable("UI thread dropped the request".into())
        })
    }

    fn close(&mut self) -> Result<(), ScribeError> {
        if self.cmd_tx.is_none() {
            return Ok(());
        }

        let result = self.request(|reply_tx| UiCommand::CloseAll { reply_tx });
        self.cmd_tx = None;

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Notification thread panicked");
            }
        }
        debug!("Notification presenter closed");
        result
    }
}

impl Drop for NotificationPresenter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{e}");
        }
    }
}
