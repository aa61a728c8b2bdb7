//! The UI surfaces driven by the notification thread.
//!
//! A [`NotificationSurface`] is moved onto the presenter's UI thread and only
//! ever touched there, so implementations may hold thread-affine handles
//! (terminal spinners, native windows). All methods default to no-ops so an
//! implementation overrides only what it can display.

use serde::{Deserialize, Serialize};

/// A modal error dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDialog {
    /// Window caption.
    pub caption: String,
    /// Short instruction line chosen by failure kind.
    pub instruction: String,
    /// Optional detail line with the classified error text.
    pub detail: Option<String>,
}

/// Display backend owned by the notification thread.
pub trait NotificationSurface: Send {
    /// Show the always-on-top, modeless activity indicator.
    fn show_activity(&mut self) {}

    /// Show `dialog` modally. Return only once the user dismissed it.
    fn show_error(&mut self, dialog: &ErrorDialog) {
        let _ = dialog;
    }

    /// Close every window this surface opened.
    fn close_all(&mut self) {}
}

/// A surface that displays nothing.
///
/// Used when the process runs without any display, e.g. under a service
/// account with no interactive session.
pub struct NoopSurface;

impl NotificationSurface for NoopSurface {}
