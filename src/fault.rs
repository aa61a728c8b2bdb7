//! Panic capture at the job boundary.
//!
//! [`catch`] runs a closure under `catch_unwind` and turns a panic into a
//! [`Fault`] carrying the panic message, its location and a backtrace. The
//! backtrace has to be taken inside the panic hook (the stack is gone once
//! `catch_unwind` returns), so a hook is chained in front of the existing one
//! the first time [`catch`] is used. It only records into a thread-local slot
//! and then defers to the previous hook, so default panic output is unchanged.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// A panic caught by [`catch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// The panic payload rendered as text.
    pub message: String,
    /// Panic location followed by the backtrace, when the hook captured one.
    pub trace: String,
}

#[derive(Debug)]
struct Captured {
    location: Option<String>,
    backtrace: String,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<Captured>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_capture_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let captured = Captured {
                location: info.location().map(|l| l.to_string()),
                backtrace: Backtrace::force_capture().to_string(),
            };
            let _ = LAST_PANIC.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(captured);
                }
            });
            previous(info);
        }));
    });
}

/// Run `f`, converting a panic into a [`Fault`].
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, Fault> {
    install_capture_hook();
    take_captured();

    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload_message(payload.as_ref());
        let trace = match take_captured() {
            Some(Captured {
                location: Some(location),
                backtrace,
            }) => format!("at {location}\n{backtrace}"),
            Some(Captured {
                location: None,
                backtrace,
            }) => backtrace,
            None => String::new(),
        };
        Fault { message, trace }
    })
}

fn take_captured() -> Option<Captured> {
    LAST_PANIC
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()))
        .ok()
        .flatten()
}

/// Render a panic payload. `panic!` payloads are `&str` or `String`.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
