// The dump is assembled line by line; format! keeps each line readable
#![allow(clippy::format_push_string)]

use log::debug;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, Location, PanicHookInfo};
use std::sync::Once;

use crate::payload::is_abort;

/// Lines of the raw capture written before the backtrace itself:
/// the thread line, the panic location line and `stack backtrace:`.
pub const HEADER_SKIP_LINES: usize = 3;

/// Line of the raw capture holding the panic location reported by the hook.
pub const TRIGGER_LINE_OFFSET: usize = 1;

thread_local! {
    /// Dump of the most recent panic on this thread, waiting to be taken.
    static LAST_CAPTURE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Install the capturing panic hook (once per process).
///
/// The previously installed hook keeps running after the capture, so the
/// default stderr report is preserved. The [`AbortResponse`] sentinel is
/// neither captured nor forwarded.
///
/// [`AbortResponse`]: crate::payload::AbortResponse
pub fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if is_abort(info.payload()) {
                return;
            }
            record(info);
            previous(info);
        }));
        debug!("Panic capture hook installed");
    });
}

/// Remove and return the dump recorded by the last panic on this thread.
pub fn take_capture() -> Option<String> {
    LAST_CAPTURE.try_with(|slot| slot.borrow_mut().take()).ok().flatten()
}

/// Drop any dump left on this thread by an earlier panic.
///
/// Called before request code runs, so a dump taken after a caught panic can
/// only come from that code.
pub fn clear_capture() {
    let _ = take_capture();
}

/// Capture a dump of the current stack, for when no hook capture exists.
///
/// Frames then describe the recovery site rather than the panic site.
#[must_use]
pub fn capture_here() -> String {
    stack_dump(&current_thread_name(), None, &Backtrace::force_capture())
}

#[inline(never)]
fn record(info: &PanicHookInfo<'_>) {
    let dump = stack_dump(&current_thread_name(), info.location(), &Backtrace::force_capture());
    // Thread-local storage is gone during thread teardown; nothing to hand over then
    let _ = LAST_CAPTURE.try_with(|slot| slot.replace(Some(dump)));
}

/// Render the raw capture: the fixed header followed by the backtrace text.
#[must_use]
pub fn stack_dump(thread: &str, location: Option<&Location<'_>>, backtrace: &Backtrace) -> String {
    let mut dump = String::new();

    dump.push_str(&format!("thread '{thread}' panicked:\n"));
    match location {
        Some(loc) => {
            dump.push_str(&format!("             at {}:{}:{}\n", loc.file(), loc.line(), loc.column()));
        }
        None => dump.push_str("             at <unknown>:0\n"),
    }
    dump.push_str("stack backtrace:\n");
    dump.push_str(&format!("{backtrace}"));

    dump
}

fn current_thread_name() -> String {
    std::thread::current().name().unwrap_or("<unnamed>").to_string()
}
