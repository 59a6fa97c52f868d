//! Error sink for the fault path
//!
//! The recover middleware reports raw captures and secondary failures
//! through [`FaultLog`] instead of calling a logger directly, so the host
//! framework can route them into its own structured logger.

use log::error;

/// Receives error-severity records produced while handling a fault.
///
/// Implementations are shared by every concurrently faulting request and
/// must tolerate concurrent calls.
pub trait FaultLog: Send + Sync {
    fn error(&self, message: &str);
}

/// Forwards to the `log` facade under the `panic_scope` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFaultLog;

impl FaultLog for LogFaultLog {
    fn error(&self, message: &str) {
        error!(target: "panic_scope", "{message}");
    }
}

impl<F> FaultLog for F
where
    F: Fn(&str) + Send + Sync,
{
    fn error(&self, message: &str) {
        self(message);
    }
}
