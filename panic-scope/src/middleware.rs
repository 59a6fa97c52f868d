//! Fault-intercepting middleware
//!
//! [`RecoverLayer`] wraps any service that produces an axum [`Response`].
//! A panic raised while the inner service is called, or while its future is
//! polled, is turned into a `500` diagnostic instead of tearing down the
//! connection.
//!
//! ```text
//! request ──▶ Recover ──▶ inner service
//!                │  panic
//!                ▼
//!         AbortResponse? ──yes──▶ resume_unwind
//!                │ no
//!                ▼
//!   take_capture ─▶ FaultLog ─▶ TraceBuilder ─▶ render ─▶ 500
//! ```

use axum::response::Response;
use futures::future::{poll_fn, BoxFuture};
use futures::FutureExt;
use http::Request;
use log::warn;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::config::DiagnosticConfig;
use crate::fault_log::{FaultLog, LogFaultLog};
use crate::payload::is_abort;
use crate::render::{diagnostic_response, fallback_response, Format};
use crate::stack::{self, capture::capture_here};
use crate::trace::TraceBuilder;

/// Layer installing [`Recover`] around a service.
///
/// Constructing the layer installs the capturing panic hook.
#[derive(Clone)]
pub struct RecoverLayer {
    recovery: Arc<Recovery>,
}

impl RecoverLayer {
    /// Recover with the default [`LogFaultLog`].
    pub fn new(config: DiagnosticConfig) -> Self {
        Self::with_log(config, Arc::new(LogFaultLog))
    }

    /// Recover, reporting raw captures and secondary failures to `log`.
    pub fn with_log(config: DiagnosticConfig, log: Arc<dyn FaultLog>) -> Self {
        stack::install_hook();
        Self { recovery: Arc::new(Recovery { config, log }) }
    }
}

impl<S> Layer<S> for RecoverLayer {
    type Service = Recover<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Recover { inner, recovery: Arc::clone(&self.recovery) }
    }
}

/// Service converting panics of `S` into diagnostic responses.
#[derive(Clone)]
pub struct Recover<S> {
    inner: S,
    recovery: Arc<Recovery>,
}

impl<S, B> Service<Request<B>> for Recover<S>
where
    S: Service<Request<B>, Response = Response>,
    S::Future: Send + 'static,
    S::Error: 'static,
    B: 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let format = Format::negotiate(req.headers());
        let recovery = Arc::clone(&self.recovery);
        let inner = &mut self.inner;

        stack::clear_capture();
        match panic::catch_unwind(AssertUnwindSafe(|| inner.call(req))) {
            Ok(future) => Box::pin(async move {
                // Other tasks may panic on this thread between polls
                let mut future = pin!(future);
                let scoped = poll_fn(move |cx| {
                    stack::clear_capture();
                    future.as_mut().poll(cx)
                });
                match AssertUnwindSafe(scoped).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => Ok(recovery.respond(payload, format)),
                }
            }),
            Err(payload) => {
                let response = recovery.respond(payload, format);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

/// Fault path shared by every clone of the layer.
struct Recovery {
    config: DiagnosticConfig,
    log: Arc<dyn FaultLog>,
}

impl Recovery {
    /// Turn a caught panic into a response. Runs on the thread that caught
    /// it, which is where the hook left the capture. A panic that bypassed the
    /// hook (`resume_unwind`) finds the slot empty and is captured here.
    fn respond(&self, payload: Box<dyn Any + Send>, format: Format) -> Response {
        if is_abort(&*payload) {
            panic::resume_unwind(payload);
        }

        let raw = stack::take_capture().unwrap_or_else(|| {
            warn!("No panic capture for this request, capturing at the recovery site");
            capture_here()
        });
        self.log.error(&raw);

        let trace = TraceBuilder::new(&self.config, self.log.as_ref()).build(&raw, &*payload);

        match diagnostic_response(&trace, format) {
            Ok(response) => response,
            Err(err) => {
                self.log.error(&format!("Failed to render panic diagnostic: {err}"));
                fallback_response()
            }
        }
    }
}
