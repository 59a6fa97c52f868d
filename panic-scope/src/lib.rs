//! # Panic Scope - Panic Diagnostics for axum Services
//!
//! Panic Scope is a recover middleware that turns a panic raised while a
//! request is processed into a self-contained diagnostic: the panic type and
//! message, the call stack that led to it, and the offending source file
//! with the panic line highlighted. Browsers get an HTML page, API clients
//! asking for `application/json` get the same trace as JSON. Both are served
//! with status `500`.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Host Application (axum)                     │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ request
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Recover Middleware (tower Layer)                │
//! │  • catch_unwind around call() and around the response future    │
//! │  • AbortResponse sentinel is re-raised untouched                │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ payload + thread-local capture
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Panic Scope (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │ Stack Capture│──▶│ Frame Parser │──▶│    Trace     │        │
//! │  │ (panic hook) │   │   (regex)    │   │   Builder    │        │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘        │
//! │                                               │                 │
//! │         ┌──────────────┐   ┌──────────────┐   │                 │
//! │         │   Payload    │──▶│    Source    │◀──┘                 │
//! │         │  Classifier  │   │   Locator    │                     │
//! │         └──────────────┘   └──────────────┘                     │
//! │                                   │                             │
//! │                                   ▼                             │
//! │                          ┌──────────────┐                       │
//! │                          │   Renderer   │                       │
//! │                          │ (HTML/JSON)  │                       │
//! │                          └──────────────┘                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Fault Pipeline
//!
//! - [`stack`]: capture and parsing of the raw stack dump
//!   - `capture`: process-wide panic hook writing a thread-local dump
//!   - `parser`: turns the dump into [`Frame`]s, dropping panic machinery
//!
//! - [`payload`]: panic payload classification (`"Kind: message"` vs opaque)
//!   and the [`AbortResponse`] sentinel
//!
//! - [`source`]: best-effort loading of the triggering file as numbered lines
//!
//! - [`trace`]: assembles one immutable [`TraceAggregate`] per fault
//!
//! - [`render`]: HTML page and JSON document, content negotiation
//!
//! - [`middleware`]: the [`RecoverLayer`] tying the pipeline together
//!
//! ### Support Modules
//!
//! - [`classification`]: frame origin (user code, std, runtime, third-party)
//! - [`config`]: [`DiagnosticConfig`] injected into the layer
//! - [`fault_log`]: [`FaultLog`], the error sink for raw captures
//! - [`domain`]: core types ([`Frame`]) and [`DiagnosticError`]
//! - [`cli`]: arguments of the demo server
//!
//! ## Failure Model
//!
//! Nothing on the fault path may fail the response a second time:
//!
//! - Missing or unreadable source files leave the source pane empty
//! - Unrecognized capture lines are skipped, unrecognized payloads become
//!   opaque messages
//! - A failing renderer is logged once and answered with a bare `500`
//!
//! The only deliberate exception is [`AbortResponse`]: a handler that
//! raises it asks for the connection to be dropped, so the middleware
//! resumes the unwind without capturing, logging or rendering anything.
//!
//! ## Typical Usage
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use panic_scope::{DiagnosticConfig, RecoverLayer};
//!
//! # async fn serve() {
//! let config = DiagnosticConfig::new("shop", env!("CARGO_MANIFEST_DIR"))
//!     .with_module_path(module_path!());
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "ok" }))
//!     .layer(RecoverLayer::new(config));
//! # }
//! ```

pub mod classification;
pub mod cli;
pub mod config;
pub mod domain;
pub mod fault_log;
pub mod middleware;
pub mod payload;
pub mod render;
pub mod source;
pub mod stack;
pub mod trace;

pub use config::DiagnosticConfig;
pub use domain::{DiagnosticError, Frame};
pub use fault_log::{FaultLog, LogFaultLog};
pub use middleware::{Recover, RecoverLayer};
pub use payload::{AbortResponse, PanicPayload};
pub use render::Format;
pub use trace::{TraceAggregate, TraceBuilder};
