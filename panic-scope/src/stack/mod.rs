//! # Stack Capture and Frame Parsing
//!
//! This module turns a panic into an ordered list of [`Frame`]s. It is split
//! in two halves that only communicate through text:
//!
//! - **`capture`**: a process-wide panic hook that, on the panicking thread,
//!   writes a raw stack dump into a thread-local slot.
//! - **`parser`**: reads a raw dump back into frames.
//!
//! ## Why Text
//!
//! `catch_unwind` only returns the payload. By the time the recover
//! middleware regains control, the stack of the panic site has already been
//! unwound, so the call chain has to be snapshotted *during* the panic, by
//! the hook, and handed over. The handover format is the `Display` output of
//! [`std::backtrace::Backtrace`] behind a small header: an externally
//! defined, semi-structured text format rather than a documented schema.
//! Treating it as a wire format keeps the parser testable with synthetic
//! dumps and keeps every positional assumption in one place.
//!
//! ## Raw Capture Grammar
//!
//! ```text
//! line 0   thread 'tokio-runtime-worker' panicked:
//! line 1                at src/routes.rs:42:9              <- TRIGGER_LINE_OFFSET
//! line 2   stack backtrace:
//! line 3      0: panic_scope::stack::capture::record       <- HEADER_SKIP_LINES
//!                       at ./src/stack/capture.rs:72:16
//!             1: panic_scope::stack::capture::install_hook::{{closure}}
//!                       at ./src/stack/capture.rs:42:13
//!             ...
//!            11: myapp::routes::index::{{closure}}
//!                       at ./src/routes.rs:42:9
//! ```
//!
//! Each frame is a function line (`N: name`, or an indented continuation for
//! inlined symbols) followed by an optional location line
//! (`at <path>:<line>:<col>`). The parser also accepts the bare
//! `<path>:<line> <extra>` location form.
//!
//! ## Fragility
//!
//! [`HEADER_SKIP_LINES`] and [`TRIGGER_LINE_OFFSET`] describe the header
//! written by the hook. If that header changes, both constants must be
//! re-tuned; `tests/test_capture_grammar.rs` pins them against a real
//! capture so a change fails loudly instead of misattributing frames.
//! The header skip is overridable through
//! [`DiagnosticConfig::with_header_skip`](crate::config::DiagnosticConfig::with_header_skip).
//!
//! Between the panic site and the hook sit a varying number of std frames
//! (`core::panicking`, `std::panicking`, the boxed hook closure, ...). The
//! parser drops the leading run of those, identified by
//! [`is_panic_machinery`](crate::classification::is_panic_machinery), so the
//! first frame is the code that panicked.
//!
//! [`Frame`]: crate::domain::Frame

pub mod capture;
pub mod parser;

pub use capture::{clear_capture, install_hook, take_capture, HEADER_SKIP_LINES, TRIGGER_LINE_OFFSET};
pub use parser::{parse_location, triggering_location, FrameParser, SourceLocation};
