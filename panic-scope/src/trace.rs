//! Trace aggregate: one immutable diagnostic record per fault
//!
//! [`TraceBuilder`] is pure orchestration over the frame parser, the panic
//! classifier and the source locator. It runs exactly once per fault and
//! never retries: every collaborator degrades to empty fields instead of
//! failing.

use log::debug;
use serde::Serialize;
use std::any::Any;
use std::path::Path;

use crate::config::DiagnosticConfig;
use crate::domain::Frame;
use crate::fault_log::FaultLog;
use crate::payload::PanicPayload;
use crate::source::{SourceLocator, SourceSnippet};
use crate::stack::{triggering_location, FrameParser, SourceLocation, TRIGGER_LINE_OFFSET};

/// Everything the renderers know about one fault.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceAggregate {
    pub app_name: String,
    pub root_path: String,
    pub framework_version: String,
    pub host_runtime_version: String,
    pub module_path: String,
    pub main_path: String,

    /// Untouched capture text, kept for audit logging only.
    #[serde(skip)]
    pub raw_capture: Vec<u8>,

    pub frames: Vec<Frame>,
    pub stack_formatted: Vec<String>,

    pub panic_type: String,
    pub panic_message: String,
    /// Line of the first frame; matched against the rendered line numbers.
    pub panic_line: String,

    pub triggering_file: String,
    pub triggering_file_name: String,

    #[serde(skip)]
    pub source_raw: String,
    pub source_formatted: Vec<String>,
    #[serde(skip)]
    pub source_highlight: String,
    pub source_skipped: bool,
}

impl TraceAggregate {
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn apply_source(&mut self, snippet: SourceSnippet) {
        self.source_raw = snippet.raw;
        self.source_formatted = snippet.formatted;
        self.source_highlight = snippet.highlight;
        self.source_skipped = snippet.skipped;
    }
}

/// Builds a [`TraceAggregate`] from a raw capture and a panic payload.
pub struct TraceBuilder<'a> {
    config: &'a DiagnosticConfig,
    log: &'a dyn FaultLog,
}

impl<'a> TraceBuilder<'a> {
    pub fn new(config: &'a DiagnosticConfig, log: &'a dyn FaultLog) -> Self {
        Self { config, log }
    }

    /// Build the aggregate for one fault.
    #[must_use]
    pub fn build(&self, raw: &str, payload: &(dyn Any + Send)) -> TraceAggregate {
        let config = self.config;
        let parser = FrameParser::new(config.header_skip);
        let payload = PanicPayload::from_any(payload);
        let fixed = triggering_location(raw, TRIGGER_LINE_OFFSET);

        let mut frames = parser.parse(raw);
        align_to_panic_site(&mut frames, fixed.as_ref());

        let mut trace = TraceAggregate {
            app_name: config.app_name.clone(),
            root_path: config.root_path.display().to_string(),
            framework_version: config.framework_version.clone(),
            host_runtime_version: config.host_runtime_version.clone(),
            module_path: config.module_path.clone(),
            main_path: config.main_path.clone(),
            raw_capture: raw.as_bytes().to_vec(),
            frames,
            stack_formatted: parser.stack_formatted(raw),
            panic_type: payload.kind().to_string(),
            panic_message: payload.message().to_string(),
            ..TraceAggregate::default()
        };

        if let Some(first) = trace.frames.first() {
            trace.panic_line = first.line.clone();
        }

        let trigger = resolve_trigger(&trace.frames, fixed);
        trace.triggering_file = trigger.file;
        trace.triggering_file_name = trigger.file_name;

        let snippet = SourceLocator::new(config.root_path(), self.log).locate(&trace.triggering_file);
        trace.apply_source(snippet);

        trace
    }
}

/// Cross-check the frames against the location reported by the hook.
///
/// When the first frame is not at that location but a later one is, the
/// frames above it are unrecognized panic machinery and are dropped. When no
/// frame matches, the frames are left as parsed.
fn align_to_panic_site(frames: &mut Vec<Frame>, fixed: Option<&SourceLocation>) {
    let Some(fixed) = fixed else {
        return;
    };
    let at_site = |frame: &Frame| frame.line == fixed.line && same_file(&frame.file, &fixed.file);

    match frames.iter().position(at_site) {
        Some(0) => {}
        Some(idx) => {
            debug!(
                "Dropping {idx} frames above panic site {}:{}, first was {}",
                fixed.file, fixed.line, frames[0].function
            );
            frames.drain(..idx);
        }
        None => {
            if let Some(first) = frames.first() {
                debug!(
                    "Panic location {}:{} matches no frame, keeping first frame {}:{}",
                    fixed.file, fixed.line, first.file, first.line
                );
            }
        }
    }
}

/// Pick the triggering file: the first parsed frame when there is one, the
/// fixed-offset capture line otherwise.
fn resolve_trigger(frames: &[Frame], fixed: Option<SourceLocation>) -> SourceLocation {
    match (frames.first(), fixed) {
        (Some(frame), _) => SourceLocation {
            file: frame.file.clone(),
            file_name: frame.file_name().to_string(),
            line: frame.line.clone(),
        },
        (None, Some(fixed)) => fixed,
        (None, None) => SourceLocation::default(),
    }
}

/// Paths name the same file when one ends with all components of the other
/// (`./src/a.rs` vs `app/src/a.rs`).
fn same_file(a: &str, b: &str) -> bool {
    let a = Path::new(a.trim_start_matches("./"));
    let b = Path::new(b.trim_start_matches("./"));
    !a.as_os_str().is_empty() && !b.as_os_str().is_empty() && (a.ends_with(b) || b.ends_with(a))
}
