//! Frame parser for raw stack dumps
//!
//! See the [module docs](super) for the grammar.

use regex::Regex;
use std::sync::OnceLock;

use crate::classification::{is_panic_entry, FrameOrigin};
use crate::domain::{file_name_of, Frame};

use super::capture::HEADER_SKIP_LINES;

/// Extension every location path is normalized to end with.
pub const SOURCE_EXTENSION: &str = ".rs";

/// `   12: myapp::routes::index` (frame index prefix)
fn frame_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+:\s+(?P<function>.+)$").expect("valid frame index regex"))
}

/// `at ./src/routes.rs:42:9` or `/srv/app/src/routes.rs:42 +0x1d`
fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:at\s+)?(?P<path>.+?):(?P<line>\d+)(?::\d+)?(?:\s+.*)?$")
            .expect("valid location regex")
    })
}

/// A file/line pair resolved from a single location line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub file: String,
    pub file_name: String,
    pub line: String,
}

/// Converts raw dumps into ordered frames, most recent call first.
#[derive(Debug, Clone, Copy)]
pub struct FrameParser {
    header_skip: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(HEADER_SKIP_LINES)
    }
}

impl FrameParser {
    #[must_use]
    pub fn new(header_skip: usize) -> Self {
        Self { header_skip }
    }

    #[must_use]
    pub fn header_skip(&self) -> usize {
        self.header_skip
    }

    /// Parse `raw` into frames, dropping the header and the panic machinery
    /// above the panic site.
    ///
    /// Within the leading run of std and machinery frames, everything up to
    /// the last panic entry point (`core::panicking`, `std::panic::panic_any`,
    /// the unwrap/expect shims) is dropped, then any machinery frames still
    /// leading. Without an entry point only the leading machinery run is
    /// dropped.
    #[must_use]
    pub fn parse(&self, raw: &str) -> Vec<Frame> {
        let frames = self.parse_pairs(raw);
        let start = frames
            .iter()
            .take_while(|frame| matches!(frame.origin, FrameOrigin::PanicMachinery | FrameOrigin::StdLib))
            .enumerate()
            .filter(|(_, frame)| is_panic_entry(&frame.function))
            .last()
            .map_or(0, |(idx, _)| idx + 1);

        frames
            .into_iter()
            .skip(start)
            .skip_while(|frame| frame.origin == FrameOrigin::PanicMachinery)
            .collect()
    }

    /// Pair every function line with the location line right after it.
    ///
    /// A function line without a location (truncated capture, frame without
    /// debug info) is discarded, as is a location line with no function.
    #[must_use]
    pub fn parse_pairs(&self, raw: &str) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut pending: Option<String> = None;

        for line in raw.lines().skip(self.header_skip) {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(caps) = frame_index_re().captures(trimmed) {
                pending = Some(caps["function"].trim().to_string());
                continue;
            }

            let is_location = trimmed.starts_with("at ") || pending.is_some();
            match (is_location, parse_location(trimmed)) {
                (true, Some(location)) => {
                    if let Some(function) = pending.take() {
                        frames.push(Frame::new(function, location.file, location.line));
                    }
                }
                // Malformed `at` line: the frame it belonged to cannot be attributed
                _ if trimmed.starts_with("at ") => pending = None,
                // Inline continuation or bare function name
                _ => pending = Some(trimmed.to_string()),
            }
        }

        frames
    }

    /// Every post-header line, trimmed, with location paths normalized.
    #[must_use]
    pub fn stack_formatted(&self, raw: &str) -> Vec<String> {
        raw.lines()
            .skip(self.header_skip)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.strip_prefix("at ").and_then(parse_location) {
                Some(location) => format!("{}:{}", location.file, location.line),
                None => line.to_string(),
            })
            .collect()
    }
}

/// Parse one location line (`at <path>:<line>[:<col>]` or
/// `<path>:<line> <extra>`).
#[must_use]
pub fn parse_location(line: &str) -> Option<SourceLocation> {
    let caps = location_re().captures(line.trim())?;
    let file = normalize_path(&caps["path"]);
    Some(SourceLocation {
        file_name: file_name_of(&file).to_string(),
        file,
        line: caps["line"].to_string(),
    })
}

/// Resolve the triggering location from the fixed-offset line of `raw`.
#[must_use]
pub fn triggering_location(raw: &str, offset: usize) -> Option<SourceLocation> {
    raw.lines().nth(offset).and_then(parse_location)
}

/// Cut anything trailing the source extension and trim whitespace.
fn normalize_path(path: &str) -> String {
    let path = path.trim();
    match path.rfind(SOURCE_EXTENSION) {
        Some(idx) => path[..idx + SOURCE_EXTENSION.len()].to_string(),
        None => path.to_string(),
    }
}
