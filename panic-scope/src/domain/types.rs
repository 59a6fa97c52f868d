//! Domain types shared by the parser, the trace builder and the renderers

use serde::Serialize;
use std::fmt;

use crate::classification::{classify_frame, FrameOrigin};

/// One entry of a parsed call stack.
///
/// `line` stays textual: it is only ever displayed and string-matched
/// against the rendered source pane, never used for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub function: String,
    pub file: String,
    pub line: String,
    pub origin: FrameOrigin,
}

impl Frame {
    /// Build a frame, classifying its origin from the function and file.
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: impl Into<String>) -> Self {
        let function = function.into();
        let file = file.into();
        let origin = classify_frame(&function, (!file.is_empty()).then_some(file.as_str()));
        Self { function, file, line: line.into(), origin }
    }

    /// File name without its directories (`src/routes.rs` → `routes.rs`).
    #[must_use]
    pub fn file_name(&self) -> &str {
        file_name_of(&self.file)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

/// Last path component of `path`, accepting both separators.
#[must_use]
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_of_unix_path() {
        assert_eq!(file_name_of("/srv/app/src/routes.rs"), "routes.rs");
    }

    #[test]
    fn test_file_name_of_windows_path() {
        assert_eq!(file_name_of(r"C:\app\src\main.rs"), "main.rs");
    }

    #[test]
    fn test_file_name_of_bare_name() {
        assert_eq!(file_name_of("main.rs"), "main.rs");
    }

    #[test]
    fn test_frame_display() {
        let frame = Frame::new("app::routes::index", "src/routes.rs", "42");
        assert_eq!(frame.to_string(), "app::routes::index (src/routes.rs:42)");
        assert_eq!(frame.file_name(), "routes.rs");
    }
}
