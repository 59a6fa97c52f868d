//! Diagnostic configuration injected by the host framework
//!
//! Everything here is written once at startup and only read afterwards, so a
//! single `Arc<DiagnosticConfig>` is shared by every request without locking.

use std::path::{Path, PathBuf};

use crate::stack::HEADER_SKIP_LINES;

/// Version of this crate, reported on the diagnostic page.
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the `rustc` that built this crate (`unknown` if it could not be
/// queried). The application is built by the same toolchain.
pub const RUSTC_VERSION: &str = env!("PANIC_SCOPE_RUSTC_VERSION");

/// Environment and build metadata shown on every diagnostic, plus the
/// parser tuning knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticConfig {
    pub app_name: String,
    /// Application root; relative source paths are also looked up here.
    pub root_path: PathBuf,
    pub framework_version: String,
    /// Toolchain the application was built with (e.g. `1.82.0`).
    pub host_runtime_version: String,
    /// Crate path of the application (e.g. `shop`).
    pub module_path: String,
    /// Path of the main executable or main package.
    pub main_path: String,
    /// Leading raw-capture lines that carry no frames.
    pub header_skip: usize,
}

impl DiagnosticConfig {
    pub fn new(app_name: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            root_path: root_path.into(),
            framework_version: FRAMEWORK_VERSION.to_string(),
            host_runtime_version: String::new(),
            module_path: String::new(),
            main_path: String::new(),
            header_skip: HEADER_SKIP_LINES,
        }
    }

    #[must_use]
    pub fn with_host_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.host_runtime_version = version.into();
        self
    }

    #[must_use]
    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    #[must_use]
    pub fn with_main_path(mut self, main_path: impl Into<String>) -> Self {
        self.main_path = main_path.into();
        self
    }

    #[must_use]
    pub fn with_framework_version(mut self, version: impl Into<String>) -> Self {
        self.framework_version = version.into();
        self
    }

    /// Override the header skip when the capture header changes shape.
    #[must_use]
    pub fn with_header_skip(mut self, header_skip: usize) -> Self {
        self.header_skip = header_skip;
        self
    }

    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self::new("", ".")
    }
}
