//! Frame origin classification for distinguishing user code from libraries.
//!
//! Rust statically links std, the async runtime and every third-party crate
//! into one executable, so the only signals left in a captured backtrace
//! are the demangled function path and the source path of each frame.
//!
//! # Classification Strategy
//!
//! 1. **Panic machinery** - function prefixes of the code that runs between
//!    the `panic!` call site and our hook (backtrace capture, `std::panicking`,
//!    unwrap/expect failure shims). These frames are stripped by the parser.
//!
//! 2. **File path patterns** - most reliable when debug info is available
//!    - `.cargo/registry/` → Third-party crate
//!    - `.rustup/toolchains/` → Rust toolchain (std, core, alloc)
//!    - `/rustc/` → Rust compiler runtime
//!
//! 3. **Function name prefixes** - fallback when file paths are unavailable
//!    - `std::`, `core::`, `alloc::` → Standard library
//!    - `tokio::`, `hyper::`, `tower::`, `axum::` → Async runtime / HTTP stack

use serde::Serialize;

/// Origin of a stack frame, used to distinguish user code from libraries.
///
/// The classification affects how frames are rendered:
/// - User code keeps full emphasis
/// - Library code is dimmed
/// - Panic machinery never reaches the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOrigin {
    /// Application code (relative paths, no known library patterns)
    UserCode,
    /// Rust standard library (std, core, alloc)
    StdLib,
    /// Async runtime and HTTP stack (tokio, hyper, tower, axum)
    RuntimeLib,
    /// Other third-party crates from the cargo registry
    ThirdParty,
    /// Backtrace capture, panic hook and unwinding entry points
    PanicMachinery,
    /// Could not determine origin (no debug info)
    #[default]
    Unknown,
}

impl FrameOrigin {
    /// Returns true if this frame represents application code.
    #[must_use]
    pub fn is_user_code(&self) -> bool {
        matches!(self, FrameOrigin::UserCode)
    }

    /// CSS class used by the HTML renderer.
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self {
            FrameOrigin::UserCode => "user",
            FrameOrigin::StdLib => "std",
            FrameOrigin::RuntimeLib => "runtime",
            FrameOrigin::ThirdParty => "third-party",
            FrameOrigin::PanicMachinery => "machinery",
            FrameOrigin::Unknown => "unknown",
        }
    }
}

/// Classify a stack frame based on its function name and file path.
///
/// # Examples
///
/// ```
/// use panic_scope::classification::{classify_frame, FrameOrigin};
///
/// assert_eq!(classify_frame("myapp::routes::index", Some("./src/routes.rs")), FrameOrigin::UserCode);
/// assert_eq!(classify_frame("core::panicking::panic_fmt", None), FrameOrigin::PanicMachinery);
/// ```
#[must_use]
pub fn classify_frame(function: &str, file: Option<&str>) -> FrameOrigin {
    if is_panic_machinery(function) {
        return FrameOrigin::PanicMachinery;
    }

    if function.is_empty() || function == "<unknown>" || function.starts_with("0x") {
        return FrameOrigin::Unknown;
    }

    // === FILE PATH CLASSIFICATION ===
    if let Some(path) = file {
        // e.g. /home/user/.cargo/registry/src/index.crates.io-xxx/tokio-1.41.0/src/runtime.rs
        if path.contains(".cargo/registry/") || path.contains(".cargo\\registry\\") {
            if is_runtime_path(path) {
                return FrameOrigin::RuntimeLib;
            }
            return FrameOrigin::ThirdParty;
        }

        // e.g. /rustc/abc123.../library/std/src/io/mod.rs
        if path.contains(".rustup/toolchains/")
            || path.contains(".rustup\\toolchains\\")
            || path.contains("/rustc/")
            || path.contains("\\rustc\\")
        {
            return FrameOrigin::StdLib;
        }

        if path.starts_with("/usr/") || path.starts_with("/lib/") {
            return FrameOrigin::ThirdParty;
        }

        return FrameOrigin::UserCode;
    }

    // === FUNCTION NAME CLASSIFICATION ===
    classify_by_function_prefix(function).unwrap_or(FrameOrigin::Unknown)
}

/// Returns true for frames that belong to capturing or raising the panic
/// rather than to the code that panicked.
#[must_use]
pub fn is_panic_machinery(function: &str) -> bool {
    let function = function.trim();
    PANIC_MACHINERY_PREFIXES.iter().any(|p| function.starts_with(p)) || is_boxed_hook(function)
}

/// Returns true for the functions through which a panic is raised.
///
/// Everything above the last of these in a capture is hook or unwinding
/// code; the frame below it is the panic site (or an unwrap/expect shim).
#[must_use]
pub fn is_panic_entry(function: &str) -> bool {
    let function = function.trim();
    PANIC_ENTRY_PREFIXES.iter().any(|p| function.starts_with(p))
}

/// The installed hook, called through `Box<dyn Fn(&PanicHookInfo)>`. The
/// demangled closure type varies across toolchains
/// (`Box<F,A>`, `Box<dyn for<'a, 'b> Fn<(&'a PanicHookInfo<'b>,)...>>`).
fn is_boxed_hook(function: &str) -> bool {
    function.starts_with("<alloc::boxed::Box<F")
        || (function.starts_with("<alloc::boxed::Box<")
            && (function.contains("PanicHookInfo") || function.contains("PanicInfo")))
}

// =============================================================================
// CLASSIFICATION TABLES
// =============================================================================

/// Functions between the panic site and the hook's capture call.
const PANIC_MACHINERY_PREFIXES: &[&str] = &[
    "std::backtrace::",
    "std::backtrace_rs::",
    "backtrace::",
    "panic_scope::stack::capture::",
    "std::panicking::",
    "core::panicking::",
    "std::panic::panic_any",
    "std::panic::resume_unwind",
    "std::sys::backtrace::__rust_end_short_backtrace",
    "std::sys_common::backtrace::__rust_end_short_backtrace",
    "std::rt::begin_panic",
    "rust_begin_unwind",
    "__rustc::rust_begin_unwind",
    "__rust_start_panic",
    "core::result::unwrap_failed",
    "core::option::unwrap_failed",
    "core::option::expect_failed",
    "core::result::Result<T,E>::unwrap",
    "core::result::Result<T,E>::expect",
    "core::option::Option<T>::unwrap",
    "core::option::Option<T>::expect",
];

/// Functions a panic is raised through, innermost last in a capture.
const PANIC_ENTRY_PREFIXES: &[&str] = &[
    "core::panicking::",
    "std::panicking::begin_panic",
    "std::panic::panic_any",
    "std::rt::begin_panic",
    "rust_begin_unwind",
    "__rustc::rust_begin_unwind",
    "core::result::unwrap_failed",
    "core::option::unwrap_failed",
    "core::option::expect_failed",
];

/// Standard library module prefixes
const STD_PREFIXES: &[&str] = &["std::", "core::", "alloc::", "<std::", "<core::", "<alloc::"];

/// Async runtime and HTTP stack prefixes (function names)
const RUNTIME_PREFIXES: &[&str] = &[
    "tokio::",
    "<tokio::",
    "futures::",
    "futures_util::",
    "futures_core::",
    "mio::",
    "hyper::",
    "<hyper::",
    "hyper_util::",
    "tower::",
    "<tower::",
    "tower_service::",
    "axum::",
    "<axum::",
];

/// Common third-party crate prefixes (function names)
const THIRD_PARTY_PREFIXES: &[&str] = &[
    "serde::",
    "serde_json::",
    "tracing::",
    "log::",
    "regex::",
    "http::",
    "bytes::",
];

/// Runtime crate patterns in cargo registry paths
const RUNTIME_CRATE_PATTERNS: &[&str] = &[
    "/tokio-",
    "/futures-",
    "/futures-util-",
    "/futures-core-",
    "/mio-",
    "/hyper-",
    "/hyper-util-",
    "/tower-",
    "/axum-",
];

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Classify a function by its module prefix.
fn classify_by_function_prefix(function: &str) -> Option<FrameOrigin> {
    [
        (STD_PREFIXES, FrameOrigin::StdLib),
        (RUNTIME_PREFIXES, FrameOrigin::RuntimeLib),
        (THIRD_PARTY_PREFIXES, FrameOrigin::ThirdParty),
    ]
    .into_iter()
    .find(|(prefixes, _)| prefixes.iter().any(|p| function.starts_with(p)))
    .map(|(_, origin)| origin)
}

/// Check if a file path belongs to a known runtime crate.
fn is_runtime_path(path: &str) -> bool {
    RUNTIME_CRATE_PATTERNS.iter().any(|pattern| path.contains(pattern))
}
