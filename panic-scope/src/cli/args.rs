//! CLI argument definitions

use clap::Parser;
use log::warn;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{DiagnosticConfig, RUSTC_VERSION};
use crate::stack::HEADER_SKIP_LINES;

#[derive(Parser)]
#[command(
    name = "panic-scope",
    about = "Demo server rendering panic diagnostics",
    after_help = "\
EXAMPLES:
    panic-scope                              Serve on 127.0.0.1:3000
    panic-scope --bind 0.0.0.0:8080          Listen on all interfaces
    curl -H 'Accept: application/json' http://127.0.0.1:3000/validation"
)]
pub struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Application name shown on the diagnostic page
    #[arg(long, default_value = "panic-scope-demo")]
    pub app_name: String,

    /// Root used to resolve relative source paths (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Raw capture lines preceding the first frame
    #[arg(long, default_value_t = HEADER_SKIP_LINES)]
    pub header_skip: usize,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Diagnostic configuration for the demo routes.
    #[must_use]
    pub fn diagnostic_config(&self) -> DiagnosticConfig {
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
        DiagnosticConfig::new(self.app_name.clone(), root)
            .with_host_runtime_version(RUSTC_VERSION)
            .with_module_path(env!("CARGO_PKG_NAME"))
            .with_main_path(main_path())
            .with_header_skip(self.header_skip)
    }
}

/// Path of the running executable, or the package name if it is unknown.
fn main_path() -> String {
    match std::env::current_exe() {
        Ok(path) => path.display().to_string(),
        Err(e) => {
            warn!("Cannot resolve current executable: {e}");
            env!("CARGO_PKG_NAME").to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["panic-scope"]);

        assert_eq!(args.bind, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(args.header_skip, HEADER_SKIP_LINES);
        assert!(!args.quiet);

        let config = args.diagnostic_config();
        assert_eq!(config.app_name, "panic-scope-demo");
        assert_eq!(config.root_path, PathBuf::from("."));
        assert_eq!(config.module_path, "panic-scope");
        assert_eq!(config.host_runtime_version, RUSTC_VERSION);
        assert!(!config.main_path.ends_with("args.rs"));
        assert_eq!(config.main_path, std::env::current_exe().unwrap().display().to_string());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "panic-scope",
            "--bind",
            "0.0.0.0:8080",
            "--root",
            "/srv/app",
            "--header-skip",
            "5",
            "-q",
        ]);

        assert_eq!(args.bind.port(), 8080);
        assert!(args.quiet);
        let config = args.diagnostic_config();
        assert_eq!(config.root_path, PathBuf::from("/srv/app"));
        assert_eq!(config.header_skip, 5);
    }
}
