//! # panic-scope - Demo Server
//!
//! Serves a handful of routes that panic in different ways, wrapped in
//! [`RecoverLayer`]. Open them in a browser for the HTML page, or request
//! them with `Accept: application/json` for the JSON trace.
//!
//! ```bash
//! RUST_LOG=info panic-scope --bind 127.0.0.1:3000
//! curl -H 'Accept: application/json' http://127.0.0.1:3000/validation
//! ```

use anyhow::{Context, Result};
use axum::extract::Query;
use axum::{routing::get, Router};
use clap::Parser;
use log::info;
use serde::Deserialize;
use std::io;

use panic_scope::cli::Args;
use panic_scope::{AbortResponse, RecoverLayer};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let denied = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io| io.kind() == io::ErrorKind::PermissionDenied);
    if denied {
        EXIT_NOPERM
    } else {
        EXIT_ERROR
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();

    let app = Router::new()
        .route("/", get(index))
        .route("/message", get(plain_message))
        .route("/validation", get(validation))
        .route("/disk", get(disk_full))
        .route("/parse", get(parse_count))
        .route("/abort", get(abort))
        .layer(RecoverLayer::new(args.diagnostic_config()));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    info!("Listening on http://{}", args.bind);
    if !args.quiet {
        println!("Demo server listening on http://{}", args.bind);
        println!("Routes: /message /validation /disk /parse?count=abc /abort");
    }

    axum::serve(listener, app).await.context("Server error")
}

async fn index() -> &'static str {
    "panic-scope demo\n\n\
     /message      panic with a plain message\n\
     /validation   panic with a \"Kind: message\" payload\n\
     /disk         panic with an io::Error payload\n\
     /parse        unwrap a failed parse (try ?count=abc)\n\
     /abort        drop the connection without a response\n"
}

async fn plain_message() -> &'static str {
    panic!("something went wrong while handling the request");
}

async fn validation() -> &'static str {
    panic!("ValidationError: field `email` is required");
}

async fn disk_full() -> &'static str {
    std::panic::panic_any(io::Error::other("disk full"));
}

#[derive(Deserialize)]
struct CountQuery {
    count: Option<String>,
}

async fn parse_count(Query(query): Query<CountQuery>) -> String {
    let raw = query.count.unwrap_or_else(|| "abc".to_string());
    let count: u32 = raw.parse().unwrap();
    format!("count = {count}\n")
}

async fn abort() -> &'static str {
    AbortResponse::raise();
}
