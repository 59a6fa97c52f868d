use axum::body::{to_bytes, Body};
use axum::response::Response;
use axum::{routing::get, Router};
use futures::FutureExt;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Request, StatusCode};
use panic_scope::{AbortResponse, DiagnosticConfig, FaultLog, RecoverLayer};
use serde_json::Value;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::{service_fn, Layer, ServiceExt};

#[derive(Default)]
struct SpyLog(Mutex<Vec<String>>);

impl SpyLog {
    fn records(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl FaultLog for SpyLog {
    fn error(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

async fn disk_full() -> &'static str {
    std::panic::panic_any(std::io::Error::other("disk full"));
}

async fn validation() -> &'static str {
    panic!("ValidationError: field is required");
}

async fn injected() -> &'static str {
    panic!("<script>alert(1)</script>");
}

async fn aborting() -> &'static str {
    AbortResponse::raise();
}

async fn healthy() -> &'static str {
    "ok"
}

#[inline(never)]
fn unrelated_earlier_fault() {
    panic!("StaleError: left behind by another fault");
}

// Re-raising a joined task's panic does not run the hook
async fn rejoined() -> &'static str {
    std::panic::resume_unwind(Box::new("ReRaised: joined task failed"));
}

fn config() -> DiagnosticConfig {
    DiagnosticConfig::new("test-app", env!("CARGO_MANIFEST_DIR")).with_host_runtime_version("1.82.0")
}

fn app(log: Arc<SpyLog>) -> Router {
    Router::new()
        .route("/disk", get(disk_full))
        .route("/validation", get(validation))
        .route("/injected", get(injected))
        .route("/abort", get(aborting))
        .route("/health", get(healthy))
        .route("/rejoined", get(rejoined))
        .layer(RecoverLayer::with_log(config(), log))
}

fn request(uri: &str, accept: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(accept) = accept {
        builder = builder.header(ACCEPT, accept);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn same_file(reported: &str, source: &str) -> bool {
    let reported = Path::new(reported.trim_start_matches("./"));
    let source = Path::new(source);
    source.ends_with(reported) || reported.ends_with(source)
}

#[tokio::test]
async fn test_healthy_route_untouched() {
    let log = Arc::new(SpyLog::default());
    let response = app(log.clone()).oneshot(request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
    assert!(log.records().is_empty());
}

#[tokio::test]
async fn test_opaque_payload_renders_html_page() {
    let log = Arc::new(SpyLog::default());
    let response = app(log.clone()).oneshot(request("/disk", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    let page = body_text(response).await;
    assert!(page.contains("disk full"));
    assert!(page.contains("test_middleware.rs"));
    assert!(page.contains("Rust 1.82.0"));

    let records = log.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].contains("stack backtrace:"));
    assert!(records[0].contains("disk_full"));
}

#[tokio::test]
async fn test_json_trace_points_at_handler() {
    let log = Arc::new(SpyLog::default());
    let response = app(log).oneshot(request("/disk", Some("application/json"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    let trace: Value = serde_json::from_str(&body_text(response).await).unwrap();

    assert_eq!(trace["app_name"], "test-app");
    assert_eq!(trace["panic_type"], "");
    assert_eq!(trace["panic_message"], "disk full");

    let first = &trace["frames"][0];
    assert!(first["function"].as_str().unwrap().contains("disk_full"), "{first}");
    let file = first["file"].as_str().unwrap();
    assert!(same_file(file, file!()), "{file}");
    assert_eq!(trace["triggering_file_name"], "test_middleware.rs");
    assert_eq!(trace["panic_line"], first["line"]);

    assert_eq!(trace["source_skipped"], false);
    let panic_line: usize = trace["panic_line"].as_str().unwrap().parse().unwrap();
    let source_line = trace["source_formatted"][panic_line - 1].as_str().unwrap();
    assert!(source_line.contains("panic_any"), "{source_line}");
}

#[tokio::test]
async fn test_structured_payload_split() {
    let log = Arc::new(SpyLog::default());
    let response = app(log).oneshot(request("/validation", Some("application/json"))).await.unwrap();

    let trace: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(trace["panic_type"], "ValidationError");
    assert_eq!(trace["panic_message"], "field is required");
}

#[tokio::test]
async fn test_panic_message_is_escaped() {
    let log = Arc::new(SpyLog::default());
    let response = app(log).oneshot(request("/injected", Some("text/html"))).await.unwrap();

    let page = body_text(response).await;
    assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!page.contains("<script>alert(1)"));
}

#[tokio::test]
async fn test_abort_sentinel_is_reraised() {
    let log = Arc::new(SpyLog::default());
    let outcome = AssertUnwindSafe(app(log.clone()).oneshot(request("/abort", None))).catch_unwind().await;

    let payload = outcome.expect_err("abort must propagate");
    assert!(payload.is::<AbortResponse>());
    assert!(log.records().is_empty());
}

#[tokio::test]
async fn test_panic_inside_call_is_caught() {
    let log = Arc::new(SpyLog::default());
    let service = RecoverLayer::with_log(config(), log.clone()).layer(service_fn(
        |_req: Request<Body>| -> std::future::Ready<Result<Response, Infallible>> {
            panic!("SyncError: raised before the future exists")
        },
    ));

    let response = service.oneshot(request("/", Some("application/json"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let trace: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(trace["panic_type"], "SyncError");
    assert_eq!(trace["panic_message"], "raised before the future exists");
    assert_eq!(log.records().len(), 1);
}

#[tokio::test]
async fn test_reraised_panic_does_not_reuse_earlier_capture() {
    let log = Arc::new(SpyLog::default());
    let app = app(log.clone());
    assert!(std::panic::catch_unwind(unrelated_earlier_fault).is_err());

    let response = app.oneshot(request("/rejoined", Some("application/json"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let trace: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(trace["panic_type"], "ReRaised");
    assert_eq!(trace["panic_message"], "joined task failed");

    let records = log.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].lines().nth(1).map(str::trim), Some("at <unknown>:0"), "{}", records[0]);
    assert!(!records[0].contains("unrelated_earlier_fault"), "{}", records[0]);
    let first = trace["frames"][0]["function"].as_str().unwrap_or_default();
    assert!(!first.contains("unrelated_earlier_fault"), "{first}");
}
