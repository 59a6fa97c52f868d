//! Self-contained HTML diagnostic page
//!
//! Every piece of text that can originate from the request (panic message,
//! paths, function names, source lines) goes through `html-escape` before it
//! reaches the page: panic payloads are routinely built from request data.
//!
//! The panic line is highlighted client-side: a short script compares the
//! text of every rendered line number with the `data-panic-line` attribute.
//! If nothing matches, nothing is highlighted.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write;

use crate::domain::DiagnosticError;
use crate::trace::TraceAggregate;

const STYLE: &str = r#"
body { margin: 0; background: #fdedf0; color: #5c0a19; font-family: ui-sans-serif, system-ui, sans-serif; }
.container { margin: 0 auto; width: 90%; padding: 15px; }
.block__message { background: #eb4765; border-radius: 0.25rem; margin-bottom: 25px; padding: 10px 30px; color: #fdedf0; }
.block__message h1 { font-size: 1.25rem; font-weight: 900; letter-spacing: 0.1em; text-transform: uppercase; }
.block__message .meta { font-size: 14px; font-weight: 300; margin-right: 20px; }
.block__message .message { font-size: 18px; }
.block__stack { display: flex; height: 75vh; }
.block__frame { flex: 0 0 25%; max-width: 320px; background: #fbdae0; border-radius: 0.25rem 0 0 0.25rem; padding: 10px 30px; text-align: right; }
.block__code { flex: 1 1 auto; background: #ffffff; border-radius: 0 0.25rem 0.25rem 0; padding: 10px 30px; }
.scroll { overflow-y: scroll; }
h2 { color: #a5122d; font-size: 21px; margin: 0; }
ul { list-style: none; padding: 0; margin: 0; word-break: break-all; }
ul li { color: #c0485e; font-size: 14px; margin: 5px 0 17px 0; }
ul li.active { color: #a5122d; font-weight: 700; }
ul li.std, ul li.runtime, ul li.third-party, ul li.unknown { opacity: 0.55; }
ul li .function { display: block; font-weight: 300; margin-top: 3px; }
#filePath { font-weight: 500; text-align: right; }
pre { margin: 0; }
.source-line { display: block; }
.source-line.active { background: #fdedf0; }
.line-number { display: inline-block; min-width: 3em; padding-right: 14px; color: #f7b6c2; text-align: right; }
.source-line.active .line-number { color: #eb4765; font-weight: 700; }
.muted { color: #c0485e; font-style: italic; }
details { margin-top: 25px; }
"#;

const SCRIPT: &str = r#"
(function () {
  var pane = document.querySelector('pre[data-panic-line]');
  if (!pane) { return; }
  var target = pane.getAttribute('data-panic-line');
  var numbers = pane.getElementsByClassName('line-number');
  for (var i = 0; i < numbers.length; i++) {
    if (numbers[i].textContent === target) {
      numbers[i].parentNode.classList.add('active');
      numbers[i].scrollIntoView({ block: 'center' });
    }
  }
})();
"#;

/// Render the full diagnostic page.
///
/// # Errors
/// Returns an error if writing the document fails.
pub fn render_html(trace: &TraceAggregate) -> Result<String, DiagnosticError> {
    let mut page = String::with_capacity(8 * 1024 + trace.source_highlight.len() * 2);

    let title = if trace.panic_type.is_empty() { "panic" } else { trace.panic_type.as_str() };
    writeln!(page, "<!DOCTYPE html>")?;
    writeln!(page, "<html lang=\"en\">")?;
    writeln!(page, "<head>")?;
    writeln!(page, "<meta charset=\"utf-8\">")?;
    writeln!(page, "<title>{} - {}</title>", text(title), text(&trace.app_name))?;
    writeln!(page, "<style>{STYLE}</style>")?;
    writeln!(page, "</head>")?;
    writeln!(page, "<body>")?;
    writeln!(page, "<div class=\"container\">")?;

    write_message(&mut page, trace)?;

    writeln!(page, "<div class=\"block__stack\">")?;
    write_frames(&mut page, trace)?;
    write_source(&mut page, trace)?;
    writeln!(page, "</div>")?;

    write_raw_stack(&mut page, trace)?;

    writeln!(page, "</div>")?;
    writeln!(page, "<script>{SCRIPT}</script>")?;
    writeln!(page, "</body>")?;
    writeln!(page, "</html>")?;

    Ok(page)
}

fn write_message(page: &mut String, trace: &TraceAggregate) -> std::fmt::Result {
    writeln!(page, "<div class=\"block__message\">")?;
    writeln!(page, "<h1>{}</h1>", text(&trace.panic_type))?;
    write!(page, "<p>")?;
    if !trace.app_name.is_empty() {
        write!(page, "<span class=\"meta\">{}</span>", text(&trace.app_name))?;
    }
    if !trace.host_runtime_version.is_empty() {
        write!(page, "<span class=\"meta\">Rust {}</span>", text(&trace.host_runtime_version))?;
    }
    write!(page, "<span class=\"meta\">panic-scope {}</span>", text(&trace.framework_version))?;
    writeln!(page, "</p>")?;
    writeln!(
        page,
        "<p class=\"message\"><span class=\"file-name\">{}</span>: {}</p>",
        text(&trace.triggering_file_name),
        text(&trace.panic_message)
    )?;
    writeln!(page, "</div>")
}

fn write_frames(page: &mut String, trace: &TraceAggregate) -> std::fmt::Result {
    writeln!(page, "<div class=\"block__frame scroll\">")?;
    writeln!(page, "<h2>{} Frames</h2>", trace.frame_count())?;
    writeln!(page, "<ul>")?;
    for (idx, frame) in trace.frames.iter().enumerate() {
        let active = if idx == 0 { " active" } else { "" };
        writeln!(
            page,
            "<li id=\"frame_{idx}\" class=\"{}{active}\">{}<span class=\"function\">{}<span class=\"line\">:{}</span></span></li>",
            frame.origin.css_class(),
            text(&frame.function),
            text(&frame.file),
            text(&frame.line)
        )?;
    }
    writeln!(page, "</ul>")?;
    writeln!(page, "</div>")
}

fn write_source(page: &mut String, trace: &TraceAggregate) -> std::fmt::Result {
    writeln!(page, "<div class=\"block__code scroll\">")?;
    writeln!(page, "<p id=\"filePath\">{}</p>", text(&trace.triggering_file))?;

    if trace.source_skipped || trace.source_formatted.is_empty() {
        writeln!(page, "<p class=\"muted\">Source not available</p>")?;
        return writeln!(page, "</div>");
    }

    write!(page, "<pre data-panic-line=\"{}\"><code>", attr(&trace.panic_line))?;
    for formatted in &trace.source_formatted {
        let formatted = formatted.strip_suffix('\n').unwrap_or(formatted);
        let (number, code) = formatted.split_once(' ').unwrap_or((formatted, ""));
        write!(
            page,
            "<span class=\"source-line\"><span class=\"line-number\">{}</span>{}</span>",
            text(number),
            text(code)
        )?;
    }
    writeln!(page, "</code></pre>")?;
    writeln!(page, "</div>")
}

fn write_raw_stack(page: &mut String, trace: &TraceAggregate) -> std::fmt::Result {
    if trace.stack_formatted.is_empty() {
        return Ok(());
    }
    writeln!(page, "<details>")?;
    writeln!(page, "<summary>Full stack</summary>")?;
    write!(page, "<pre>")?;
    for line in &trace.stack_formatted {
        writeln!(page, "{}", text(line))?;
    }
    writeln!(page, "</pre>")?;
    writeln!(page, "</details>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Frame;
    use crate::source::SourceSnippet;

    fn trace() -> TraceAggregate {
        let snippet = SourceSnippet::from_source("fn a() {}\nfn b() { panic!() }\n".to_string());
        TraceAggregate {
            app_name: "shop".to_string(),
            framework_version: "0.3.0".to_string(),
            host_runtime_version: "1.82.0".to_string(),
            frames: vec![
                Frame::new("shop::b", "src/lib.rs", "2"),
                Frame::new("tokio::runtime::task::raw::poll", "", "0"),
            ],
            panic_type: "OrderError".to_string(),
            panic_message: "out of stock".to_string(),
            panic_line: "2".to_string(),
            triggering_file: "src/lib.rs".to_string(),
            triggering_file_name: "lib.rs".to_string(),
            source_formatted: snippet.formatted,
            source_highlight: snippet.highlight,
            ..TraceAggregate::default()
        }
    }

    #[test]
    fn test_page_contains_header_frames_and_source() {
        let page = render_html(&trace()).unwrap();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h1>OrderError</h1>"));
        assert!(page.contains("Rust 1.82.0"));
        assert!(page.contains("<span class=\"file-name\">lib.rs</span>: out of stock"));
        assert!(page.contains("<h2>2 Frames</h2>"));
        assert!(page.contains("<li id=\"frame_0\" class=\"user active\">shop::b"));
        assert!(page.contains("<li id=\"frame_1\" class=\"runtime\">"));
        assert!(page.contains("data-panic-line=\"2\""));
        assert!(page.contains("<span class=\"line-number\">2</span>fn b() { panic!() }"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut trace = trace();
        trace.panic_message = "<script>alert('x')</script>".to_string();
        trace.triggering_file = "src/<b>.rs".to_string();
        trace.panic_line = "\"><img src=x>".to_string();

        let page = render_html(&trace).unwrap();

        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;alert('x')&lt;/script&gt;"));
        assert!(page.contains("src/&lt;b&gt;.rs"));
        assert!(!page.contains("\"><img src=x>"));
    }

    #[test]
    fn test_skipped_source_renders_placeholder() {
        let mut trace = trace();
        trace.source_formatted.clear();
        trace.source_skipped = true;

        let page = render_html(&trace).unwrap();

        assert!(page.contains("Source not available"));
        assert!(!page.contains("<pre data-panic-line"));
    }

    #[test]
    fn test_render_does_not_touch_trace() {
        let trace = trace();
        let before = format!("{trace:?}");
        let _ = render_html(&trace).unwrap();
        assert_eq!(format!("{trace:?}"), before);
    }
}
