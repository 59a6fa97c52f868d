//! JSON rendering of a trace

use crate::domain::DiagnosticError;
use crate::trace::TraceAggregate;

/// Serialize `trace` for API clients.
///
/// The raw capture and the unnumbered source are left out; the numbered
/// source lines and the normalized stack carry the same information.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json(trace: &TraceAggregate) -> Result<String, DiagnosticError> {
    Ok(serde_json::to_string_pretty(trace)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Frame;

    #[test]
    fn test_render_json_fields() {
        let trace = TraceAggregate {
            app_name: "shop".to_string(),
            raw_capture: b"secret raw dump".to_vec(),
            frames: vec![Frame::new("shop::orders::place", "src/orders.rs", "3")],
            panic_type: "OrderError".to_string(),
            panic_message: "out of stock".to_string(),
            panic_line: "3".to_string(),
            ..TraceAggregate::default()
        };

        let json: serde_json::Value = serde_json::from_str(&render_json(&trace).unwrap()).unwrap();

        assert_eq!(json["app_name"], "shop");
        assert_eq!(json["panic_type"], "OrderError");
        assert_eq!(json["frames"][0]["file"], "src/orders.rs");
        assert_eq!(json["frames"][0]["line"], "3");
        assert_eq!(json["frames"][0]["origin"], "user_code");
        assert!(json.get("raw_capture").is_none());
    }
}
