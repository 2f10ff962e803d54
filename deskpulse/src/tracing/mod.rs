//! Span naming and request attributes shared by the server loop.

use common::consts::REQUEST_ID_HEADER;
use hyper::header::HeaderMap;
use hyper::Method;
use uuid::Uuid;

/// Span field names following the OpenTelemetry HTTP conventions.
pub mod http {
    /// Recorded once the response is built.
    pub const STATUS_CODE: &str = "http.status_code";
}

/// Span field names specific to the reports.
pub mod report {
    /// Milliseconds spent producing the response.
    pub const DURATION_MS: &str = "report.duration_ms";
}

/// `{method} {path}`, used as the exported span name.
pub fn operation_name(method: &Method, path: &str) -> String {
    format!("{} {}", method, path)
}

/// Caller supplied request id, or a fresh one.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name(&Method::GET, "/alerts"), "GET /alerts");
    }

    #[test]
    fn test_request_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));
        assert_eq!(request_id(&headers), "req-42");

        let generated = request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&generated).is_ok());
    }
}
