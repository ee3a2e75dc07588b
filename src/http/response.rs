//! HTTP response building module
//!
//! Provides builders for the response shapes the dispatcher produces,
//! decoupled from the dispatch logic itself.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Build a 200 response carrying a static file body
pub fn build_file_response(
    content: Vec<u8>,
    content_type: &'static str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build an error response carrying a custom HTML error page
pub fn build_error_page_response(status: StatusCode, page: Vec<u8>) -> Response<Full<Bytes>> {
    let content_length = page.len();
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(Bytes::from(page)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            plain_status_response(status)
        })
}

/// Build the plain-text fallback used when an error page cannot be read
pub fn build_error_fallback_response(status: StatusCode) -> Response<Full<Bytes>> {
    let body = format!("Error {}: could not load error page", status.as_u16());
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            plain_status_response(status)
        })
}

/// Build a plain-text 200 response (used by custom route handlers)
pub fn build_text_response(content: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(content.to_owned())))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Last-resort response: status code with an empty body, cannot fail
fn plain_status_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_response_headers() {
        let resp = build_file_response(b"body { color: red; }".to_vec(), "text/css", false);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/css");
        assert_eq!(resp.headers()["Content-Length"], "20");
    }

    #[test]
    fn test_head_response_has_empty_body_but_full_length() {
        let resp = build_file_response(b"hello".to_vec(), "text/plain; charset=utf-8", true);
        assert_eq!(resp.headers()["Content-Length"], "5");
    }

    #[test]
    fn test_fallback_mentions_status_code() {
        let resp = build_error_fallback_response(StatusCode::NOT_FOUND);
        assert_eq!(resp.status(), 404);
    }
}
