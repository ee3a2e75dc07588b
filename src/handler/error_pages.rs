//! Error responder module
//!
//! Maps every non-success dispatch outcome to a fixed status code and a
//! named static error page. Policy rejections (401) are routine outcomes
//! and log as informational decisions; missing resources and system
//! failures log with enough context to diagnose without a debugger.

use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::path::Path;
use tokio::fs;

pub const UNAUTHORIZED_PAGE: &str = "unauthorized-error.html";
pub const EXPIRED_PAGE: &str = "expired-session-error.html";
pub const NOT_FOUND_PAGE: &str = "not-found-error.html";
pub const INTERNAL_ERROR_PAGE: &str = "internal-server-error.html";

/// 401 for a session that lacks authorization
pub async fn respond_unauthorized(root: &str, request_path: &str) -> Response<Full<Bytes>> {
    logger::log_decision(&format!("Unauthorized session for {request_path}"));
    serve_error_page(root, StatusCode::UNAUTHORIZED, UNAUTHORIZED_PAGE).await
}

/// 401 for an expired session
pub async fn respond_expired(root: &str, request_path: &str) -> Response<Full<Bytes>> {
    logger::log_decision(&format!("Expired session for {request_path}"));
    serve_error_page(root, StatusCode::UNAUTHORIZED, EXPIRED_PAGE).await
}

/// 404 carrying the attempted filesystem path for diagnostics
pub async fn respond_not_found(
    root: &str,
    file_path: &Path,
    request_path: &str,
) -> Response<Full<Bytes>> {
    logger::log_error(&format!(
        "File not found: {} (requested URL: {request_path})",
        file_path.display()
    ));
    serve_error_page(root, StatusCode::NOT_FOUND, NOT_FOUND_PAGE).await
}

/// 500 for anything the pipeline cannot attribute to the client
pub async fn respond_internal_error(
    root: &str,
    file_path: &Path,
    err: &std::io::Error,
    request_path: &str,
) -> Response<Full<Bytes>> {
    logger::log_error(&format!(
        "Internal server error when accessing file {}: {err} (requested URL: {request_path})",
        file_path.display()
    ));
    serve_error_page(root, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_PAGE).await
}

/// Render a named error page with a fixed status code
///
/// The status code is decided before the page read; if the read fails the
/// same status is served with a plain-text body instead. This path never
/// panics and never produces a response without a status code.
async fn serve_error_page(
    root: &str,
    status: StatusCode,
    page_filename: &str,
) -> Response<Full<Bytes>> {
    let page_path = Path::new(root).join("pages").join("error").join(page_filename);
    match fs::read(&page_path).await {
        Ok(content) => http::build_error_page_response(status, content),
        Err(err) => {
            logger::log_error(&format!(
                "Failed to load custom error page {}: {err}",
                page_path.display()
            ));
            http::build_error_fallback_response(status)
        }
    }
}
