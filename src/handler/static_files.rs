//! Static file serving module
//!
//! Maps request paths into the content-type-partitioned directory tree and
//! streams file bytes with the matching Content-Type.

use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Pick the content subdirectory for a request path by file extension
///
/// Anything unrecognized, including no extension at all, lands in `pages`.
pub fn target_subfolder(request_path: &str) -> &'static str {
    let extension = Path::new(request_path)
        .extension()
        .and_then(|ext| ext.to_str());
    match extension {
        Some("css") => "styles",
        Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "ico") => "images",
        Some("js") => "scripts",
        // .html, unrecognized extensions, and extensionless paths
        _ => "pages",
    }
}

/// Compose `<root>/<subfolder>/<request path>` for a request
///
/// The leading slash is stripped and `..` segments dropped so the composed
/// path cannot escape the content root. Only whole segments are filtered;
/// a filename like `notes..html` passes through untouched.
pub fn resolve_path(root: &str, request_path: &str) -> PathBuf {
    let subfolder = target_subfolder(request_path);
    let mut path = Path::new(root).join(subfolder);
    let relative = Path::new(request_path.trim_start_matches('/'));
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            path.push(segment);
        }
    }
    path
}

/// Read the resolved file and build the success response
///
/// Existence was checked by the dispatcher; a read failure here (the file
/// vanished, permissions changed) is surfaced to the caller.
pub async fn serve_file(file_path: &Path, is_head: bool) -> std::io::Result<Response<Full<Bytes>>> {
    let content = fs::read(file_path).await?;
    let content_type =
        mime::get_content_type(file_path.extension().and_then(|ext| ext.to_str()));
    logger::log_decision(&format!(
        "Serving {} ({} bytes)",
        file_path.display(),
        content.len()
    ));
    Ok(http::build_file_response(content, content_type, is_head))
}
