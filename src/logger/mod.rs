//! Logger module
//!
//! Logging utilities for the dispatcher:
//! - Server lifecycle logging
//! - Per-request decision-path logging (method, headers, query, body)
//! - Access logging with multiple formats
//! - Error and warning logging with file-based output support
//!
//! Logging is a diagnostic side channel. Nothing here returns an error to
//! request handling; a request must never fail because a log line did.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use hyper::HeaderMap;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_access(message);
    } else {
        println!("{message}");
    }
}

fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Session-gated server started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Content root: {}", config.content.root));
    write_info(&format!(
        "Session expiration: {}s",
        config.session.expiration_secs
    ));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log the request line before any policy evaluation
pub fn log_request(method: &hyper::Method, path: &str, query: Option<&str>) {
    match query {
        Some(q) => write_info(&format!("[Request] {method} {path}?{q}")),
        None => write_info(&format!("[Request] {method} {path}")),
    }
}

/// Log request headers when enabled
pub fn log_headers(headers: &HeaderMap, show: bool) {
    if !show {
        return;
    }
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("<non-ascii>");
        write_info(&format!("[Header] {name}: {value}"));
    }
}

/// Log the raw body of a mutating request
pub fn log_request_body(body: &[u8]) {
    match std::str::from_utf8(body) {
        Ok(text) => write_info(&format!("[Body] {text}")),
        Err(_) => write_info(&format!("[Body] <{} non-utf8 bytes>", body.len())),
    }
}

/// Log a routine dispatch decision (policy rejections are not errors)
pub fn log_decision(message: &str) {
    write_info(&format!("[Dispatch] {message}"));
}

pub fn log_session_created(key: &str) {
    write_info(&format!("[Session] Created for client: {key}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
