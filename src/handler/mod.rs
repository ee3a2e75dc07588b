//! Request handler module
//!
//! The dispatch pipeline: session resolution, custom-route matching with
//! policy checks, path-substring policy checks, and static file fallback,
//! with every failure mapped to an error page.

pub mod error_pages;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
