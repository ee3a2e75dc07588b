//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the dispatcher: content-type lookup and
//! response builders, decoupled from the policy logic.

pub mod mime;
pub mod response;

pub use response::{
    build_error_fallback_response, build_error_page_response, build_file_response,
    build_text_response,
};
