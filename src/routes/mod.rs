//! Custom route table module
//!
//! Statically registered exact-path overrides checked before default static
//! resolution. The table is built once at startup, is read-only during
//! request handling, and the first matching descriptor governs.

use crate::handler::router::RequestContext;
use crate::session::Session;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Handler capability for a custom route
///
/// A single closure over the request context and the caller's session; the
/// handler owns the entire response. Flipping `Session::authorize` from
/// inside a handler is the only way a client becomes authorized.
pub type CustomHandler =
    Box<dyn Fn(&RequestContext, &Session) -> Response<Full<Bytes>> + Send + Sync>;

/// A registered custom route with its policy requirements
pub struct RouteDescriptor {
    /// Exact match against the request path. No wildcard or prefix matching.
    pub path: String,
    /// Reject unauthorized sessions with 401 before invoking the handler
    pub requires_auth: bool,
    /// Reject expired sessions with 401 before invoking the handler
    pub expirable: bool,
    pub handler: CustomHandler,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>, handler: CustomHandler) -> Self {
        Self {
            path: path.into(),
            requires_auth: false,
            expirable: false,
            handler,
        }
    }
}

/// Ordered list of custom routes, fixed at startup
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }

    /// First descriptor whose path equals the request path exactly
    pub fn find(&self, path: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|route| route.path == path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
