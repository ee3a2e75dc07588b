//! Request routing dispatch module
//!
//! The ordered decision sequence turning a request plus the caller's session
//! into exactly one response:
//!
//! 1. resolve the session (creating it on first contact)
//! 2. custom routes, exact path match, with per-route auth/expiry policy
//! 3. path-substring policy checks (`closed/`, `expirable/`)
//! 4. extension-based subdirectory mapping and static file serving
//!
//! The pipeline never fails outward: every branch, including logging
//! failures and filesystem errors, resolves to some HTTP response.

use crate::config::AppState;
use crate::handler::{error_pages, static_files};
use crate::logger::{self, AccessLogEntry};
use crate::session::Session;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, Response};
use std::convert::Infallible;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Request context handed to policy checks and custom route handlers
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Raw body bytes, collected for mutating methods only
    pub body: Bytes,
    pub remote_addr: String,
    pub is_head: bool,
}

impl RequestContext {
    #[cfg(test)]
    pub fn for_tests(method: &str, path: &str) -> Self {
        Self {
            method: method.parse().unwrap(),
            path: path.to_string(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: "127.0.0.1:40000".to_string(),
            is_head: false,
        }
    }
}

/// What the decision sequence concluded for one request
pub enum Outcome {
    /// A custom route handler produced the entire response
    Handled(Response<Full<Bytes>>),
    Unauthorized,
    Expired,
    /// The composed filesystem path does not exist
    NotFound(PathBuf),
    /// The existence check failed for a reason other than absence
    Internal(PathBuf, std::io::Error),
    /// The composed path exists and should be served
    Static(PathBuf),
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let ctx = build_context(req, remote_addr).await;

    // Diagnostic side channel, before any policy evaluation
    logger::log_request(&ctx.method, &ctx.path, ctx.query.as_deref());
    logger::log_headers(&ctx.headers, state.config.logging.show_headers);
    if state.config.logging.log_request_body && !ctx.body.is_empty() {
        logger::log_request_body(&ctx.body);
    }

    let session = state.sessions.get_or_create(&ctx.remote_addr);
    let outcome = dispatch(&ctx, &session, &state);
    let response = respond(&ctx, &session, &state, outcome).await;

    if state.cached_access_log.load(Ordering::Relaxed) {
        log_access_entry(&ctx, &response, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Collect the pieces of the request the pipeline needs
///
/// The body is read only for mutating methods, mirroring what gets logged;
/// a failed body read degrades to an empty body rather than failing the
/// request.
async fn build_context(
    req: Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> RequestContext {
    let (parts, body) = req.into_parts();
    let is_mutating = parts.method == Method::POST || parts.method == Method::PUT;
    let body = if is_mutating {
        match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                logger::log_warning(&format!("Error reading request body: {err}"));
                Bytes::new()
            }
        }
    } else {
        Bytes::new()
    };

    RequestContext {
        is_head: parts.method == Method::HEAD,
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(ToString::to_string),
        headers: parts.headers,
        body,
        remote_addr: remote_addr.to_string(),
    }
}

/// Run the decision sequence, short-circuiting on the first applicable branch
pub fn dispatch(ctx: &RequestContext, session: &Arc<Session>, state: &AppState) -> Outcome {
    // Custom routes win over everything, in declaration order
    if let Some(route) = state.routes.find(&ctx.path) {
        if route.requires_auth && !session.is_authorized() {
            return Outcome::Unauthorized;
        }
        if route.expirable && state.sessions.is_expired(session) {
            return Outcome::Expired;
        }
        return Outcome::Handled((route.handler)(ctx, session.as_ref()));
    }

    // Path-substring policies, checked before any filesystem access
    if ctx.path.contains("closed/") && !session.is_authorized() {
        return Outcome::Unauthorized;
    }
    if ctx.path.contains("expirable/") && state.sessions.is_expired(session) {
        return Outcome::Expired;
    }

    let file_path = static_files::resolve_path(&state.config.content.root, &ctx.path);
    match std::fs::metadata(&file_path) {
        Ok(_) => Outcome::Static(file_path),
        Err(err) if err.kind() == ErrorKind::NotFound => Outcome::NotFound(file_path),
        Err(err) => Outcome::Internal(file_path, err),
    }
}

/// Render the outcome into the response, touching the session only after a
/// successful static serve
pub async fn respond(
    ctx: &RequestContext,
    session: &Arc<Session>,
    state: &AppState,
    outcome: Outcome,
) -> Response<Full<Bytes>> {
    let root = &state.config.content.root;
    match outcome {
        Outcome::Handled(response) => response,
        Outcome::Unauthorized => error_pages::respond_unauthorized(root, &ctx.path).await,
        Outcome::Expired => error_pages::respond_expired(root, &ctx.path).await,
        Outcome::NotFound(file_path) => {
            error_pages::respond_not_found(root, &file_path, &ctx.path).await
        }
        Outcome::Internal(file_path, err) => {
            error_pages::respond_internal_error(root, &file_path, &err, &ctx.path).await
        }
        Outcome::Static(file_path) => {
            match static_files::serve_file(&file_path, ctx.is_head).await {
                Ok(response) => {
                    session.touch();
                    response
                }
                // The file vanished or became unreadable between the
                // existence check and the read
                Err(err) => {
                    error_pages::respond_internal_error(root, &file_path, &err, &ctx.path).await
                }
            }
        }
    }
}

/// Emit one access log line for the finished request
fn log_access_entry(ctx: &RequestContext, response: &Response<Full<Bytes>>, format: &str) {
    let mut entry = AccessLogEntry::new(
        ctx.remote_addr.clone(),
        ctx.method.to_string(),
        ctx.path.clone(),
    );
    entry.query = ctx.query.clone();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.user_agent = ctx
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    logger::log_access(&entry, format);
}


#[cfg(test)]
mod tests {
    use super::tests_support::body_bytes;
    use super::*;
    use crate::config::{
        Config, ContentConfig, LoggingConfig, PerformanceConfig, ServerConfig, SessionConfig,
    };
    use crate::http::build_text_response;
    use crate::routes::{RouteDescriptor, RouteTable};
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path, expiration_secs: u64) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            session: SessionConfig { expiration_secs },
            content: ContentConfig {
                root: root.to_str().unwrap().to_string(),
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            logging: LoggingConfig {
                access_log: false,
                show_headers: false,
                log_request_body: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
        }
    }

    /// Content root with the on-disk layout contract in place
    fn content_root() -> TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["pages", "styles", "images", "scripts"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        let error_dir = tmp.path().join("pages").join("error");
        std::fs::create_dir_all(&error_dir).unwrap();
        std::fs::write(error_dir.join("unauthorized-error.html"), "UNAUTHORIZED").unwrap();
        std::fs::write(error_dir.join("expired-session-error.html"), "EXPIRED").unwrap();
        std::fs::write(error_dir.join("not-found-error.html"), "NOT FOUND").unwrap();
        std::fs::write(error_dir.join("internal-server-error.html"), "INTERNAL").unwrap();
        tmp
    }

    fn state_with_routes(root: &TempDir, expiration_secs: u64, routes: RouteTable) -> AppState {
        AppState::new(test_config(root.path(), expiration_secs), routes)
    }

    fn state(root: &TempDir) -> AppState {
        state_with_routes(root, 30, RouteTable::default())
    }

    async fn run(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        let outcome = dispatch(ctx, &session, state);
        respond(ctx, &session, state, outcome).await
    }

    #[tokio::test]
    async fn test_static_css_served_from_styles_subfolder() {
        let root = content_root();
        std::fs::write(root.path().join("styles").join("app.css"), "body{}").unwrap();
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/app.css");
        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/css");
        assert_eq!(body_bytes(resp).await.as_ref(), b"body{}");
    }

    #[tokio::test]
    async fn test_filename_with_consecutive_dots_is_served() {
        let root = content_root();
        std::fs::write(root.path().join("pages").join("notes..html"), "DOTS").unwrap();
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/notes..html");
        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await.as_ref(), b"DOTS");
    }

    #[tokio::test]
    async fn test_missing_file_serves_not_found_page_without_touch() {
        let root = content_root();
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/missing.html");
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        let before = session.last_seen();

        let outcome = dispatch(&ctx, &session, &state);
        assert!(matches!(
            &outcome,
            Outcome::NotFound(path) if path.ends_with("pages/missing.html")
        ));

        let resp = respond(&ctx, &session, &state, outcome).await;
        assert_eq!(resp.status(), 404);
        assert_eq!(body_bytes(resp).await.as_ref(), b"NOT FOUND");
        // A failed request must not extend the session
        assert_eq!(session.last_seen(), before);
    }

    #[tokio::test]
    async fn test_successful_serve_touches_session() {
        let root = content_root();
        std::fs::write(root.path().join("pages").join("index.html"), "<html>").unwrap();
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/index.html");
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        let before = session.last_seen();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 200);
        assert!(session.last_seen() > before);
    }

    #[tokio::test]
    async fn test_closed_path_rejected_before_filesystem_check() {
        let root = content_root();
        // Note: no file exists at this path. The 401 must come anyway.
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/closed/secret.html");
        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 401);
        assert_eq!(body_bytes(resp).await.as_ref(), b"UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_closed_path_served_once_authorized() {
        let root = content_root();
        let closed_dir = root.path().join("pages").join("closed");
        std::fs::create_dir_all(&closed_dir).unwrap();
        std::fs::write(closed_dir.join("secret.html"), "SECRET").unwrap();
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/closed/secret.html");
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        session.authorize();

        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await.as_ref(), b"SECRET");
    }

    #[tokio::test]
    async fn test_expirable_path_rejected_when_session_expired() {
        let root = content_root();
        let expirable_dir = root.path().join("pages").join("expirable");
        std::fs::create_dir_all(&expirable_dir).unwrap();
        std::fs::write(expirable_dir.join("feed.html"), "FEED").unwrap();
        // Zero-length window: any elapsed time expires the session
        let state = state_with_routes(&root, 0, RouteTable::default());

        let ctx = RequestContext::for_tests("GET", "/expirable/feed.html");
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        std::thread::sleep(std::time::Duration::from_millis(5));

        let outcome = dispatch(&ctx, &session, &state);
        assert!(matches!(outcome, Outcome::Expired));
        let resp = respond(&ctx, &session, &state, outcome).await;
        assert_eq!(resp.status(), 401);
        assert_eq!(body_bytes(resp).await.as_ref(), b"EXPIRED");
    }

    #[tokio::test]
    async fn test_expirable_path_served_within_window() {
        let root = content_root();
        let expirable_dir = root.path().join("pages").join("expirable");
        std::fs::create_dir_all(&expirable_dir).unwrap();
        std::fs::write(expirable_dir.join("feed.html"), "FEED").unwrap();
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/expirable/feed.html");
        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_auth_required_route_rejects_without_invoking_handler() {
        static INVOKED: AtomicBool = AtomicBool::new(false);
        let root = content_root();
        let mut route = RouteDescriptor::new(
            "/admin",
            Box::new(|_, _| {
                INVOKED.store(true, Ordering::Relaxed);
                build_text_response("admin")
            }),
        );
        route.requires_auth = true;
        let state = state_with_routes(&root, 30, RouteTable::new(vec![route]));

        let ctx = RequestContext::for_tests("GET", "/admin");
        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 401);
        assert_eq!(body_bytes(resp).await.as_ref(), b"UNAUTHORIZED");
        assert!(!INVOKED.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_custom_route_handler_owns_response() {
        let root = content_root();
        let route = RouteDescriptor::new(
            "/custom/authorize",
            Box::new(|_, session: &Session| {
                session.authorize();
                build_text_response("Now Authorized")
            }),
        );
        let state = state_with_routes(&root, 30, RouteTable::new(vec![route]));

        let ctx = RequestContext::for_tests("GET", "/custom/authorize");
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        assert!(!session.is_authorized());

        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await.as_ref(), b"Now Authorized");
        assert!(session.is_authorized());
    }

    #[tokio::test]
    async fn test_expirable_route_rejects_expired_session() {
        let root = content_root();
        let mut route =
            RouteDescriptor::new("/live", Box::new(|_, _| build_text_response("live")));
        route.expirable = true;
        let state = state_with_routes(&root, 0, RouteTable::new(vec![route]));

        let ctx = RequestContext::for_tests("GET", "/live");
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        std::thread::sleep(std::time::Duration::from_millis(5));

        let outcome = dispatch(&ctx, &session, &state);
        assert!(matches!(outcome, Outcome::Expired));
    }

    #[tokio::test]
    async fn test_custom_route_is_exact_match_only() {
        let root = content_root();
        let route = RouteDescriptor::new(
            "/custom/authorize",
            Box::new(|_, _| build_text_response("Now Authorized")),
        );
        let state = state_with_routes(&root, 30, RouteTable::new(vec![route]));

        // Falls through to static resolution and 404s
        let ctx = RequestContext::for_tests("GET", "/custom/authorize/extra");
        let resp = run(&ctx, &state).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_session_identity_survives_across_requests() {
        let root = content_root();
        std::fs::write(root.path().join("pages").join("a.html"), "A").unwrap();
        let state = state(&root);

        let ctx = RequestContext::for_tests("GET", "/a.html");
        let first = state.sessions.get_or_create(&ctx.remote_addr);
        first.authorize();
        run(&ctx, &state).await;

        // Same client, new connection (different port), same session
        let second = state.sessions.get_or_create("127.0.0.1:40001");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.is_authorized());
    }

    #[tokio::test]
    async fn test_extensionless_path_resolves_under_pages() {
        let root = content_root();
        let state = state(&root);
        let ctx = RequestContext::for_tests("GET", "/about");
        let session = state.sessions.get_or_create(&ctx.remote_addr);
        let outcome = dispatch(&ctx, &session, &state);
        assert!(matches!(
            &outcome,
            Outcome::NotFound(path) if path.ends_with("pages/about")
        ));
    }
}
