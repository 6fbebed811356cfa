use crate::handler::{Handler, Request};
use crate::intercept::WrapMarker;
use crate::mountpath::MountTrace;
use crate::router::{Middleware, PathPattern};
use log::info;

const LOGGER_MARKER: WrapMarker = WrapMarker::new("request_logger");

/// Middleware that logs each request once its response is sent.
///
/// The log line carries the normalized mount path, so requests served by the
/// same route group together regardless of their concrete URL:
///
/// ```text
/// GET /api/users/42 -> /api/users/:id (User-Agent: curl/8.5.0)
/// ```
///
/// Requests that never reach a send are not logged. Mount it first, without a
/// path, so that every response carries the hook.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    path: Option<String>,
}

impl RequestLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log requests under `path`.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl Middleware for RequestLogger {
    fn target_path(&self) -> Option<PathPattern> {
        self.path.clone().map(PathPattern::from)
    }

    fn create_handler(&self) -> Handler {
        Handler::middleware_sync(|req, res, next| {
            let trace = MountTrace::attach(req);
            let line = request_line(req);

            res.wrap_send(LOGGER_MARKER, move || {
                let route = trace.normalized_path().unwrap_or_else(|| "-".to_string());
                info!("{} -> {}", line, route);
            });

            next.call();
        })
    }
}

fn request_line(req: &Request) -> String {
    format!(
        "{} {} (User-Agent: {})",
        req.method(),
        req.uri(),
        req.headers()
            .get(hyper::header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("Unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Next, Response};
    use bytes::Bytes;

    #[tokio::test]
    async fn hooks_the_response_and_continues() {
        let handler = RequestLogger::new().create_handler();
        let mut req = hyper::Request::builder()
            .uri("/api/users/42")
            .header("User-Agent", "test")
            .body(Bytes::new())
            .unwrap();
        let mut res = Response::new();
        let (next, signal) = Next::channel();

        handler.call(None, &mut req, &mut res, next).await;

        assert!(res.is_send_wrapped(LOGGER_MARKER));
        assert!(MountTrace::of(&req).is_some());
        assert!(matches!(signal.take(), Some(None)));
        assert_eq!(request_line(&req), "GET /api/users/42 (User-Agent: test)");
    }

    #[test]
    fn target_path_is_optional() {
        assert!(RequestLogger::new().target_path().is_none());
        assert_eq!(
            RequestLogger::at("/api").target_path().map(|p| p.to_string()),
            Some("/api".to_string())
        );
    }
}
