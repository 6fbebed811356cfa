use crate::intercept::WrapMarker;
use crate::router::{Flow, Router};
use futures_util::future::BoxFuture;
use smallvec::SmallVec;
use std::fmt;
use std::future::ready;
use std::sync::Arc;

mod error;
mod next;
pub mod request;
pub mod response;

pub use error::HandlerError;
pub use next::Next;
pub use request::{Request, RequestExt, RouteParams};
pub use response::Response;

/// `(req)`: observes the request and always continues.
pub type InspectFn = Arc<dyn Fn(&mut Request) + Send + Sync>;

/// `(req, res)`: terminal handler without a continuation.
pub type EndpointFn =
    Arc<dyn for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, ()> + Send + Sync>;

/// `(req, res, next)`: regular middleware.
pub type MiddlewareFn = Arc<
    dyn for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, ()> + Send + Sync,
>;

/// `(err, req, res, next)`: only invoked while an error is pending.
pub type ErrorFn = Arc<
    dyn for<'a> Fn(HandlerError, &'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, ()>
        + Send
        + Sync,
>;

/// The handler signature, declared up front instead of discovered at call time.
///
/// The dispatcher uses the variant exactly the way Express uses `fn.length`:
/// error-aware handlers are skipped unless an error is pending, every other
/// handler is skipped while one is.
#[derive(Clone)]
pub enum HandlerKind {
    Inspect(InspectFn),
    Endpoint(EndpointFn),
    Middleware(MiddlewareFn),
    ErrorAware(ErrorFn),
}

impl HandlerKind {
    /// Number of parameters of the underlying signature.
    pub fn arity(&self) -> usize {
        match self {
            HandlerKind::Inspect(_) => 1,
            HandlerKind::Endpoint(_) => 2,
            HandlerKind::Middleware(_) => 3,
            HandlerKind::ErrorAware(_) => 4,
        }
    }
}

/// A registered request handler.
#[derive(Clone)]
pub struct Handler {
    kind: HandlerKind,
    markers: SmallVec<[WrapMarker; 1]>,
}

impl Handler {
    pub fn from_kind(kind: HandlerKind) -> Self {
        Self {
            kind,
            markers: SmallVec::new(),
        }
    }

    pub fn inspect<F>(f: F) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        Self::from_kind(HandlerKind::Inspect(Arc::new(f)))
    }

    pub fn endpoint<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        Self::from_kind(HandlerKind::Endpoint(Arc::new(f)))
    }

    pub fn middleware<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        Self::from_kind(HandlerKind::Middleware(Arc::new(f)))
    }

    pub fn error_aware<F>(f: F) -> Self
    where
        F: for<'a> Fn(HandlerError, &'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        Self::from_kind(HandlerKind::ErrorAware(Arc::new(f)))
    }

    /// Synchronous form of [`Handler::endpoint`].
    pub fn endpoint_sync<F>(f: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        Self::endpoint(move |req, res| {
            f(req, res);
            Box::pin(ready(()))
        })
    }

    /// Synchronous form of [`Handler::middleware`].
    pub fn middleware_sync<F>(f: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, Next) + Send + Sync + 'static,
    {
        Self::middleware(move |req, res, next| {
            f(req, res, next);
            Box::pin(ready(()))
        })
    }

    /// Synchronous form of [`Handler::error_aware`].
    pub fn error_aware_sync<F>(f: F) -> Self
    where
        F: Fn(HandlerError, &mut Request, &mut Response, Next) + Send + Sync + 'static,
    {
        Self::error_aware(move |err, req, res, next| {
            f(err, req, res, next);
            Box::pin(ready(()))
        })
    }

    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    pub fn arity(&self) -> usize {
        self.kind.arity()
    }

    pub fn is_error_aware(&self) -> bool {
        matches!(self.kind, HandlerKind::ErrorAware(_))
    }

    pub fn has_marker(&self, marker: WrapMarker) -> bool {
        self.markers.contains(&marker)
    }

    /// Tags the handler so that a wrapper applying `marker` leaves it alone.
    pub fn with_marker(mut self, marker: WrapMarker) -> Self {
        if !self.has_marker(marker) {
            self.markers.push(marker);
        }
        self
    }

    pub(crate) fn call<'a>(
        &'a self,
        err: Option<HandlerError>,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next,
    ) -> BoxFuture<'a, ()> {
        match &self.kind {
            HandlerKind::Inspect(f) => {
                f(req);
                next.call();
                Box::pin(ready(()))
            }
            HandlerKind::Endpoint(f) => f(req, res),
            HandlerKind::Middleware(f) => f(req, res, next),
            HandlerKind::ErrorAware(f) => match err {
                Some(err) => f(err, req, res, next),
                None => {
                    next.call();
                    Box::pin(ready(()))
                }
            },
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("arity", &self.arity())
            .field("markers", &self.markers)
            .finish()
    }
}

/// A router mounted as a handler behaves like `(req, res, next)`: it runs its
/// own stack and hands control back to the parent once that stack is exhausted.
impl From<Router> for Handler {
    fn from(router: Router) -> Self {
        Handler::middleware(move |req, res, next| {
            let router = router.clone();
            Box::pin(async move {
                if let Flow::Exhausted(err) = router.dispatch(req, res, None).await {
                    next.advance(err);
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn request() -> Request {
        hyper::Request::builder()
            .uri("/")
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn arity_follows_the_declared_signature() {
        assert_eq!(Handler::inspect(|_| {}).arity(), 1);
        assert_eq!(Handler::endpoint_sync(|_, _| {}).arity(), 2);
        assert_eq!(Handler::middleware_sync(|_, _, _| {}).arity(), 3);
        assert_eq!(Handler::error_aware_sync(|_, _, _, _| {}).arity(), 4);
        assert_eq!(Handler::from(Router::new()).arity(), 3);
    }

    #[test]
    fn markers_are_not_duplicated() {
        let marker = WrapMarker::new("test");
        let handler = Handler::inspect(|_| {})
            .with_marker(marker)
            .with_marker(marker);

        assert!(handler.has_marker(marker));
        assert_eq!(handler.markers.len(), 1);
    }

    #[tokio::test]
    async fn error_aware_handler_without_error_just_continues() {
        let handler = Handler::error_aware_sync(|_, _, res, _| {
            res.send("should not run");
        });
        let (next, signal) = Next::channel();
        let mut req = request();
        let mut res = Response::new();

        handler.call(None, &mut req, &mut res, next).await;

        assert!(!res.is_ended());
        assert!(matches!(signal.take(), Some(None)));
    }

    #[tokio::test]
    async fn inspect_handler_always_continues() {
        let handler = Handler::inspect(|req| {
            req.headers_mut()
                .insert("x-seen", hyper::header::HeaderValue::from_static("1"));
        });
        let (next, signal) = Next::channel();
        let mut req = request();
        let mut res = Response::new();

        handler.call(None, &mut req, &mut res, next).await;

        assert!(req.headers().contains_key("x-seen"));
        assert!(matches!(signal.take(), Some(None)));
    }
}
