use crate::handler::{Request, Response};
use crate::intercept::{IntoMountArgs, METHOD_TABLE, MountCall, Surface};
use crate::methods::RouteMethod;
use crate::router::{Flow, Middleware, PathPattern, Router, RouterError};
use crate::server::{Server, ServerConfig, ServerError};
use log::{debug, warn};
use std::sync::Arc;

/// Top-level application: a root [`Router`] plus the Express fallbacks for
/// unmatched requests and unhandled errors.
#[derive(Debug, Clone, Default)]
pub struct App {
    router: Router,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn mount(
        &mut self,
        path: impl Into<PathPattern>,
        handlers: impl IntoMountArgs,
    ) -> Result<&mut Self, RouterError> {
        self.register(RouteMethod::Use, MountCall::with_path(path, handlers))
    }

    pub fn use_handler(&mut self, handlers: impl IntoMountArgs) -> Result<&mut Self, RouterError> {
        self.register(RouteMethod::Use, MountCall::without_path(handlers))
    }

    pub fn use_with<M: Middleware>(&mut self, middleware: M) -> Result<&mut Self, RouterError> {
        let handler = middleware.create_handler();
        let call = match middleware.target_path() {
            Some(path) => MountCall::with_path(path, handler),
            None => MountCall::without_path(handler),
        };

        self.register(RouteMethod::Use, call)
    }

    fn register(&mut self, method: RouteMethod, call: MountCall) -> Result<&mut Self, RouterError> {
        let router = &self.router;
        METHOD_TABLE.invoke(Surface::Application, method, call, |call| {
            router.apply(method, call)
        })?;
        Ok(self)
    }

    /// Dispatches one request and returns the response it produced.
    pub async fn handle(&self, req: &mut Request) -> Response {
        let mut res = Response::new();

        match self.router.dispatch(req, &mut res, None).await {
            Flow::Handled => {}
            Flow::Exhausted(_) if res.is_ended() => {
                debug!(
                    "{} {} reached the end of the stack after responding",
                    req.method(),
                    req.uri().path()
                );
            }
            Flow::Exhausted(Some(err)) => {
                warn!("{} {} failed: {}", req.method(), req.uri().path(), err);
                res.status(err.status()).send(err.message().to_string());
            }
            Flow::Exhausted(None) => {
                let body = format!("Cannot {} {}", req.method(), req.uri().path());
                res.status(hyper::StatusCode::NOT_FOUND).send(body);
            }
        }

        res
    }

    pub async fn listen<T: FnOnce()>(self, config: ServerConfig, callback: T) -> Result<(), ServerError> {
        let addr = config.addr()?;

        callback();

        Server::bind(addr, Arc::new(self)).await
    }
}

macro_rules! generate_methods {
    (
        methods: [$($method:ident => $variant:ident),* $(,)?]
    ) => {
        impl App {
            $(
                pub fn $method(
                    &mut self,
                    path: impl Into<PathPattern>,
                    handlers: impl IntoMountArgs,
                ) -> Result<&mut Self, RouterError> {
                    self.register(RouteMethod::$variant, MountCall::with_path(path, handlers))
                }
            )*
        }
    };
}

generate_methods! {
    methods: [
        all => All,
        get => Get,
        post => Post,
        put => Put,
        delete => Delete,
        patch => Patch,
        head => Head,
        options => Options,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, HandlerError};
    use bytes::Bytes;
    use hyper::StatusCode;

    fn request(uri: &str) -> Request {
        hyper::Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn unmatched_requests_get_a_404() {
        let app = App::new();
        let res = app.handle(&mut request("/nowhere")).await;

        assert_eq!(res.current_status(), StatusCode::NOT_FOUND);
        assert_eq!(res.body(), b"Cannot GET /nowhere");
    }

    #[tokio::test]
    async fn unhandled_errors_use_their_status() {
        let mut app = App::new();
        app.use_handler(Handler::middleware_sync(|_, _, next| {
            next.fail(HandlerError::new(503, "upstream down"));
        }))
        .unwrap();

        let res = app.handle(&mut request("/")).await;

        assert_eq!(res.current_status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.body(), b"upstream down");
    }

    #[tokio::test]
    async fn next_after_send_keeps_the_response() {
        let mut app = App::new();
        app.get("/", Handler::middleware_sync(|_, res, next| {
            res.send("first");
            next.call();
        }))
        .unwrap();

        let res = app.handle(&mut request("/")).await;

        assert_eq!(res.current_status(), StatusCode::OK);
        assert_eq!(res.body(), b"first");
    }
}
