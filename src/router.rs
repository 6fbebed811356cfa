use crate::handler::request::{RequestExtInternal, RoutingPath};
use crate::handler::{Handler, HandlerError, Next, Request, RequestExt, Response};
use crate::intercept::{IntoMountArgs, METHOD_TABLE, MountArg, MountCall, Surface};
use crate::methods::RouteMethod;
use futures_util::future::BoxFuture;
use layer::Layer;
use log::trace;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

mod error;
mod layer;
mod middleware;
mod pattern;

pub use error::RouterError;
pub use middleware::Middleware;
pub use pattern::PathPattern;

/// How a router's stack finished with a request.
#[derive(Debug)]
pub(crate) enum Flow {
    /// A handler returned without calling `next`.
    Handled,
    /// Every matching layer called `next`; carries the pending error, if any.
    Exhausted(Option<HandlerError>),
}

/// An ordered stack of layers, mountable inside an [`App`](crate::App) or
/// another router.
///
/// Clones share the same stack, so routes added after mounting are visible
/// to the parent.
#[derive(Clone, Default)]
pub struct Router {
    stack: Arc<RwLock<Vec<Arc<Layer>>>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `handlers` under `path`. They see requests whose path starts
    /// with `path` on a segment boundary, with that prefix removed.
    pub fn mount(
        &mut self,
        path: impl Into<PathPattern>,
        handlers: impl IntoMountArgs,
    ) -> Result<&mut Self, RouterError> {
        self.register(RouteMethod::Use, MountCall::with_path(path, handlers))
    }

    /// Mounts `handlers` at `/` without an explicit path.
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

    pub fn len(&self) -> usize {
        self.stack.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register(&mut self, method: RouteMethod, call: MountCall) -> Result<&mut Self, RouterError> {
        METHOD_TABLE.invoke(Surface::Router, method, call, |call| self.apply(method, call))?;
        Ok(self)
    }

    /// Appends the layers described by `call`, one per handler.
    ///
    /// A leading path argument is the layer path. Mounts without one default
    /// to `/`, verb routes require it.
    pub(crate) fn apply(&self, method: RouteMethod, call: MountCall) -> Result<(), RouterError> {
        let mut args = call.into_args().into_iter();
        let mut handlers = Vec::new();

        let path = match args.next() {
            Some(MountArg::Path(path)) => path,
            Some(first) if method.is_mount() => {
                flatten(method, first, &mut handlers)?;
                PathPattern::from("/")
            }
            Some(_) => return Err(RouterError::MissingPath { method }),
            None if method.is_mount() => return Err(RouterError::MissingHandler { method }),
            None => return Err(RouterError::MissingPath { method }),
        };

        for arg in args {
            flatten(method, arg, &mut handlers)?;
        }

        if handlers.is_empty() {
            return Err(RouterError::MissingHandler { method });
        }

        let layers = handlers
            .into_iter()
            .map(|handler| Layer::new(&path, method, handler).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        self.stack
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(layers);

        Ok(())
    }

    fn snapshot(&self) -> Vec<Arc<Layer>> {
        self.stack
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs the request through the matching layers in registration order.
    ///
    /// While an error is pending only error-aware handlers run; otherwise they
    /// are skipped. Dispatch stops at the first handler that returns without
    /// calling `next`.
    pub(crate) fn dispatch<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        mut err: Option<HandlerError>,
    ) -> BoxFuture<'a, Flow> {
        Box::pin(async move {
            let layers = self.snapshot();
            let base_url = req.base_url().to_string();
            let path = req.route_path().to_string();

            for layer in &layers {
                let handler = layer.handler();
                if err.is_some() != handler.is_error_aware() {
                    continue;
                }

                let Some(found) = layer.matches(&path, req.method()) else {
                    continue;
                };

                trace!("{} {} entered {:?}", req.method(), path, layer);
                req.set_params(found.params);

                let previous = if layer.strips_prefix() {
                    let (removed, rest) = path.split_at(found.consumed);
                    let rest = if rest.starts_with('/') {
                        rest.to_string()
                    } else {
                        format!("/{rest}")
                    };
                    let removed = removed.strip_suffix('/').unwrap_or(removed);

                    Some(req.replace_routing_path(Some(RoutingPath {
                        base_url: format!("{base_url}{removed}"),
                        path: rest,
                    })))
                } else {
                    None
                };

                let (next, signal) = Next::channel();
                handler.call(err.take(), req, res, next).await;

                if let Some(previous) = previous {
                    req.replace_routing_path(previous);
                }

                match signal.take() {
                    Some(advance) => err = advance,
                    None => return Flow::Handled,
                }
            }

            Flow::Exhausted(err)
        })
    }
}

fn flatten(method: RouteMethod, arg: MountArg, out: &mut Vec<Handler>) -> Result<(), RouterError> {
    match arg {
        MountArg::Handler(handler) => out.push(handler),
        MountArg::List(items) => {
            for item in items {
                flatten(method, item, out)?;
            }
        }
        MountArg::Path(_) => return Err(RouterError::UnexpectedPath { method }),
    }
    Ok(())
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("stack", &self.snapshot())
            .finish()
    }
}

macro_rules! generate_methods {
    (
        methods: [$($method:ident => $variant:ident),* $(,)?]
    ) => {
        impl Router {
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
