//! Express-style routing on hyper, with per-request tracking of the full
//! route pattern across nested routers.
//!
//! See [`mountpath`] for the tracking itself.

pub mod application;
pub mod express;
pub mod handler;
pub mod intercept;
pub mod methods;
pub mod mountpath;
pub mod router;
mod server;

pub use application::App;
pub use express::{RequestLogger, app, router};
pub use handler::{Handler, HandlerError, HandlerKind, Next, Request, RequestExt, Response};
pub use methods::RouteMethod;
pub use router::{Middleware, PathPattern, Router, RouterError};
pub use server::{ServerConfig, ServerError};
