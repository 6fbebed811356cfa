//! Normalized mount path tracking.
//!
//! Nested routers only ever see the path segment they were mounted at. This
//! module rebuilds the full route pattern of a request (e.g.
//! `/api/users/:id`) by keeping a per-request stack of mount paths:
//!
//! * a handler registered under a path pushes that path when it is entered;
//! * calling `next()` without an error pops it again, since the handler
//!   declined the request;
//! * calling `next` with an error keeps it, so error handlers report the
//!   path that failed;
//! * sending a response freezes the stack for good.
//!
//! Instrumentation is opt-in: call [`install`] once, before or after the
//! application is built. Registrations made afterwards are instrumented.
//!
//! ```rust,no_run
//! use express_mountpath::{app, mountpath, Handler, Router};
//! use express_mountpath::mountpath::MountPathExt;
//!
//! mountpath::install();
//!
//! let mut users = Router::new();
//! users.get("/:id", Handler::endpoint_sync(|req, res| {
//!     let route = req.mount_path().unwrap_or_default();
//!     res.send(route);
//! })).unwrap();
//!
//! let mut app = app();
//! app.mount("/api/users", users).unwrap();
//! ```

use crate::intercept::WrapMarker;

mod continuation;
mod handler_wrap;
mod installer;
mod mount_call;
mod options;
mod stack;
mod terminal;

pub use continuation::wrap_next;
pub use handler_wrap::{MountInfo, Signature, wrap_handler};
pub use installer::{DEFAULT_METHODS, install, install_with, is_installed};
pub use mount_call::instrument_mount_call;
pub use options::InstallOptions;
pub use stack::{
    MountPathExt, MountTrace, current_mount_path, freeze_stack, is_stack_frozen, normalize,
    normalized_path,
};
pub use terminal::wrap_send;

/// Marker carried by everything this module wraps.
pub const MARKER: WrapMarker = WrapMarker::new("express_mountpath");
